//! Class codecs
//!
//! A [`ClassCodec`] turns archive entries into [`ClassInfo`] summaries and
//! re-emits them under the final rename state. Codecs see the rename state
//! only through a [`RemapView`], which answers lookups by load-time names.
//!
//! [`ModelCodec`] is the bundled codec: class modules as JSON documents.

mod enums;
mod model;

pub use enums::EnumNameSync;
pub use model::{
    ClassModel, Constant, FieldModel, Instruction, MethodModel, ModelCodec, MODEL_SUFFIX,
};

use crate::error::CodecError;
use crate::program::{ClassInfo, Program};
use crate::rename::RenameState;
use remap_symbol::descriptor::map_type_operand;
use remap_symbol::{ClassToken, SymbolId};

/// Parses and rewrites class modules
pub trait ClassCodec: Send + Sync {
    /// Whether an archive entry holds a class module
    fn is_class_entry(&self, name: &str) -> bool;

    /// Archive entry name for a class
    fn entry_name(&self, token: &ClassToken) -> String;

    /// Summarize a class module
    ///
    /// # Errors
    /// [`CodecError::Malformed`] if the bytes are not a class module.
    fn parse(&self, name: &str, bytes: &[u8]) -> Result<ClassInfo, CodecError>;

    /// Re-emit a class module with every rename applied
    ///
    /// # Errors
    /// Codec specific; see [`CodecError`].
    fn rewrite(&self, bytes: &[u8], view: &RemapView<'_>, correct_enums: bool) -> Result<Vec<u8>, CodecError>;
}

/// Read-only view of the final rename state
#[derive(Debug, Clone, Copy)]
pub struct RemapView<'a> {
    program: &'a Program,
    state: &'a RenameState,
}

impl<'a> RemapView<'a> {
    /// Create a view
    #[inline]
    #[must_use]
    pub fn new(program: &'a Program, state: &'a RenameState) -> Self {
        Self { program, state }
    }

    /// Loaded program
    #[inline]
    #[must_use]
    pub fn program(&self) -> &'a Program {
        self.program
    }

    /// Current name of a class; unknown classes keep their name
    #[must_use]
    pub fn map_type(&self, name: &str) -> String {
        map_type_operand(name, |n| self.state.current_class(n).map(ClassToken::as_str))
    }

    /// Rewrite the class names inside a descriptor
    #[must_use]
    pub fn map_descriptor(&self, descriptor: &str) -> String {
        self.state.map_descriptor(descriptor)
    }

    /// Current name of a method referenced as `owner.name descriptor`
    #[must_use]
    pub fn map_method_name(&self, owner: &str, name: &str, descriptor: &str) -> String {
        let id = SymbolId::new(ClassToken::new(owner), name, descriptor);
        self.state
            .current_signature(&id)
            .map_or_else(|| name.to_string(), |current| current.name().to_string())
    }

    /// Current name of a field referenced as `owner.name descriptor`
    ///
    /// Fields are not seeded on subclasses, so the superclass chain is walked
    /// until a declaring class is found.
    #[must_use]
    pub fn map_field_name(&self, owner: &str, name: &str, descriptor: &str) -> String {
        let mut class = Some(ClassToken::new(owner));
        let mut hops = 0;
        while let Some(token) = class {
            let id = SymbolId::new(token.clone(), name, descriptor);
            if let Some(current) = self.state.current_signature(&id) {
                return current.name().to_string();
            }
            hops += 1;
            if hops > self.program.len() {
                break;
            }
            class = self
                .program
                .get(&token)
                .and_then(|info| info.superclass.clone());
        }
        name.to_string()
    }

    /// Access flags for a declared member, honoring overrides
    #[must_use]
    pub fn access_for(&self, owner: &str, name: &str, descriptor: &str, declared: u32) -> u32 {
        let id = SymbolId::new(ClassToken::new(owner), name, descriptor);
        self.state.flags().access_for(&id, declared)
    }
}
