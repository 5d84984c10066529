//! Enum constant name correction
//!
//! An enum's static initializer constructs each constant with its own name
//! as a string literal, which `valueOf` later relies on. When a constant
//! field is renamed, that literal must follow. The initializer is scanned
//! as a sequence of per-constant blocks:
//!
//! ```text
//! new <type>          Unseen  -> Active
//! ldc "NAME"          Active  -> Matched   (literal replaced)
//! putstatic C.NAME    Matched -> Unseen    (next constant)
//! ```

use super::model::{ClassModel, Constant, Instruction};
use super::RemapView;
use crate::error::CodecError;
use crate::program::ACC_ENUM;
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Eq)]
enum SyncState {
    Unseen,
    Active,
    Matched { constant: String },
}

/// Rewrites the name literals of enum constants inside `<clinit>`
///
/// Instructions are observed with load-time names, before the general
/// rewrite pass.
#[derive(Debug, Clone)]
pub struct EnumNameSync {
    class: String,
    descriptor: String,
    constants: VecDeque<(String, String)>,
    state: SyncState,
}

impl EnumNameSync {
    /// Prepare correction for the constants of `model`, in declaration order
    #[must_use]
    pub fn new(model: &ClassModel, view: &RemapView<'_>) -> Self {
        let constants = model
            .fields
            .iter()
            .filter(|field| field.access & ACC_ENUM != 0)
            .map(|field| {
                let renamed = view.map_field_name(&model.name, &field.name, &field.descriptor);
                (field.name.clone(), renamed)
            })
            .collect();

        Self {
            class: model.name.clone(),
            descriptor: format!("L{};", model.name),
            constants,
            state: SyncState::Unseen,
        }
    }

    /// Constants not yet matched
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.constants.len()
    }

    /// Observe one instruction, replacing the constant name literal in place
    ///
    /// # Errors
    /// [`CodecError::EnumInitializer`] if a constant block does not start
    /// with `new`, or its first constant load is not a string.
    pub fn observe(&mut self, insn: &mut Instruction) -> Result<(), CodecError> {
        match insn {
            Instruction::Type { opcode, .. } => {
                if self.state == SyncState::Unseen && !self.constants.is_empty() {
                    if opcode.as_str() != "new" {
                        return Err(self.error(format!(
                            "expected `new' for the next constant, found `{opcode}'"
                        )));
                    }
                    self.state = SyncState::Active;
                }
            }
            Instruction::Ldc { constant } => {
                if self.state == SyncState::Active {
                    let value = match constant {
                        Constant::String(value) => value,
                        other => {
                            return Err(self.error(format!("expected a name literal, found {other:?}")))
                        }
                    };
                    if let Some((original, renamed)) = self.constants.pop_front() {
                        if *value != renamed {
                            tracing::trace!(class = %self.class, from = %value, to = %renamed, "enum name literal");
                        }
                        *value = renamed;
                        self.state = SyncState::Matched { constant: original };
                    }
                }
            }
            Instruction::Field {
                opcode,
                owner,
                name,
                descriptor,
            } => {
                if let SyncState::Matched { constant } = &self.state {
                    if opcode.as_str() == "putstatic"
                        && *owner == self.class
                        && *descriptor == self.descriptor
                        && *name == *constant
                    {
                        self.state = SyncState::Unseen;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Correct a whole initializer
    ///
    /// # Errors
    /// As [`EnumNameSync::observe`].
    pub fn correct(mut self, code: &[Instruction]) -> Result<Vec<Instruction>, CodecError> {
        let mut out = Vec::with_capacity(code.len());
        for insn in code {
            let mut insn = insn.clone();
            self.observe(&mut insn)?;
            out.push(insn);
        }
        if !self.constants.is_empty() {
            tracing::warn!(
                class = %self.class,
                remaining = self.constants.len(),
                "enum initializer ended before every constant was named"
            );
        }
        Ok(out)
    }

    fn error(&self, reason: String) -> CodecError {
        CodecError::EnumInitializer {
            class: self.class.clone(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ModelCodec;
    use crate::graph::InheritanceGraph;
    use crate::program::Program;
    use crate::rename::RenameState;
    use remap_symbol::{ClassToken, SymbolId};

    fn constant_block(name: &str) -> Vec<Instruction> {
        vec![
            Instruction::type_insn("new", "a/E"),
            Instruction::simple("dup"),
            Instruction::ldc_string(name),
            Instruction::simple("iconst_0"),
            Instruction::method("invokespecial", "a/E", "<init>", "(Ljava/lang/String;I)V"),
            Instruction::field("putstatic", "a/E", name, "La/E;"),
        ]
    }

    fn enum_model(code: Vec<Instruction>) -> ClassModel {
        ClassModel::new("a/E")
            .with_superclass("java/lang/Enum")
            .with_field("RED", "La/E;", ACC_ENUM | 0x19)
            .with_field("GREEN", "La/E;", ACC_ENUM | 0x19)
            .with_method("<clinit>", "()V", 0x8, code)
    }

    fn renamed_state(model: &ClassModel) -> (Program, RenameState) {
        let program: Program = [ModelCodec::summarize(model)].into_iter().collect();
        let graph = InheritanceGraph::build(&program);
        let mut state = RenameState::seed(&program, &graph).unwrap();
        let red = SymbolId::new(ClassToken::new("a/E"), "RED", "La/E;");
        state.rename_signature(red.clone(), red.with_name("CRIMSON")).unwrap();
        (program, state)
    }

    fn literals(code: &[Instruction]) -> Vec<&str> {
        code.iter()
            .filter_map(|insn| match insn {
                Instruction::Ldc {
                    constant: Constant::String(s),
                } => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn renamed_constant_literal_follows() {
        let mut code = constant_block("RED");
        code.extend(constant_block("GREEN"));
        code.push(Instruction::simple("iconst_2"));
        code.push(Instruction::type_insn("anewarray", "a/E"));
        let model = enum_model(code);
        let (program, state) = renamed_state(&model);
        let view = RemapView::new(&program, &state);

        let sync = EnumNameSync::new(&model, &view);
        assert_eq!(sync.remaining(), 2);
        let corrected = sync.correct(&model.methods[0].code).unwrap();
        assert_eq!(literals(&corrected), vec!["CRIMSON", "GREEN"]);
    }

    #[test]
    fn full_rewrite_corrects_only_when_enabled() {
        let mut code = constant_block("RED");
        code.extend(constant_block("GREEN"));
        let model = enum_model(code);
        let (program, state) = renamed_state(&model);
        let view = RemapView::new(&program, &state);

        let corrected = ModelCodec::remap(&model, &view, true).unwrap();
        assert_eq!(literals(&corrected.methods[0].code), vec!["CRIMSON", "GREEN"]);
        assert_eq!(corrected.fields[0].name, "CRIMSON");

        let untouched = ModelCodec::remap(&model, &view, false).unwrap();
        assert_eq!(literals(&untouched.methods[0].code), vec!["RED", "GREEN"]);
    }

    #[test]
    fn unexpected_type_instruction_is_rejected() {
        let mut code = vec![Instruction::type_insn("checkcast", "a/E")];
        code.extend(constant_block("RED"));
        let model = enum_model(code);
        let (program, state) = renamed_state(&model);
        let view = RemapView::new(&program, &state);

        let err = EnumNameSync::new(&model, &view)
            .correct(&model.methods[0].code)
            .unwrap_err();
        assert!(matches!(err, CodecError::EnumInitializer { .. }));
    }

    #[test]
    fn non_string_name_is_rejected() {
        let code = vec![
            Instruction::type_insn("new", "a/E"),
            Instruction::Ldc {
                constant: Constant::Int(7),
            },
        ];
        let model = enum_model(code);
        let (program, state) = renamed_state(&model);
        let view = RemapView::new(&program, &state);

        assert!(EnumNameSync::new(&model, &view)
            .correct(&model.methods[0].code)
            .is_err());
    }
}
