//! JSON class modules
//!
//! A class module is a JSON document (`*.class.json`) describing one class
//! structurally: its name, parents, access flags, fields and methods, with
//! each method carrying a flat instruction list. Only instructions that
//! reference classes or members carry operands.

use super::enums::EnumNameSync;
use super::{ClassCodec, RemapView};
use crate::error::CodecError;
use crate::program::ClassInfo;
use remap_symbol::ClassToken;
use serde::{Deserialize, Serialize};

/// Archive entry suffix of class modules
pub const MODEL_SUFFIX: &str = ".class.json";

/// Superclass of every enum
pub(crate) const ENUM_SUPERCLASS: &str = "java/lang/Enum";

/// One class module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassModel {
    /// Internal class name
    pub name: String,
    /// Direct superclass
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass: Option<String>,
    /// Directly implemented interfaces
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<String>,
    /// Class access flags
    #[serde(default)]
    pub access: u32,
    /// Declared fields
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldModel>,
    /// Declared methods
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MethodModel>,
}

/// Declared field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldModel {
    /// Field name
    pub name: String,
    /// Field descriptor
    pub descriptor: String,
    /// Access flags
    #[serde(default)]
    pub access: u32,
}

/// Declared method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodModel {
    /// Method name
    pub name: String,
    /// Method descriptor
    pub descriptor: String,
    /// Access flags
    #[serde(default)]
    pub access: u32,
    /// Instructions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub code: Vec<Instruction>,
}

/// Instruction, reduced to the operands that name classes or members
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Instruction {
    /// `new`, `checkcast`, `instanceof`, `anewarray`
    Type {
        /// Opcode mnemonic
        opcode: String,
        /// Internal name or array descriptor
        operand: String,
    },
    /// Constant load
    Ldc {
        /// The constant
        constant: Constant,
    },
    /// `getfield`, `putfield`, `getstatic`, `putstatic`
    Field {
        /// Opcode mnemonic
        opcode: String,
        /// Referenced owner
        owner: String,
        /// Referenced name
        name: String,
        /// Referenced descriptor
        descriptor: String,
    },
    /// `invokevirtual`, `invokestatic`, `invokespecial`, `invokeinterface`
    Method {
        /// Opcode mnemonic
        opcode: String,
        /// Referenced owner
        owner: String,
        /// Referenced name
        name: String,
        /// Referenced descriptor
        descriptor: String,
    },
    /// Any instruction without symbolic operands
    Simple {
        /// Opcode mnemonic
        opcode: String,
    },
}

/// Loadable constant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Constant {
    /// String literal
    String(String),
    /// Integer literal
    Int(i64),
    /// Floating point literal
    Float(f64),
    /// Class literal
    Class(String),
}

impl ClassModel {
    /// Create an empty public class
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            superclass: None,
            interfaces: Vec::new(),
            access: 0x0001,
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// With superclass
    #[must_use]
    pub fn with_superclass(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    /// With an implemented interface
    #[must_use]
    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    /// With a declared field
    #[must_use]
    pub fn with_field(mut self, name: &str, descriptor: &str, access: u32) -> Self {
        self.fields.push(FieldModel {
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            access,
        });
        self
    }

    /// With a declared method
    #[must_use]
    pub fn with_method(mut self, name: &str, descriptor: &str, access: u32, code: Vec<Instruction>) -> Self {
        self.methods.push(MethodModel {
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            access,
            code,
        });
        self
    }

    /// Field by name
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldModel> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Method by name and descriptor
    #[must_use]
    pub fn method(&self, name: &str, descriptor: &str) -> Option<&MethodModel> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.descriptor == descriptor)
    }
}

impl Instruction {
    /// Type instruction
    #[must_use]
    pub fn type_insn(opcode: &str, operand: &str) -> Self {
        Self::Type {
            opcode: opcode.to_string(),
            operand: operand.to_string(),
        }
    }

    /// String constant load
    #[must_use]
    pub fn ldc_string(value: &str) -> Self {
        Self::Ldc {
            constant: Constant::String(value.to_string()),
        }
    }

    /// Field access
    #[must_use]
    pub fn field(opcode: &str, owner: &str, name: &str, descriptor: &str) -> Self {
        Self::Field {
            opcode: opcode.to_string(),
            owner: owner.to_string(),
            name: name.to_string(),
            descriptor: descriptor.to_string(),
        }
    }

    /// Method invocation
    #[must_use]
    pub fn method(opcode: &str, owner: &str, name: &str, descriptor: &str) -> Self {
        Self::Method {
            opcode: opcode.to_string(),
            owner: owner.to_string(),
            name: name.to_string(),
            descriptor: descriptor.to_string(),
        }
    }

    /// Operand-free instruction
    #[must_use]
    pub fn simple(opcode: &str) -> Self {
        Self::Simple {
            opcode: opcode.to_string(),
        }
    }

    fn remapped(&self, view: &RemapView<'_>) -> Self {
        match self {
            Self::Type { opcode, operand } => Self::Type {
                opcode: opcode.clone(),
                operand: view.map_type(operand),
            },
            Self::Ldc {
                constant: Constant::Class(class),
            } => Self::Ldc {
                constant: Constant::Class(view.map_type(class)),
            },
            Self::Field {
                opcode,
                owner,
                name,
                descriptor,
            } => Self::Field {
                opcode: opcode.clone(),
                owner: view.map_type(owner),
                name: view.map_field_name(owner, name, descriptor),
                descriptor: view.map_descriptor(descriptor),
            },
            Self::Method {
                opcode,
                owner,
                name,
                descriptor,
            } => Self::Method {
                opcode: opcode.clone(),
                owner: view.map_type(owner),
                name: view.map_method_name(owner, name, descriptor),
                descriptor: view.map_descriptor(descriptor),
            },
            other => other.clone(),
        }
    }
}

/// Codec for JSON class modules
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelCodec;

impl ModelCodec {
    /// Decode a class module
    ///
    /// # Errors
    /// [`CodecError::Malformed`] for invalid JSON or a wrong shape.
    pub fn decode(bytes: &[u8]) -> Result<ClassModel, CodecError> {
        serde_json::from_slice(bytes).map_err(CodecError::Malformed)
    }

    /// Encode a class module
    ///
    /// # Errors
    /// [`CodecError::Encode`] if serialization fails.
    pub fn encode(model: &ClassModel) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec_pretty(model).map_err(CodecError::Encode)
    }

    /// Structural summary of a module
    #[must_use]
    pub fn summarize(model: &ClassModel) -> ClassInfo {
        let mut info = ClassInfo::new(model.name.as_str());
        if let Some(superclass) = &model.superclass {
            info = info.with_superclass(superclass.as_str());
        }
        for interface in &model.interfaces {
            info = info.with_interface(interface.as_str());
        }
        for field in &model.fields {
            info = info.with_member(&field.name, &field.descriptor, field.access);
        }
        for method in &model.methods {
            info = info.with_member(&method.name, &method.descriptor, method.access);
        }
        info
    }

    /// Apply the rename state to a module
    ///
    /// # Errors
    /// [`CodecError::EnumInitializer`] if enum correction is on and the
    /// static initializer does not have the expected shape.
    pub fn remap(model: &ClassModel, view: &RemapView<'_>, correct_enums: bool) -> Result<ClassModel, CodecError> {
        let owner = model.name.as_str();
        let is_enum = model.superclass.as_deref() == Some(ENUM_SUPERCLASS);

        let fields = model
            .fields
            .iter()
            .map(|field| FieldModel {
                name: view.map_field_name(owner, &field.name, &field.descriptor),
                descriptor: view.map_descriptor(&field.descriptor),
                access: view.access_for(owner, &field.name, &field.descriptor, field.access),
            })
            .collect();

        let mut methods = Vec::with_capacity(model.methods.len());
        for method in &model.methods {
            let code = if correct_enums && is_enum && method.name == "<clinit>" {
                EnumNameSync::new(model, view).correct(&method.code)?
            } else {
                method.code.clone()
            };
            methods.push(MethodModel {
                name: view.map_method_name(owner, &method.name, &method.descriptor),
                descriptor: view.map_descriptor(&method.descriptor),
                access: view.access_for(owner, &method.name, &method.descriptor, method.access),
                code: code.iter().map(|insn| insn.remapped(view)).collect(),
            });
        }

        Ok(ClassModel {
            name: view.map_type(owner),
            superclass: model.superclass.as_deref().map(|s| view.map_type(s)),
            interfaces: model.interfaces.iter().map(|i| view.map_type(i)).collect(),
            access: model.access,
            fields,
            methods,
        })
    }
}

impl ClassCodec for ModelCodec {
    fn is_class_entry(&self, name: &str) -> bool {
        name.ends_with(MODEL_SUFFIX)
    }

    fn entry_name(&self, token: &ClassToken) -> String {
        format!("{token}{MODEL_SUFFIX}")
    }

    fn parse(&self, _name: &str, bytes: &[u8]) -> Result<ClassInfo, CodecError> {
        Self::decode(bytes).map(|model| Self::summarize(&model))
    }

    fn rewrite(&self, bytes: &[u8], view: &RemapView<'_>, correct_enums: bool) -> Result<Vec<u8>, CodecError> {
        let model = Self::decode(bytes)?;
        Self::encode(&Self::remap(&model, view, correct_enums)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::InheritanceGraph;
    use crate::program::Program;
    use crate::rename::RenameState;
    use pretty_assertions::assert_eq;
    use remap_symbol::SymbolId;

    fn sample() -> ClassModel {
        ClassModel::new("a/A")
            .with_superclass("java/lang/Object")
            .with_interface("java/lang/Runnable")
            .with_field("count", "I", 2)
            .with_method(
                "run",
                "()V",
                1,
                vec![
                    Instruction::type_insn("new", "a/A"),
                    Instruction::field("getfield", "a/A", "count", "I"),
                    Instruction::method("invokevirtual", "a/A", "run", "()V"),
                    Instruction::Ldc {
                        constant: Constant::Class("[La/A;".to_string()),
                    },
                    Instruction::simple("return"),
                ],
            )
    }

    #[test]
    fn json_shape_is_stable() {
        let json = serde_json::to_value(Instruction::field("getstatic", "a/A", "X", "I")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"op": "field", "opcode": "getstatic", "owner": "a/A", "name": "X", "descriptor": "I"})
        );
        let constant = serde_json::to_value(Constant::String("s".into())).unwrap();
        assert_eq!(constant, serde_json::json!({"kind": "string", "value": "s"}));
    }

    #[test]
    fn summary_drops_platform_interfaces() {
        let info = ModelCodec::summarize(&sample());
        assert_eq!(info.token.as_str(), "a/A");
        assert!(info.interfaces.is_empty());
        assert_eq!(info.members.len(), 2);
    }

    #[test]
    fn identity_state_reemits_same_model() {
        let model = sample();
        let program: Program = [ModelCodec::summarize(&model)].into_iter().collect();
        let graph = InheritanceGraph::build(&program);
        let state = RenameState::seed(&program, &graph).unwrap();
        let view = RemapView::new(&program, &state);

        assert_eq!(ModelCodec::remap(&model, &view, true).unwrap(), model);
    }

    #[test]
    fn renames_reach_every_reference() {
        let model = sample();
        let program: Program = [ModelCodec::summarize(&model)].into_iter().collect();
        let graph = InheritanceGraph::build(&program);
        let mut state = RenameState::seed(&program, &graph).unwrap();
        state.rename_class(ClassToken::new("a/A"), ClassToken::new("b/B")).unwrap();
        let count = SymbolId::new(ClassToken::new("a/A"), "count", "I");
        state.rename_signature(count.clone(), count.with_name("size")).unwrap();
        let run = SymbolId::new(ClassToken::new("a/A"), "run", "()V");
        state.rename_signature(run.clone(), run.with_name("exec")).unwrap();
        state.flags_mut().insert(count, 1);

        let view = RemapView::new(&program, &state);
        let out = ModelCodec::remap(&model, &view, true).unwrap();

        assert_eq!(out.name, "b/B");
        assert_eq!(out.fields[0].name, "size");
        assert_eq!(out.fields[0].access, 1);
        assert_eq!(out.methods[0].name, "exec");
        assert_eq!(
            out.methods[0].code,
            vec![
                Instruction::type_insn("new", "b/B"),
                Instruction::field("getfield", "b/B", "size", "I"),
                Instruction::method("invokevirtual", "b/B", "exec", "()V"),
                Instruction::Ldc {
                    constant: Constant::Class("[Lb/B;".to_string()),
                },
                Instruction::simple("return"),
            ]
        );
    }

    #[test]
    fn codec_entry_names() {
        let codec = ModelCodec;
        assert!(codec.is_class_entry("a/A.class.json"));
        assert!(!codec.is_class_entry("META-INF/MANIFEST.MF"));
        assert_eq!(codec.entry_name(&ClassToken::new("b/B")), "b/B.class.json");
    }

    #[test]
    fn malformed_bytes() {
        assert!(matches!(
            ModelCodec.parse("x.class.json", b"{not json"),
            Err(CodecError::Malformed(_))
        ));
    }
}
