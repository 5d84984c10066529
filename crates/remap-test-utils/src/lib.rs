//! Testing utilities for the remap workspace
//!
//! Fixture class modules, archives and one-call pipeline runs.

#![allow(missing_docs)]

use remap_core::codec::{ClassModel, Instruction, ModelCodec, MODEL_SUFFIX};
use remap_core::program::ACC_ENUM;
use remap_core::{load_documents, MemoryArchive, RemapConfig, RemapReport, Remapper, Result};
use serde_yaml::Value;
use std::sync::Arc;

pub const ACC_PUBLIC: u32 = 0x0001;
pub const ACC_STATIC_FINAL: u32 = 0x0018;

pub fn module(model: &ClassModel) -> Vec<u8> {
    ModelCodec::encode(model).unwrap()
}

pub fn entry_name(class: &str) -> String {
    format!("{class}{MODEL_SUFFIX}")
}

pub fn archive(models: &[ClassModel]) -> MemoryArchive {
    models.iter().fold(MemoryArchive::new(), |archive, model| {
        archive.with_entry(entry_name(&model.name), module(model))
    })
}

pub fn rules(yaml: &str) -> Vec<Value> {
    load_documents(yaml).unwrap()
}

pub fn decode(archive: &MemoryArchive, class: &str) -> ClassModel {
    let bytes = archive
        .get(&entry_name(class))
        .unwrap_or_else(|| panic!("no module for {class}"));
    ModelCodec::decode(bytes).unwrap()
}

/// Run the whole pipeline over in-memory modules
pub fn remap_with(config: RemapConfig, source: MemoryArchive, yaml: &str) -> Result<(RemapReport, MemoryArchive)> {
    let mut sink = MemoryArchive::new();
    let report = Remapper::new(config, ModelCodec).run_with(Arc::new(source), rules(yaml), &mut sink)?;
    Ok((report, sink))
}

pub fn remap(models: &[ClassModel], yaml: &str) -> Result<(RemapReport, MemoryArchive)> {
    remap_with(RemapConfig::new().with_cores(3), archive(models), yaml)
}

/// `a/A` with a field and a self-calling method, `a/B extends a/A` calling it
pub fn base_and_child() -> Vec<ClassModel> {
    vec![
        ClassModel::new("a/A")
            .with_superclass("java/lang/Object")
            .with_field("f", "La/A;", ACC_PUBLIC)
            .with_method(
                "m",
                "()V",
                ACC_PUBLIC,
                vec![
                    Instruction::simple("aload_0"),
                    Instruction::method("invokevirtual", "a/A", "m", "()V"),
                    Instruction::simple("return"),
                ],
            ),
        ClassModel::new("a/B").with_superclass("a/A").with_method(
            "call",
            "(La/B;)V",
            ACC_PUBLIC,
            vec![
                Instruction::simple("aload_1"),
                Instruction::method("invokevirtual", "a/B", "m", "()V"),
                Instruction::field("getfield", "a/B", "f", "La/A;"),
                Instruction::type_insn("checkcast", "a/A"),
                Instruction::simple("return"),
            ],
        ),
    ]
}

/// Enum `class` with the given constants, initialized in declaration order
pub fn enum_class(class: &str, constants: &[&str]) -> ClassModel {
    let descriptor = format!("L{class};");
    let mut code = Vec::new();
    for (ordinal, name) in constants.iter().enumerate() {
        code.push(Instruction::type_insn("new", class));
        code.push(Instruction::simple("dup"));
        code.push(Instruction::ldc_string(name));
        code.push(Instruction::simple(&format!("iconst_{ordinal}")));
        code.push(Instruction::method("invokespecial", class, "<init>", "(Ljava/lang/String;I)V"));
        code.push(Instruction::field("putstatic", class, name, &descriptor));
    }
    code.push(Instruction::simple("return"));

    let model = constants.iter().fold(
        ClassModel::new(class).with_superclass("java/lang/Enum"),
        |model, name| model.with_field(name, &descriptor, ACC_PUBLIC | ACC_STATIC_FINAL | ACC_ENUM),
    );
    model.with_method("<clinit>", "()V", 0x0008, code)
}

/// String literals loaded by a method, in order
pub fn string_literals(model: &ClassModel, method: &str) -> Vec<String> {
    model
        .methods
        .iter()
        .filter(|m| m.name == method)
        .flat_map(|m| &m.code)
        .filter_map(|insn| match insn {
            Instruction::Ldc {
                constant: remap_core::codec::Constant::String(s),
            } => Some(s.clone()),
            _ => None,
        })
        .collect()
}
