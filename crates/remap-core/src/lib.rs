//! Remap Core
//!
//! Declarative renaming of classes and class members across an archive.
//!
//! # Overview
//!
//! - **Program**: structural summaries of every loaded class
//! - **InheritanceGraph**: transitive in-program ancestors and descendants
//! - **RenameState**: injective class and member rename tables plus access
//!   flag overrides, always keyed by load-time identity
//! - **RuleInterpreter**: applies `classes`, `members`, `flags` and `regex`
//!   rule sections in document order
//! - **Codecs and archives**: pluggable entry formats and storage
//! - **Remapper**: the parallel end-to-end driver
//!
//! # Example
//!
//! ```rust
//! use remap_core::prelude::*;
//! use std::sync::Arc;
//!
//! let source = MemoryArchive::new().with_entry(
//!     "a/A.class.json",
//!     ModelCodec::encode(&ClassModel::new("a/A")).unwrap(),
//! );
//! let documents = load_documents("classes:\n  a/A: b/B\n").unwrap();
//!
//! let mut sink = MemoryArchive::new();
//! let report = Remapper::new(RemapConfig::new(), ModelCodec)
//!     .run_with(Arc::new(source), documents, &mut sink)
//!     .unwrap();
//!
//! assert_eq!(report.renamed_classes, 1);
//! assert!(sink.get("b/B.class.json").is_some());
//! ```

#![warn(missing_docs)]

pub mod archive;
pub mod codec;
pub mod config;
pub mod document;
pub mod driver;
pub mod error;
pub mod graph;
pub mod missing;
pub mod program;
pub mod rename;
pub mod rules;

// Re-exports
pub use archive::{copy_archive, ArchiveSink, ArchiveSource, DirectoryArchive, MemoryArchive};
pub use codec::{ClassCodec, ClassModel, EnumNameSync, ModelCodec, RemapView};
pub use config::RemapConfig;
pub use document::{load_documents, load_file};
pub use driver::{RemapReport, Remapper};
pub use error::{ArchiveError, CodecError, RemapError, Result, RuleError};
pub use graph::InheritanceGraph;
pub use missing::{MissingPolicy, MissingSymbol};
pub use program::{ClassInfo, MemberInfo, Program};
pub use rename::{FlagTable, RenameState};
pub use rules::{RuleInterpreter, Section};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for remapping
    pub use crate::archive::{ArchiveSink, ArchiveSource, MemoryArchive};
    pub use crate::codec::{ClassCodec, ClassModel, ModelCodec};
    pub use crate::config::RemapConfig;
    pub use crate::document::load_documents;
    pub use crate::driver::Remapper;
    pub use crate::graph::InheritanceGraph;
    pub use crate::missing::MissingPolicy;
    pub use crate::program::{ClassInfo, Program};
    pub use crate::rename::RenameState;
    pub use crate::rules::RuleInterpreter;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
