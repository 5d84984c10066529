//! Remap Symbol System
//!
//! Identity model for classes and class members.
//!
//! # Overview
//!
//! The symbol system provides:
//! - **ClassToken**: internal class names, unique within a loaded program
//! - **SymbolId**: `(owner, name, descriptor)` member identities
//! - **BiMap**: injective rename tables with atomic duplicate-target checks
//! - **descriptor**: rewriting of class names embedded in descriptors
//!
//! # Example
//!
//! ```rust
//! use remap_symbol::{BiMap, ClassToken, SymbolId};
//!
//! let original = SymbolId::new(ClassToken::new("a/A"), "m", "()V");
//!
//! let mut signatures = BiMap::new();
//! signatures.insert(original.clone(), original.with_name("run")).unwrap();
//!
//! let current = original.with_name("run");
//! assert_eq!(signatures.get_by_value(&current), Some(&original));
//! ```

#![warn(missing_docs)]

pub mod bimap;
pub mod descriptor;
pub mod symbol;

// Re-exports
pub use bimap::{BiMap, DuplicateTarget};
pub use symbol::{ClassToken, QualifiedMember, SymbolError, SymbolId};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for symbol operations
    pub use crate::descriptor::{map_descriptor, map_type_operand};
    pub use crate::{BiMap, ClassToken, DuplicateTarget, QualifiedMember, SymbolId};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
