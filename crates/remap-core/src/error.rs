//! Error types for the remapping pipeline
//!
//! Provides error handling for:
//! - Rule application (document → rename state)
//! - Class codecs (bytes ↔ class model)
//! - Archive I/O
//! - The driver, which wraps all of the above

use crate::missing::MissingSymbol;
use crate::rules::Section;
use remap_kernel::{SchedulerError, SequenceError, WorkerFailure};
use remap_symbol::{ClassToken, DuplicateTarget, SymbolError, SymbolId};
use std::path::PathBuf;

/// Errors while applying rule documents
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// Rule value has the wrong shape
    #[error("malformed rule: {0}")]
    MalformedRule(String),

    /// Symbol lookup failed under the `fail` policy
    #[error("unresolved symbol: {0}")]
    Unresolved(MissingSymbol),

    /// Two classes would share a name
    #[error("duplicate class target: {0}")]
    DuplicateClass(#[from] DuplicateTarget<ClassToken, ClassToken>),

    /// Two members would share an identity
    #[error("duplicate member target: {0}")]
    DuplicateSignature(#[from] DuplicateTarget<SymbolId, SymbolId>),

    /// Member rename collides with a member that already has the name
    #[error("cannot map {original} (currently {current}) to pre-existing member {existing}")]
    MemberConflict {
        /// Load-time identity being renamed
        original: SymbolId,
        /// Its identity before this rule
        current: SymbolId,
        /// Load-time identity already owning the target
        existing: SymbolId,
    },

    /// Regex section pattern does not compile
    #[error("invalid pattern `{pattern}': {source}")]
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Rule file is not valid YAML
    #[error("rule file syntax error: {0}")]
    Syntax(#[from] serde_yaml::Error),

    /// Failure inside one section of one document
    #[error("failed to apply {section} of rule document {index}: {source}")]
    Document {
        /// Position of the document in the rule file
        index: usize,
        /// Section being applied
        section: Section,
        /// The document, re-serialized
        document: String,
        #[source]
        source: Box<RuleError>,
    },
}

impl From<SymbolError> for RuleError {
    fn from(err: SymbolError) -> Self {
        Self::MalformedRule(err.to_string())
    }
}

impl RuleError {
    /// Create malformed rule error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRule(message.into())
    }

    /// Innermost error, unwrapping document context
    #[must_use]
    pub fn root_cause(&self) -> &RuleError {
        match self {
            Self::Document { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Errors from a class codec
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Entry bytes are not a valid class module
    #[error("malformed class module: {0}")]
    Malformed(#[source] serde_json::Error),

    /// Rewritten class could not be encoded
    #[error("failed to encode class module: {0}")]
    Encode(#[source] serde_json::Error),

    /// Enum constant initialization does not follow the expected shape
    #[error("unexpected enum initializer in {class}: {reason}")]
    EnumInitializer {
        /// Class whose static initializer was being corrected
        class: String,
        /// What was found
        reason: String,
    },
}

/// Errors reading or writing archives
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// IO error with the offending path
    #[error("io error at {path}: {source}")]
    Io {
        /// Path being accessed
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Entry not present in the archive
    #[error("no such entry: {0}")]
    MissingEntry(String),

    /// Entry name escapes the archive root or is otherwise unusable
    #[error("invalid entry name: {0}")]
    InvalidEntry(String),
}

impl ArchiveError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Top-level remapping errors
#[derive(Debug, thiserror::Error)]
pub enum RemapError {
    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// IO error with the offending path
    #[error("io error at {path}: {source}")]
    Io {
        /// Path being accessed
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Archive failure
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// Codec failure for one entry
    #[error("failed to process {entry}: {source}")]
    Codec {
        /// Archive entry name
        entry: String,
        #[source]
        source: CodecError,
    },

    /// Rule failure
    #[error(transparent)]
    Rules(#[from] RuleError),

    /// Two entries declare the same class
    #[error("duplicate class {0}")]
    DuplicateClass(ClassToken),

    /// Class hierarchy contains a cycle
    #[error("circular class hierarchy: {0}")]
    CircularHierarchy(#[source] SequenceError),

    /// Scheduler failure
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    /// A pipeline task panicked
    #[error("task panicked: {0}")]
    TaskPanicked(String),

    /// A pipeline task was cancelled
    #[error("task cancelled before it ran")]
    TaskCancelled,

    /// Failure that escaped a worker thread
    #[error(transparent)]
    WorkerFailure(#[from] WorkerFailure),
}

impl RemapError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create codec error for an entry
    pub fn codec(entry: impl Into<String>, source: CodecError) -> Self {
        Self::Codec {
            entry: entry.into(),
            source,
        }
    }
}

impl From<remap_kernel::TaskError<RemapError>> for RemapError {
    fn from(err: remap_kernel::TaskError<RemapError>) -> Self {
        match err {
            remap_kernel::TaskError::Failed(inner) => inner,
            remap_kernel::TaskError::Panicked(message) => Self::TaskPanicked(message),
            remap_kernel::TaskError::Cancelled => Self::TaskCancelled,
        }
    }
}

/// Result type for the remapping pipeline
pub type Result<T> = std::result::Result<T, RemapError>;
