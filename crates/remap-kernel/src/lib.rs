//! Remap Kernel
//!
//! Execution primitives shared by the remapping pipeline.
//!
//! # Overview
//!
//! - **Scheduler**: fixed worker pool whose blocked callers help drain the
//!   queue, so nested waits cannot deadlock
//! - **Sequencer**: stable dependency ordering with soft preferences and
//!   cycle detection

#![warn(missing_docs)]

pub mod scheduler;
pub mod sequencer;

// Re-exports
pub use scheduler::{Scheduler, SchedulerError, TaskError, TaskHandle, TaskState, WorkerFailure};
pub use sequencer::{Informer, Requires, SequenceError};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for pipeline execution
    pub use crate::scheduler::{Scheduler, TaskError, TaskHandle};
    pub use crate::sequencer::{self, Informer, SequenceError};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
