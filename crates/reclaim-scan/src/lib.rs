//! File system traversal for reclaim.
//!
//! # Overview
//!
//! `reclaim-scan` walks a directory tree breadth-first and yields one
//! [`FileRecord`] per regular file. Key features:
//!
//! - **Lazy** pull-based iteration; nothing is listed until records are pulled
//! - **Skip policy** for system, version-control and package-manager folders
//! - **Failure isolation**: unreadable paths go to an error observer
//! - **Cancellation** through a [`CancellationToken`](tokio_util::sync::CancellationToken)
//!
//! # Example
//!
//! ```rust,no_run
//! use reclaim_scan::{TraverseOptions, Traverser};
//!
//! let files: Vec<_> = Traverser::new("/path/to/scan", TraverseOptions::default())
//!     .on_error(|err| eprintln!("{err}"))
//!     .collect();
//!
//! println!("Found {} files", files.len());
//! ```

mod estimate;
mod skip;
mod traverser;

pub use estimate::{
    DEFAULT_SAMPLE_SIZE, DEFAULT_SAMPLE_TIMEOUT, ESTIMATE_MULTIPLIER, estimate_file_count,
    estimate_file_count_with,
};
pub use skip::{PROTECTED_SUBTREES, SKIP_NAMES, should_skip};
pub use traverser::{TraverseOptions, TraverseOptionsBuilder, Traverser, traverse};

// Re-export core types for convenience
pub use reclaim_core::{FileRecord, Timestamps, TraversalError, TraversalErrorKind};
