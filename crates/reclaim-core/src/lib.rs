//! Core types for reclaim.
//!
//! This crate provides the data structures shared by the scanning, analysis
//! and coordination crates: file records, analysis findings, progress
//! reports, scan configuration and errors.

mod config;
mod error;
mod findings;
mod progress;
mod record;
mod result;

pub use config::{
    DEFAULT_MAX_DEPTH, LARGE_FILE_THRESHOLD, MAX_QUICK_HASH_SIZE, MIN_DUPLICATE_SIZE,
    QUICK_HASH_SIZE, ScanOptions, ScanOptionsBuilder,
};
pub use error::{HashError, ScanError, TraversalError, TraversalErrorKind};
pub use findings::{
    DuplicateGroup, DuplicateMember, JunkCategory, JunkFileRecord, JunkRule, LargeFileRecord,
    Suggestion, total_wasted,
};
pub use progress::{ScanProgress, ScanStage, ScanUpdate};
pub use record::{ContentHash, FileRecord, Timestamps};
pub use result::{ScanResult, ScanState, ScanSummary};
