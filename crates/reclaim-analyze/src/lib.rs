//! Analysis algorithms for reclaim.
//!
//! Each analysis consumes the flat record list produced by traversal and
//! reports its own progress through a caller-supplied observer:
//!
//! - **Duplicate detection** - Find byte-identical files using BLAKE3 hashing
//! - **Junk classification** - Match paths against an ordered rule table
//! - **Large files** - Report files above a size threshold with age advice
//!
//! # Duplicate Detection
//!
//! Uses a three-phase algorithm for efficiency:
//!
//! 1. Group files by size (instant)
//! 2. Compute partial hash (first 4KB) for size-matched files
//! 3. Compute full BLAKE3 hash for partial-hash matches
//!
//! ```rust,no_run
//! use reclaim_analyze::{DuplicateFinder, total_wasted};
//! use reclaim_scan::{TraverseOptions, traverse};
//!
//! let files: Vec<_> = traverse("/path/to/scan", TraverseOptions::default()).collect();
//! let groups = DuplicateFinder::new().find_duplicates(&files, |p| println!("{}", p.message));
//!
//! println!("Found {} duplicate groups", groups.len());
//! println!("Wasted space: {} bytes", total_wasted(&groups));
//! ```
//!
//! # Junk and Large Files
//!
//! ```rust,no_run
//! use reclaim_analyze::{LargeFileAnalyzer, find_junk_files, group_by_category};
//! # let files: Vec<reclaim_analyze::FileRecord> = Vec::new();
//!
//! let junk = find_junk_files(&files, |_| {});
//! for (category, summary) in group_by_category(&junk) {
//!     println!("{category}: {} files, {} bytes", summary.files.len(), summary.total_size);
//! }
//!
//! for file in LargeFileAnalyzer::new().find_large_files(&files, |_| {}) {
//!     println!("{} ({} days)", file.file.path.display(), file.age_in_days);
//! }
//! ```

mod duplicates;
mod junk;
mod large;
mod progress;
pub mod rules;

pub use duplicates::{DuplicateConfig, DuplicateConfigBuilder, DuplicateFinder};
pub use junk::{CategorySummary, JunkClassifier, find_junk_files, group_by_category, match_junk_rule};
pub use large::{
    LargeFileAnalyzer, LargeFileConfig, LargeFileConfigBuilder, LargeFileStats, age_in_days,
    format_age,
};
pub use rules::{DEFAULT_RULES, categories, rules_by_category};

// Re-export core types
pub use reclaim_core::{
    ContentHash, DuplicateGroup, DuplicateMember, FileRecord, JunkCategory, JunkFileRecord,
    JunkRule, LargeFileRecord, ScanProgress, Suggestion, total_wasted,
};
