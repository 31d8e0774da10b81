//! Scan pipeline for reclaim.
//!
//! [`ScanCoordinator`] runs traversal to completion, then duplicate
//! detection, junk classification and large file detection over the same
//! record list, publishing overall progress on a broadcast channel.
//!
//! # Example
//!
//! ```rust,no_run
//! use reclaim_core::ScanOptions;
//! use reclaim_engine::ScanCoordinator;
//!
//! let coordinator = ScanCoordinator::new();
//! let mut progress = coordinator.subscribe();
//! std::thread::spawn(move || {
//!     while let Ok(update) = progress.blocking_recv() {
//!         println!("{:>5.1}% {}", update.percent, update.message);
//!     }
//! });
//!
//! let result = coordinator.scan(&ScanOptions::new("/path/to/scan")).unwrap();
//! println!("{} reclaimable paths", result.reclaimable_paths().len());
//! ```

mod coordinator;
mod quick;

pub use coordinator::ScanCoordinator;
pub use quick::{QUICK_SCAN_DIRS, quick_scan_roots};

// Re-export core types
pub use reclaim_core::{ScanError, ScanOptions, ScanResult, ScanStage, ScanState, ScanUpdate};
