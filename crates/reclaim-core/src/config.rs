//! Scan configuration types.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// Default maximum traversal depth below the root.
pub const DEFAULT_MAX_DEPTH: u32 = 20;

/// Files smaller than this are never considered duplicates (1 KiB).
pub const MIN_DUPLICATE_SIZE: u64 = 1024;

/// Bytes read from the start of a file for the partial hash (4 KiB).
pub const QUICK_HASH_SIZE: usize = 4096;

/// Upper bound for the partial hash read (64 KiB).
pub const MAX_QUICK_HASH_SIZE: usize = 64 * 1024;

/// Minimum size for a file to count as large (100 MiB).
pub const LARGE_FILE_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Configuration for a full scan.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanOptions {
    /// Root path to scan.
    #[serde(default)]
    pub root: PathBuf,

    /// Maximum depth to traverse below the root.
    #[builder(default = "DEFAULT_MAX_DEPTH")]
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Follow symbolic links.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Skip duplicate detection.
    #[builder(default = "false")]
    #[serde(default)]
    pub skip_duplicates: bool,

    /// Skip junk classification.
    #[builder(default = "false")]
    #[serde(default)]
    pub skip_junk: bool,

    /// Skip large file detection.
    #[builder(default = "false")]
    #[serde(default)]
    pub skip_large: bool,

    /// Minimum file size to consider for duplicates.
    #[builder(default = "MIN_DUPLICATE_SIZE")]
    #[serde(default = "default_min_duplicate_size")]
    pub min_duplicate_size: u64,

    /// Number of leading bytes used for the partial hash.
    #[builder(default = "QUICK_HASH_SIZE")]
    #[serde(default = "default_quick_hash_size")]
    pub quick_hash_size: usize,

    /// Minimum size for the large file report.
    #[builder(default = "LARGE_FILE_THRESHOLD")]
    #[serde(default = "default_large_file_min_size")]
    pub large_file_min_size: u64,

    /// Number of hashing threads (0 = auto-detect).
    #[builder(default = "0")]
    #[serde(default)]
    pub hash_threads: usize,

    /// Sample the tree before scanning to calibrate traversal progress.
    #[builder(default = "false")]
    #[serde(default)]
    pub calibrate_progress: bool,
}

fn default_max_depth() -> u32 {
    DEFAULT_MAX_DEPTH
}

fn default_min_duplicate_size() -> u64 {
    MIN_DUPLICATE_SIZE
}

fn default_quick_hash_size() -> usize {
    QUICK_HASH_SIZE
}

fn default_large_file_min_size() -> u64 {
    LARGE_FILE_THRESHOLD
}

impl ScanOptionsBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref root) = self.root {
            if root.as_os_str().is_empty() {
                return Err("Root path cannot be empty".to_string());
            }
        } else {
            return Err("Root path is required".to_string());
        }
        if self.quick_hash_size == Some(0) {
            return Err("Quick hash size must be greater than zero".to_string());
        }
        Ok(())
    }
}

impl ScanOptions {
    /// Create a new scan options builder.
    pub fn builder() -> ScanOptionsBuilder {
        ScanOptionsBuilder::default()
    }

    /// Create default options for scanning a path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_depth: DEFAULT_MAX_DEPTH,
            follow_symlinks: false,
            skip_duplicates: false,
            skip_junk: false,
            skip_large: false,
            min_duplicate_size: MIN_DUPLICATE_SIZE,
            quick_hash_size: QUICK_HASH_SIZE,
            large_file_min_size: LARGE_FILE_THRESHOLD,
            hash_threads: 0,
            calibrate_progress: false,
        }
    }

    /// Same options with a different root.
    pub fn with_root(&self, root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..self.clone()
        }
    }

    /// Reject options a scan cannot run with.
    ///
    /// Mirrors the builder's checks for options built by hand or
    /// deserialized from a config file.
    pub fn validate(&self) -> Result<(), ScanError> {
        let message = if self.root.as_os_str().is_empty() {
            "Root path cannot be empty"
        } else if self.quick_hash_size == 0 {
            "Quick hash size must be greater than zero"
        } else {
            return Ok(());
        };
        Err(ScanError::InvalidConfig {
            message: message.to_string(),
        })
    }

    /// Partial hash length after applying the 64 KiB cap.
    pub fn effective_quick_hash_size(&self) -> usize {
        self.quick_hash_size.clamp(1, MAX_QUICK_HASH_SIZE)
    }
}

impl From<ScanOptionsBuilderError> for ScanError {
    fn from(err: ScanOptionsBuilderError) -> Self {
        Self::InvalidConfig {
            message: err.to_string(),
        }
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self::new(".")
    }
}
