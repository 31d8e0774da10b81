//! File records produced by traversal.

use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// BLAKE3 content hash for duplicate detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// Create a new ContentHash from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the hash as a hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// File metadata timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamps {
    /// Last modification time.
    pub modified: SystemTime,
    /// Last access time (if available).
    pub accessed: Option<SystemTime>,
    /// Creation time (if available, platform-dependent).
    pub created: Option<SystemTime>,
}

impl Timestamps {
    /// Create timestamps with only modified time.
    pub fn with_modified(modified: SystemTime) -> Self {
        Self {
            modified,
            accessed: None,
            created: None,
        }
    }

    /// Create timestamps with all available times.
    pub fn new(
        modified: SystemTime,
        accessed: Option<SystemTime>,
        created: Option<SystemTime>,
    ) -> Self {
        Self {
            modified,
            accessed,
            created,
        }
    }

    /// Read timestamps from filesystem metadata.
    ///
    /// Platforms without a modification time fall back to the Unix epoch.
    pub fn from_metadata(metadata: &Metadata) -> Self {
        Self::new(
            metadata.modified().unwrap_or(UNIX_EPOCH),
            metadata.accessed().ok(),
            metadata.created().ok(),
        )
    }

    /// Access time if the platform recorded one, otherwise modification time.
    pub fn last_accessed(&self) -> SystemTime {
        self.accessed.unwrap_or(self.modified)
    }
}

/// Immutable metadata snapshot of one regular file.
///
/// Records are only ever created by the traverser and are identified by
/// their path, which is unique within a single traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Full path to the file.
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
    /// File metadata timestamps.
    pub timestamps: Timestamps,
    /// Always `false` for records yielded by traversal.
    pub is_dir: bool,
}

impl FileRecord {
    /// Create a record for a regular file.
    pub fn new(path: impl Into<PathBuf>, size: u64, timestamps: Timestamps) -> Self {
        Self {
            path: path.into(),
            size,
            timestamps,
            is_dir: false,
        }
    }

    /// Build a record from a path and the metadata already read for it.
    pub fn from_metadata(path: impl Into<PathBuf>, metadata: &Metadata) -> Self {
        Self {
            path: path.into(),
            size: metadata.len(),
            timestamps: Timestamps::from_metadata(metadata),
            is_dir: metadata.is_dir(),
        }
    }

    /// Path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last modification time.
    pub fn modified(&self) -> SystemTime {
        self.timestamps.modified
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_content_hash_hex() {
        let hash = ContentHash::new([0xab; 32]);
        assert_eq!(hash.to_hex().len(), 64);
        assert!(hash.to_hex().starts_with("abab"));
        assert_eq!(hash.to_string(), hash.to_hex());
    }

    #[test]
    fn test_last_accessed_falls_back_to_modified() {
        let modified = SystemTime::now();
        let accessed = modified + Duration::from_secs(60);

        assert_eq!(Timestamps::with_modified(modified).last_accessed(), modified);
        assert_eq!(
            Timestamps::new(modified, Some(accessed), None).last_accessed(),
            accessed
        );
    }

    #[test]
    fn test_file_record_creation() {
        let record = FileRecord::new(
            "/tmp/report.pdf",
            4096,
            Timestamps::with_modified(UNIX_EPOCH),
        );
        assert!(!record.is_dir);
        assert_eq!(record.size, 4096);
        assert_eq!(record.path(), Path::new("/tmp/report.pdf"));
        assert_eq!(record.modified(), UNIX_EPOCH);
    }
}
