//! Aggregate scan results and scan lifecycle state.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::findings::{DuplicateGroup, JunkFileRecord, LargeFileRecord, Suggestion};

/// Everything a completed scan produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    /// Roots that were traversed.
    pub roots: Vec<PathBuf>,

    /// When this scan finished.
    pub scanned_at: SystemTime,

    /// Duration of the scan.
    pub scan_duration: Duration,

    /// Number of regular files found by traversal.
    pub files_scanned: u64,

    /// Sum of the sizes of all traversed files.
    pub total_size: u64,

    /// Number of directories the traverser listed.
    pub dirs_scanned: u64,

    /// Number of paths the traverser could not read.
    pub unreadable_paths: u64,

    /// Duplicate groups (empty when skipped).
    pub duplicates: Vec<DuplicateGroup>,

    /// Junk files, highest weight first (empty when skipped).
    pub junk_files: Vec<JunkFileRecord>,

    /// Large files, largest first (empty when skipped).
    pub large_files: Vec<LargeFileRecord>,
}

impl ScanResult {
    /// Counts of each finding.
    pub fn summary(&self) -> ScanSummary {
        ScanSummary {
            files_scanned: self.files_scanned,
            duplicates: self.duplicates.len(),
            junk_files: self.junk_files.len(),
            large_files: self.large_files.len(),
        }
    }

    /// Paths a cleanup step would be handed: redundant duplicate copies, all
    /// junk files and stale large files. Each path appears once.
    pub fn reclaimable_paths(&self) -> Vec<PathBuf> {
        let mut seen = std::collections::HashSet::new();
        let duplicates = self
            .duplicates
            .iter()
            .flat_map(|g| g.redundant().iter().map(|m| &m.path));
        let junk = self.junk_files.iter().map(|j| &j.file.path);
        let large = self
            .large_files
            .iter()
            .filter(|l| l.suggestion != Suggestion::None)
            .map(|l| &l.file.path);

        duplicates
            .chain(junk)
            .chain(large)
            .filter(|p| seen.insert(*p))
            .cloned()
            .collect()
    }

    /// Check if the scan found anything worth cleaning.
    pub fn has_findings(&self) -> bool {
        !self.duplicates.is_empty() || !self.junk_files.is_empty() || !self.large_files.is_empty()
    }
}

/// Counts reported when a scan completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub files_scanned: u64,
    pub duplicates: usize,
    pub junk_files: usize,
    pub large_files: usize,
}

/// Lifecycle of a scan: `Idle -> Running -> {Complete, Failed}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanState {
    #[default]
    Idle,
    Running,
    Complete(ScanSummary),
    Failed { message: String },
}

impl ScanState {
    /// Check if a scan is in progress.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Check if the last scan ended, successfully or not.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Complete(_) | Self::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::findings::{DuplicateMember, JunkCategory, JunkRule};
    use crate::record::{ContentHash, FileRecord, Timestamps};
    use std::time::UNIX_EPOCH;

    fn record(path: &str, size: u64) -> FileRecord {
        FileRecord::new(path, size, Timestamps::with_modified(UNIX_EPOCH))
    }

    fn sample_result() -> ScanResult {
        let dup = |p: &str| DuplicateMember::from(&record(p, 2048));
        let large = |p: &str, suggestion| LargeFileRecord {
            file: record(p, 200 * 1024 * 1024),
            last_accessed: UNIX_EPOCH,
            age_in_days: 0,
            suggestion,
        };
        let rule = JunkRule::new("**/*.tmp", JunkCategory::Temp, "Temp files", 9);

        ScanResult {
            roots: vec![PathBuf::from("/home")],
            scanned_at: SystemTime::now(),
            scan_duration: Duration::ZERO,
            files_scanned: 10,
            total_size: 0,
            dirs_scanned: 1,
            unreadable_paths: 0,
            duplicates: vec![DuplicateGroup {
                hash: ContentHash::new([0; 32]),
                size: 2048,
                files: vec![dup("/home/a.bin"), dup("/home/b.tmp")],
            }],
            junk_files: vec![JunkFileRecord::new(&record("/home/b.tmp", 2048), &rule)],
            large_files: vec![
                large("/home/movie.mkv", Suggestion::VeryStale),
                large("/home/fresh.iso", Suggestion::None),
            ],
        }
    }

    #[test]
    fn test_summary_counts() {
        let summary = sample_result().summary();
        assert_eq!(summary.files_scanned, 10);
        assert_eq!(summary.duplicates, 1);
        assert_eq!(summary.junk_files, 1);
        assert_eq!(summary.large_files, 2);
    }

    #[test]
    fn test_reclaimable_paths_skip_originals_and_fresh_files() {
        let paths = sample_result().reclaimable_paths();
        assert_eq!(
            paths,
            vec![PathBuf::from("/home/b.tmp"), PathBuf::from("/home/movie.mkv")]
        );
    }

    #[test]
    fn test_state_predicates() {
        assert!(!ScanState::Idle.is_finished());
        assert!(ScanState::Running.is_running());
        assert!(ScanState::Failed { message: "x".into() }.is_finished());
    }
}
