//! Large file detection with access-age heuristics.

use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use tracing::info;

use reclaim_core::{
    FileRecord, LARGE_FILE_THRESHOLD, LargeFileRecord, ScanOptions, ScanProgress, Suggestion,
};

use crate::progress::emit;

/// Progress is reported every this many files.
const PROGRESS_INTERVAL: usize = 5000;

/// Configuration for large file detection.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct LargeFileConfig {
    /// Minimum size for a file to be reported.
    #[builder(default = "LARGE_FILE_THRESHOLD")]
    pub min_size: u64,

    /// Reference time for age calculations (default: now).
    #[builder(default = "SystemTime::now()")]
    pub reference_time: SystemTime,
}

impl Default for LargeFileConfig {
    fn default() -> Self {
        Self {
            min_size: LARGE_FILE_THRESHOLD,
            reference_time: SystemTime::now(),
        }
    }
}

impl LargeFileConfig {
    /// Create a new config builder.
    pub fn builder() -> LargeFileConfigBuilder {
        LargeFileConfigBuilder::default()
    }
}

impl From<&ScanOptions> for LargeFileConfig {
    fn from(options: &ScanOptions) -> Self {
        Self {
            min_size: options.large_file_min_size,
            reference_time: SystemTime::now(),
        }
    }
}

/// Finds files at or above a size threshold and rates how stale they are.
#[derive(Debug, Clone, Default)]
pub struct LargeFileAnalyzer {
    config: LargeFileConfig,
}

impl LargeFileAnalyzer {
    /// Create a new analyzer with default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new analyzer with custom config.
    pub fn with_config(config: LargeFileConfig) -> Self {
        Self { config }
    }

    /// Large files sorted by size, largest first.
    ///
    /// Files of equal size keep their input order.
    pub fn find_large_files<F>(&self, files: &[FileRecord], mut on_progress: F) -> Vec<LargeFileRecord>
    where
        F: FnMut(&ScanProgress),
    {
        let total = files.len() as u64;
        emit(
            &mut on_progress,
            ScanProgress::new(1, 1, 0, total, "Finding large files..."),
        );

        let mut large = Vec::new();
        for (i, file) in files.iter().enumerate() {
            if file.size >= self.config.min_size {
                large.push(self.rate(file));
            }

            let processed = i + 1;
            if processed % PROGRESS_INTERVAL == 0 {
                emit(
                    &mut on_progress,
                    ScanProgress::new(
                        1,
                        1,
                        processed as u64,
                        total,
                        format!("Checking file sizes: {processed}/{total}"),
                    ),
                );
            }
        }

        large.sort_by(|a, b| b.file.size.cmp(&a.file.size));

        emit(
            &mut on_progress,
            ScanProgress::new(
                1,
                1,
                total,
                total,
                format!(
                    "Found {} large files (>{})",
                    large.len(),
                    threshold_label(self.config.min_size)
                ),
            )
            .completed(),
        );
        info!(files = total, large = large.len(), "large file detection done");

        large
    }

    fn rate(&self, file: &FileRecord) -> LargeFileRecord {
        let last_accessed = file.timestamps.last_accessed();
        let age_in_days = age_in_days(self.config.reference_time, last_accessed);
        LargeFileRecord {
            file: file.clone(),
            last_accessed,
            age_in_days,
            suggestion: Suggestion::for_age(age_in_days),
        }
    }
}

/// Threshold for messages: whole MiB as "100MB", anything else in bytes.
fn threshold_label(min_size: u64) -> String {
    const MIB: u64 = 1024 * 1024;
    if min_size >= MIB && min_size % MIB == 0 {
        format!("{}MB", min_size / MIB)
    } else {
        format!("{min_size} bytes")
    }
}

/// Whole days elapsed from `then` to `now`; zero when `then` lies in the future.
pub fn age_in_days(now: SystemTime, then: SystemTime) -> u64 {
    let now: DateTime<Utc> = now.into();
    let then: DateTime<Utc> = then.into();
    now.signed_duration_since(then).num_days().max(0) as u64
}

/// Count and size totals over a large file report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LargeFileStats {
    pub count: usize,
    pub total_size: u64,
    /// Files not accessed for at least 90 days (includes very old ones).
    pub old_count: usize,
    pub old_size: u64,
    /// Files not accessed for at least 180 days.
    pub very_old_count: usize,
    pub very_old_size: u64,
}

impl LargeFileStats {
    /// Tally a large file report.
    pub fn from_records(records: &[LargeFileRecord]) -> Self {
        let mut stats = Self::default();
        for record in records {
            stats.count += 1;
            stats.total_size += record.file.size;
            if record.age_in_days >= Suggestion::STALE_DAYS {
                stats.old_count += 1;
                stats.old_size += record.file.size;
            }
            if record.age_in_days >= Suggestion::VERY_STALE_DAYS {
                stats.very_old_count += 1;
                stats.very_old_size += record.file.size;
            }
        }
        stats
    }
}

/// Format an age as a human-readable string.
pub fn format_age(duration: Duration) -> String {
    let secs = duration.as_secs();
    match secs {
        0..60 => format!("{secs} seconds"),
        60..3600 => format!("{} minutes", secs / 60),
        3600..86400 => format!("{} hours", secs / 3600),
        86400..2592000 => format!("{} days", secs / 86400),
        2592000..31536000 => format!("{} months", secs / 2592000),
        _ => format!("{:.1} years", secs as f64 / 31536000.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reclaim_core::Timestamps;

    const DAY: u64 = 24 * 60 * 60;
    const MIB: u64 = 1024 * 1024;

    fn now() -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(1000 * DAY)
    }

    fn record(path: &str, size: u64, accessed_days_ago: u64) -> FileRecord {
        let accessed = now() - Duration::from_secs(accessed_days_ago * DAY);
        FileRecord::new(
            path,
            size,
            Timestamps::new(accessed - Duration::from_secs(DAY), Some(accessed), None),
        )
    }

    fn analyzer() -> LargeFileAnalyzer {
        LargeFileAnalyzer::with_config(
            LargeFileConfig::builder()
                .reference_time(now())
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_age_in_days_floors_and_clamps() {
        let base = now();
        assert_eq!(age_in_days(base, base), 0);
        assert_eq!(age_in_days(base, base - Duration::from_secs(DAY - 1)), 0);
        assert_eq!(age_in_days(base, base - Duration::from_secs(90 * DAY + 5)), 90);
        assert_eq!(age_in_days(base, base + Duration::from_secs(10 * DAY)), 0);
    }

    #[test]
    fn test_filters_and_sorts_by_size() {
        let files = vec![
            record("/m/small.bin", MIB, 0),
            record("/m/mid.iso", 150 * MIB, 10),
            record("/m/big.mkv", 400 * MIB, 200),
            record("/m/edge.img", 100 * MIB, 95),
        ];

        let large = analyzer().find_large_files(&files, |_| {});
        let paths: Vec<_> = large.iter().map(|l| l.file.path.to_str().unwrap()).collect();
        assert_eq!(paths, vec!["/m/big.mkv", "/m/mid.iso", "/m/edge.img"]);

        assert_eq!(large[0].suggestion, Suggestion::VeryStale);
        assert_eq!(large[0].age_in_days, 200);
        assert_eq!(large[1].suggestion, Suggestion::None);
        assert_eq!(large[2].suggestion, Suggestion::Stale);
    }

    #[test]
    fn test_missing_access_time_uses_modified() {
        let modified = now() - Duration::from_secs(181 * DAY);
        let file = FileRecord::new("/m/old.iso", 200 * MIB, Timestamps::with_modified(modified));

        let large = analyzer().find_large_files(&[file], |_| {});
        assert_eq!(large[0].last_accessed, modified);
        assert_eq!(large[0].suggestion, Suggestion::VeryStale);
    }

    #[test]
    fn test_custom_threshold_and_progress() {
        let files: Vec<_> = (0..10_000)
            .map(|i| record(&format!("/f/{i}"), i, 0))
            .collect();
        let config = LargeFileConfig::builder()
            .min_size(9_990u64)
            .reference_time(now())
            .build()
            .unwrap();

        let mut messages = Vec::new();
        let large = LargeFileAnalyzer::with_config(config)
            .find_large_files(&files, |p| messages.push(p.message.clone()));

        assert_eq!(large.len(), 10);
        assert_eq!(large[0].file.size, 9_999);
        assert_eq!(
            messages,
            vec![
                "Finding large files...",
                "Checking file sizes: 5000/10000",
                "Checking file sizes: 10000/10000",
                "Found 10 large files (>9990 bytes)",
            ]
        );
    }

    #[test]
    fn test_threshold_label() {
        assert_eq!(threshold_label(LARGE_FILE_THRESHOLD), "100MB");
        assert_eq!(threshold_label(MIB + 1), "1048577 bytes");
        assert_eq!(threshold_label(512), "512 bytes");
        assert_eq!(threshold_label(0), "0 bytes");
    }

    #[test]
    fn test_stats() {
        let files = vec![
            record("/a", 200 * MIB, 10),
            record("/b", 300 * MIB, 100),
            record("/c", 500 * MIB, 365),
        ];
        let stats = LargeFileStats::from_records(&analyzer().find_large_files(&files, |_| {}));

        assert_eq!(stats.count, 3);
        assert_eq!(stats.total_size, 1000 * MIB);
        assert_eq!(stats.old_count, 2);
        assert_eq!(stats.old_size, 800 * MIB);
        assert_eq!(stats.very_old_count, 1);
        assert_eq!(stats.very_old_size, 500 * MIB);
    }

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(Duration::from_secs(30)), "30 seconds");
        assert_eq!(format_age(Duration::from_secs(120)), "2 minutes");
        assert_eq!(format_age(Duration::from_secs(7200)), "2 hours");
        assert_eq!(format_age(Duration::from_secs(172800)), "2 days");
        assert_eq!(format_age(Duration::from_secs(400 * DAY)), "1.1 years");
    }
}
