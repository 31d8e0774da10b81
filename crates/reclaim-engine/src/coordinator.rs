//! The scan pipeline: traversal followed by the three analyses.

use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};

use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use reclaim_analyze::{
    DuplicateConfig, DuplicateFinder, LargeFileAnalyzer, LargeFileConfig, find_junk_files,
};
use reclaim_core::{
    FileRecord, ScanError, ScanOptions, ScanProgress, ScanResult, ScanStage, ScanState, ScanUpdate,
};
use reclaim_scan::{TraverseOptions, Traverser, estimate_file_count};

use crate::quick::quick_scan_roots;

/// Traversal progress is published every this many files.
const TRAVERSAL_PROGRESS_INTERVAL: u64 = 500;

/// Capacity of the progress broadcast channel.
const PROGRESS_CHANNEL_CAPACITY: usize = 100;

/// Records and counters from traversing every root.
#[derive(Default)]
struct Walk {
    files: Vec<FileRecord>,
    dirs_listed: u64,
    unreadable: u64,
}

/// Runs scans and publishes their progress.
///
/// One scan runs at a time per coordinator. Progress goes out on a broadcast
/// channel as overall percentages, with each stage confined to its band:
/// traversal 5-40, duplicates 40-70, junk 70-85, large files 85-95 and
/// finalizing 95-100. Lagging or absent subscribers never slow a scan down.
pub struct ScanCoordinator {
    progress_tx: broadcast::Sender<ScanUpdate>,
    state_tx: watch::Sender<ScanState>,
}

impl ScanCoordinator {
    /// Create an idle coordinator.
    pub fn new() -> Self {
        let (progress_tx, _) = broadcast::channel(PROGRESS_CHANNEL_CAPACITY);
        let (state_tx, _) = watch::channel(ScanState::Idle);
        Self {
            progress_tx,
            state_tx,
        }
    }

    /// Subscribe to scan progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanUpdate> {
        self.progress_tx.subscribe()
    }

    /// Watch scan state transitions.
    pub fn watch_state(&self) -> watch::Receiver<ScanState> {
        self.state_tx.subscribe()
    }

    /// Current scan state.
    pub fn state(&self) -> ScanState {
        self.state_tx.borrow().clone()
    }

    /// Scan `options.root`.
    pub fn scan(&self, options: &ScanOptions) -> Result<ScanResult, ScanError> {
        self.scan_with_cancellation(options, CancellationToken::new())
    }

    /// Scan `options.root`, stopping early once `token` is cancelled.
    pub fn scan_with_cancellation(
        &self,
        options: &ScanOptions,
        token: CancellationToken,
    ) -> Result<ScanResult, ScanError> {
        self.run(options, &token, |options| {
            let root = validate_root(&options.root)?;
            Ok(vec![root])
        })
    }

    /// Scan the well-known clutter directories under `home`.
    ///
    /// Only the locations that exist are traversed; the rest of `options`
    /// applies unchanged.
    pub fn quick_scan(&self, home: &Path, options: &ScanOptions) -> Result<ScanResult, ScanError> {
        self.quick_scan_with_cancellation(home, options, CancellationToken::new())
    }

    /// Quick scan that stops early once `token` is cancelled.
    pub fn quick_scan_with_cancellation(
        &self,
        home: &Path,
        options: &ScanOptions,
        token: CancellationToken,
    ) -> Result<ScanResult, ScanError> {
        self.run(options, &token, |_| {
            let home = validate_root(home)?;
            Ok(quick_scan_roots(&home))
        })
    }

    fn run<R>(
        &self,
        options: &ScanOptions,
        token: &CancellationToken,
        resolve_roots: R,
    ) -> Result<ScanResult, ScanError>
    where
        R: FnOnce(&ScanOptions) -> Result<Vec<PathBuf>, ScanError>,
    {
        let _running = self.begin()?;

        let result = options
            .validate()
            .and_then(|()| resolve_roots(options))
            .and_then(|roots| self.execute(roots, options, token));
        match &result {
            Ok(result) => {
                let summary = result.summary();
                info!(
                    files = summary.files_scanned,
                    duplicates = summary.duplicates,
                    junk = summary.junk_files,
                    large = summary.large_files,
                    elapsed = ?result.scan_duration,
                    "scan complete"
                );
                self.state_tx.send_replace(ScanState::Complete(summary));
                self.publish(
                    ScanStage::Complete,
                    100.0,
                    result.files_scanned,
                    "Scan complete!",
                );
            }
            Err(err) => {
                warn!(error = %err, "scan failed");
                self.state_tx.send_replace(ScanState::Failed {
                    message: err.to_string(),
                });
            }
        }
        result
    }

    /// Enter the running state, refusing a second concurrent scan.
    ///
    /// The returned guard marks the scan failed if it unwinds while still
    /// running.
    fn begin(&self) -> Result<RunningGuard<'_>, ScanError> {
        let started = self.state_tx.send_if_modified(|state| {
            if state.is_running() {
                false
            } else {
                *state = ScanState::Running;
                true
            }
        });
        if started {
            Ok(RunningGuard {
                state_tx: &self.state_tx,
            })
        } else {
            Err(ScanError::AlreadyRunning)
        }
    }

    fn execute(
        &self,
        roots: Vec<PathBuf>,
        options: &ScanOptions,
        token: &CancellationToken,
    ) -> Result<ScanResult, ScanError> {
        let start = Instant::now();

        // Phase 1: collect all files
        self.publish(ScanStage::Traversing, 5.0, 0, "Starting file traversal...");
        let Walk {
            files,
            dirs_listed,
            unreadable,
        } = self.traverse_roots(&roots, options, token);
        check_cancelled(token)?;

        let files_scanned = files.len() as u64;
        self.publish(
            ScanStage::Traversing,
            40.0,
            files_scanned,
            format!("Found {files_scanned} files. Analyzing..."),
        );

        // Phase 2: duplicates
        let duplicates = if options.skip_duplicates {
            Vec::new()
        } else {
            self.publish(ScanStage::Duplicates, 40.0, files_scanned, "Finding duplicate files...");
            let finder = DuplicateFinder::with_config(DuplicateConfig::from(options))
                .with_cancellation(token.clone());
            let groups = finder
                .find_duplicates(&files, self.stage_observer(ScanStage::Duplicates, files_scanned));
            check_cancelled(token)?;
            groups
        };

        // Phase 3: junk
        let junk_files = if options.skip_junk {
            Vec::new()
        } else {
            self.publish(ScanStage::Junk, 70.0, files_scanned, "Identifying junk files...");
            let junk = find_junk_files(&files, self.stage_observer(ScanStage::Junk, files_scanned));
            check_cancelled(token)?;
            junk
        };

        // Phase 4: large files
        let large_files = if options.skip_large {
            Vec::new()
        } else {
            self.publish(ScanStage::LargeFiles, 85.0, files_scanned, "Finding large files...");
            let analyzer = LargeFileAnalyzer::with_config(LargeFileConfig::from(options));
            let large = analyzer
                .find_large_files(&files, self.stage_observer(ScanStage::LargeFiles, files_scanned));
            check_cancelled(token)?;
            large
        };

        self.publish(ScanStage::Finalizing, 95.0, files_scanned, "Calculating totals...");
        let total_size = files.iter().map(|f| f.size).sum();

        Ok(ScanResult {
            roots,
            scanned_at: SystemTime::now(),
            scan_duration: start.elapsed(),
            files_scanned,
            total_size,
            dirs_scanned: dirs_listed,
            unreadable_paths: unreadable,
            duplicates,
            junk_files,
            large_files,
        })
    }

    /// Materialize every root's records, publishing traversal progress.
    fn traverse_roots(
        &self,
        roots: &[PathBuf],
        options: &ScanOptions,
        token: &CancellationToken,
    ) -> Walk {
        let estimate = options
            .calibrate_progress
            .then(|| roots.iter().map(|r| estimate_file_count(r)).sum::<u64>());
        if let Some(estimate) = estimate {
            debug!(estimate, "calibrated traversal progress");
        }

        let mut walk = Walk::default();
        for root in roots {
            debug!(root = %root.display(), "traversing");
            let mut traverser = Traverser::new(root, TraverseOptions::from(options))
                .with_cancellation(token.clone());

            for record in traverser.by_ref() {
                walk.files.push(record);
                let count = walk.files.len() as u64;
                if count % TRAVERSAL_PROGRESS_INTERVAL == 0 {
                    self.publish(
                        ScanStage::Traversing,
                        traversal_percent(count, estimate),
                        count,
                        format!("Scanning: {count} files found"),
                    );
                }
            }

            walk.dirs_listed += traverser.dirs_listed();
            walk.unreadable += traverser.error_count();
            if traverser.is_cancelled() {
                break;
            }
        }
        walk
    }

    /// Observer mapping an analysis' own progress onto its stage band.
    fn stage_observer(
        &self,
        stage: ScanStage,
        files_scanned: u64,
    ) -> impl FnMut(&ScanProgress) + '_ {
        move |progress| {
            self.publish(
                stage,
                stage.percent(progress.fraction()),
                files_scanned,
                progress.message.clone(),
            )
        }
    }

    fn publish(
        &self,
        stage: ScanStage,
        percent: f64,
        files_scanned: u64,
        message: impl Into<String>,
    ) {
        let update = ScanUpdate {
            stage,
            percent,
            files_scanned,
            message: message.into(),
        };
        debug!(stage = %update.stage, percent = update.percent, "{}", update.message);
        // No subscribers is fine
        let _ = self.progress_tx.send(update);
    }
}

/// Leaves the running state when a scan unwinds.
struct RunningGuard<'a> {
    state_tx: &'a watch::Sender<ScanState>,
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        let aborted = self.state_tx.send_if_modified(|state| {
            if state.is_running() {
                *state = ScanState::Failed {
                    message: "Scan aborted unexpectedly".to_string(),
                };
                true
            } else {
                false
            }
        });
        if aborted {
            error!("scan aborted while running");
        }
    }
}

impl Default for ScanCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve a scan root, which must be an existing directory.
fn validate_root(root: &Path) -> Result<PathBuf, ScanError> {
    let canonical = root.canonicalize().map_err(|e| ScanError::io(root, e))?;
    if !canonical.is_dir() {
        return Err(ScanError::NotADirectory { path: canonical });
    }
    Ok(canonical)
}

fn check_cancelled(token: &CancellationToken) -> Result<(), ScanError> {
    if token.is_cancelled() {
        Err(ScanError::Cancelled)
    } else {
        Ok(())
    }
}

/// Traversal percentage: against the estimate when calibrated, otherwise
/// one point per thousand files.
fn traversal_percent(files: u64, estimate: Option<u64>) -> f64 {
    match estimate {
        Some(estimate) if estimate > 0 => {
            ScanStage::Traversing.percent(files as f64 / estimate as f64)
        }
        _ => (5.0 + files as f64 / 1000.0).min(40.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_traversal_percent_uncalibrated() {
        assert_eq!(traversal_percent(500, None), 5.5);
        assert_eq!(traversal_percent(10_000, None), 15.0);
        assert_eq!(traversal_percent(1_000_000, None), 40.0);
    }

    #[test]
    fn test_traversal_percent_calibrated() {
        assert_eq!(traversal_percent(500, Some(1000)), 22.5);
        assert_eq!(traversal_percent(5000, Some(1000)), 40.0);
        assert_eq!(traversal_percent(500, Some(0)), 5.5);
    }

    #[test]
    fn test_second_scan_is_refused_while_running() {
        let coordinator = ScanCoordinator::new();
        let running = coordinator.begin().unwrap();
        assert!(matches!(coordinator.begin(), Err(ScanError::AlreadyRunning)));

        coordinator.state_tx.send_replace(ScanState::Idle);
        drop(running);
        assert_eq!(coordinator.state(), ScanState::Idle);
        assert!(coordinator.begin().is_ok());
    }

    #[test]
    fn test_panic_during_scan_releases_coordinator() {
        let coordinator = ScanCoordinator::new();
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _running = coordinator.begin().unwrap();
            panic!("analysis bug");
        }));

        assert!(outcome.is_err());
        assert_eq!(
            coordinator.state(),
            ScanState::Failed {
                message: "Scan aborted unexpectedly".to_string()
            }
        );
        assert!(coordinator.begin().is_ok());
    }

    #[test]
    fn test_missing_root_fails_scan() {
        let coordinator = ScanCoordinator::new();
        let options = ScanOptions::new("/definitely/not/here");

        let err = coordinator.scan(&options).unwrap_err();
        assert!(matches!(err, ScanError::NotFound { .. }));
        assert!(matches!(coordinator.state(), ScanState::Failed { .. }));
    }
}
