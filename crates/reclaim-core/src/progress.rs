//! Progress reporting types.

use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

/// Progress reported by a single analysis.
///
/// `phase` counts from 1 up to `phase_count`; single-phase analyses report
/// phase 1 of 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanProgress {
    /// Current internal phase (1-based).
    pub phase: u8,
    /// Number of internal phases of the analysis.
    pub phase_count: u8,
    /// Items processed so far in this phase.
    pub processed: u64,
    /// Items to process in this phase (0 when unknown).
    pub total: u64,
    /// Human-readable status.
    pub message: String,
    /// Set on the final report of the analysis.
    pub complete: bool,
}

impl ScanProgress {
    /// Report for a phase with a processed/total counter.
    pub fn new(
        phase: u8,
        phase_count: u8,
        processed: u64,
        total: u64,
        message: impl Into<String>,
    ) -> Self {
        Self {
            phase,
            phase_count,
            processed,
            total,
            message: message.into(),
            complete: false,
        }
    }

    /// Report a phase boundary with no counter.
    pub fn status(phase: u8, phase_count: u8, message: impl Into<String>) -> Self {
        Self::new(phase, phase_count, 0, 0, message)
    }

    /// Mark this report as the final one.
    pub fn completed(mut self) -> Self {
        self.complete = true;
        self
    }

    /// Fraction (0.0 to 1.0) of the whole analysis that is done.
    pub fn fraction(&self) -> f64 {
        if self.complete {
            return 1.0;
        }
        let phases = f64::from(self.phase_count.max(1));
        let finished_phases = f64::from(self.phase.saturating_sub(1));
        let within = if self.total > 0 {
            (self.processed as f64 / self.total as f64).min(1.0)
        } else {
            0.0
        };
        ((finished_phases + within) / phases).clamp(0.0, 1.0)
    }
}

/// Coarse stage of a full scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScanStage {
    Traversing,
    Duplicates,
    Junk,
    LargeFiles,
    Finalizing,
    Complete,
}

impl ScanStage {
    /// Overall percentage range assigned to this stage.
    pub fn band(&self) -> (f64, f64) {
        match self {
            Self::Traversing => (5.0, 40.0),
            Self::Duplicates => (40.0, 70.0),
            Self::Junk => (70.0, 85.0),
            Self::LargeFiles => (85.0, 95.0),
            Self::Finalizing => (95.0, 100.0),
            Self::Complete => (100.0, 100.0),
        }
    }

    /// Map a stage-internal fraction onto the overall percentage.
    pub fn percent(&self, fraction: f64) -> f64 {
        let (start, end) = self.band();
        start + fraction.clamp(0.0, 1.0) * (end - start)
    }
}

/// A single overall progress update published by the scan coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanUpdate {
    pub stage: ScanStage,
    /// Overall progress, 0.0 to 100.0.
    pub percent: f64,
    /// Files found by traversal so far.
    pub files_scanned: u64,
    pub message: String,
}
