//! Guarded delivery of analysis progress.

use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::{trace, warn};

use reclaim_core::ScanProgress;

/// Hand a progress report to the caller's observer.
///
/// A panicking observer is logged and otherwise ignored so it can never abort
/// the analysis.
pub(crate) fn emit<F>(on_progress: &mut F, progress: ScanProgress)
where
    F: FnMut(&ScanProgress),
{
    trace!(
        phase = progress.phase,
        processed = progress.processed,
        total = progress.total,
        "{}",
        progress.message
    );
    if catch_unwind(AssertUnwindSafe(|| on_progress(&progress))).is_err() {
        warn!(message = %progress.message, "progress observer panicked");
    }
}
