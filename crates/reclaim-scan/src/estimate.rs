//! Quick file count estimation for progress calibration.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::traverser::{TraverseOptions, traverse};

/// Records sampled before the estimate gives up and extrapolates.
pub const DEFAULT_SAMPLE_SIZE: u64 = 1000;

/// Wall-clock budget for sampling.
pub const DEFAULT_SAMPLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Factor applied to the sample when the sample cap is hit.
pub const ESTIMATE_MULTIPLIER: u64 = 10;

/// Estimate the number of files below `root` with the default budget.
pub fn estimate_file_count(root: impl Into<PathBuf>) -> u64 {
    estimate_file_count_with(root, DEFAULT_SAMPLE_SIZE, DEFAULT_SAMPLE_TIMEOUT)
}

/// Estimate the number of files below `root`.
///
/// Walks until `sample_size` records were seen or `timeout` elapsed. When the
/// sample cap was hit the count is extrapolated by [`ESTIMATE_MULTIPLIER`];
/// otherwise the exact count is returned. Unreadable paths are ignored.
pub fn estimate_file_count_with(
    root: impl Into<PathBuf>,
    sample_size: u64,
    timeout: Duration,
) -> u64 {
    if sample_size == 0 {
        return 0;
    }

    let start = Instant::now();
    let mut count = 0u64;
    for _record in traverse(root, TraverseOptions::default()) {
        count += 1;
        if count >= sample_size || start.elapsed() > timeout {
            break;
        }
    }

    if count >= sample_size {
        count * ESTIMATE_MULTIPLIER
    } else {
        count
    }
}
