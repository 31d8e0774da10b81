//! Roots for a quick scan.

use std::path::{Path, PathBuf};

use tracing::debug;

/// Directories below home where clutter usually accumulates.
pub const QUICK_SCAN_DIRS: &[&str] = &[
    "Downloads",
    "Library/Caches",
    "Library/Logs",
    "Desktop",
    "Documents",
];

/// The quick scan locations under `home` that exist as directories.
pub fn quick_scan_roots(home: &Path) -> Vec<PathBuf> {
    QUICK_SCAN_DIRS
        .iter()
        .map(|dir| home.join(dir))
        .filter(|path| {
            let exists = path.is_dir();
            if !exists {
                debug!(path = %path.display(), "quick scan location missing");
            }
            exists
        })
        .collect()
}
