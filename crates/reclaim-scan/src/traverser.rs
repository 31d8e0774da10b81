//! Lazy breadth-first directory traversal.

use std::collections::VecDeque;
use std::fs::{self, DirEntry, ReadDir};
use std::io;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};

use derive_builder::Builder;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use reclaim_core::{
    DEFAULT_MAX_DEPTH, FileRecord, ScanOptions, TraversalError, TraversalErrorKind,
};

use crate::skip::should_skip;

/// Configuration for a single traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder)]
#[builder(setter(into))]
pub struct TraverseOptions {
    /// Directories deeper than this below the root are not listed.
    #[builder(default = "DEFAULT_MAX_DEPTH")]
    pub max_depth: u32,

    /// Follow symbolic links instead of skipping them.
    #[builder(default = "false")]
    pub follow_symlinks: bool,
}

impl Default for TraverseOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            follow_symlinks: false,
        }
    }
}

impl TraverseOptions {
    /// Create a new options builder.
    pub fn builder() -> TraverseOptionsBuilder {
        TraverseOptionsBuilder::default()
    }
}

impl From<&ScanOptions> for TraverseOptions {
    fn from(options: &ScanOptions) -> Self {
        Self {
            max_depth: options.max_depth,
            follow_symlinks: options.follow_symlinks,
        }
    }
}

type ErrorObserver<'a> = Box<dyn FnMut(&TraversalError) + Send + 'a>;

/// Directory currently being listed.
struct OpenDir {
    path: PathBuf,
    depth: u32,
    entries: ReadDir,
}

/// Breadth-first walker yielding one [`FileRecord`] per regular file.
///
/// The walk is lazy: directories are listed only as records are pulled. It
/// is finite and cannot be restarted; walk again by creating a new
/// traverser. Unreadable directories and entries are reported to the error
/// observer and skipped.
pub struct Traverser<'a> {
    options: TraverseOptions,
    queue: VecDeque<(PathBuf, u32)>,
    current: Option<OpenDir>,
    on_error: ErrorObserver<'a>,
    cancel: CancellationToken,
    errors: u64,
    dirs_listed: u64,
}

impl<'a> Traverser<'a> {
    /// Create a traverser rooted at `root`.
    pub fn new(root: impl Into<PathBuf>, options: TraverseOptions) -> Self {
        let mut queue = VecDeque::new();
        queue.push_back((root.into(), 0));
        Self {
            options,
            queue,
            current: None,
            on_error: Box::new(|_| {}),
            cancel: CancellationToken::new(),
            errors: 0,
            dirs_listed: 0,
        }
    }

    /// Observe paths that could not be read.
    pub fn on_error<F>(mut self, observer: F) -> Self
    where
        F: FnMut(&TraversalError) + Send + 'a,
    {
        self.on_error = Box::new(observer);
        self
    }

    /// Stop yielding records once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Number of paths reported to the error observer so far.
    pub fn error_count(&self) -> u64 {
        self.errors
    }

    /// Number of directories listed so far.
    pub fn dirs_listed(&self) -> u64 {
        self.dirs_listed
    }

    /// Check if the walk stopped because of cancellation.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    fn report(&mut self, error: TraversalError) {
        self.errors += 1;
        debug!(path = %error.path.display(), error = %error.source, "skipping unreadable path");

        let observer = &mut self.on_error;
        if catch_unwind(AssertUnwindSafe(|| observer(&error))).is_err() {
            warn!(path = %error.path.display(), "traversal error observer panicked");
        }
    }

    /// Open the next queued directory. Returns `false` when the queue is empty.
    fn open_next(&mut self) -> bool {
        while let Some((path, depth)) = self.queue.pop_front() {
            if self.cancel.is_cancelled() {
                return false;
            }
            match fs::read_dir(&path) {
                Ok(entries) => {
                    self.dirs_listed += 1;
                    self.current = Some(OpenDir {
                        path,
                        depth,
                        entries,
                    });
                    return true;
                }
                Err(err) => {
                    self.report(TraversalError::new(path, TraversalErrorKind::ListDir, err));
                }
            }
        }
        false
    }

    /// Classify one directory entry, queueing subdirectories.
    fn visit(&mut self, entry: DirEntry, depth: u32) -> Option<FileRecord> {
        let path = entry.path();
        let name = entry.file_name();

        if should_skip(&name.to_string_lossy(), &path.to_string_lossy()) {
            trace!(path = %path.display(), "skipped by policy");
            return None;
        }

        let metadata = match read_metadata(&path, self.options.follow_symlinks) {
            Ok(m) => m,
            Err(err) => {
                self.report(TraversalError::new(path, TraversalErrorKind::Metadata, err));
                return None;
            }
        };

        let file_type = metadata.file_type();
        if file_type.is_symlink() {
            None
        } else if file_type.is_dir() {
            if depth < self.options.max_depth {
                self.queue.push_back((path, depth + 1));
            } else {
                trace!(path = %path.display(), "depth limit reached");
            }
            None
        } else if file_type.is_file() {
            Some(FileRecord::from_metadata(path, &metadata))
        } else {
            None
        }
    }
}

impl Iterator for Traverser<'_> {
    type Item = FileRecord;

    fn next(&mut self) -> Option<FileRecord> {
        loop {
            if self.cancel.is_cancelled() {
                self.current = None;
                self.queue.clear();
                return None;
            }

            let Some(dir) = self.current.as_mut() else {
                if self.open_next() {
                    continue;
                }
                return None;
            };

            let depth = dir.depth;
            match dir.entries.next() {
                Some(Ok(entry)) => {
                    if let Some(record) = self.visit(entry, depth) {
                        return Some(record);
                    }
                }
                Some(Err(err)) => {
                    let path = dir.path.clone();
                    self.report(TraversalError::new(path, TraversalErrorKind::ListDir, err));
                }
                None => self.current = None,
            }
        }
    }
}

/// Walk `root` with the given options, ignoring unreadable paths.
pub fn traverse<'a>(root: impl Into<PathBuf>, options: TraverseOptions) -> Traverser<'a> {
    Traverser::new(root, options)
}

fn read_metadata(path: &Path, follow_symlinks: bool) -> io::Result<fs::Metadata> {
    if follow_symlinks {
        fs::metadata(path)
    } else {
        fs::symlink_metadata(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn create_test_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir_all(root.join("dir1/subdir")).unwrap();
        fs::create_dir(root.join("dir2")).unwrap();

        fs::write(root.join("file1.txt"), "hello").unwrap();
        fs::write(root.join("dir1/file2.txt"), "world world world").unwrap();
        fs::write(root.join("dir1/subdir/file3.txt"), "test").unwrap();
        fs::write(root.join("dir2/file4.txt"), "another file here").unwrap();

        temp
    }

    fn names(records: &[FileRecord]) -> HashSet<String> {
        records
            .iter()
            .map(|r| r.path.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_yields_all_regular_files() {
        let temp = create_test_tree();
        let records: Vec<_> = traverse(temp.path(), TraverseOptions::default()).collect();

        assert_eq!(records.len(), 4);
        assert!(records.iter().all(|r| !r.is_dir));
        let file2 = records
            .iter()
            .find(|r| r.path.ends_with("dir1/file2.txt"))
            .unwrap();
        assert_eq!(file2.size, 17);
    }

    #[test]
    fn test_breadth_first_order() {
        let temp = create_test_tree();
        let records: Vec<_> = traverse(temp.path(), TraverseOptions::default()).collect();

        let depth = |r: &FileRecord| {
            r.path
                .strip_prefix(temp.path())
                .unwrap()
                .components()
                .count()
        };
        let depths: Vec<_> = records.iter().map(depth).collect();
        let mut sorted = depths.clone();
        sorted.sort();
        assert_eq!(depths, sorted);
    }

    #[test]
    fn test_max_depth() {
        let temp = create_test_tree();
        let options = TraverseOptions::builder().max_depth(1u32).build().unwrap();
        let records: Vec<_> = traverse(temp.path(), options).collect();

        let found = names(&records);
        assert!(found.contains("file1.txt"));
        assert!(found.contains("file2.txt"));
        assert!(!found.contains("file3.txt"));

        let options = TraverseOptions::builder().max_depth(0u32).build().unwrap();
        let records: Vec<_> = traverse(temp.path(), options).collect();
        assert_eq!(names(&records), HashSet::from(["file1.txt".to_string()]));
    }

    #[test]
    fn test_unreadable_root_is_reported() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing");
        let mut reported = Vec::new();

        let mut traverser = traverse(&missing, TraverseOptions::default())
            .on_error(|e| reported.push((e.path.clone(), e.kind)));
        assert!(traverser.next().is_none());
        assert_eq!(traverser.error_count(), 1);
        drop(traverser);

        assert_eq!(reported, vec![(missing, TraversalErrorKind::ListDir)]);
    }

    #[test]
    fn test_panicking_observer_does_not_abort_walk() {
        let temp = create_test_tree();
        fs::create_dir(temp.path().join("locked")).unwrap();
        let walked_before = traverse(temp.path(), TraverseOptions::default()).count();

        let missing = temp.path().join("missing");
        let mut traverser = traverse(&missing, TraverseOptions::default())
            .on_error(|_| panic!("observer failure"));
        assert!(traverser.next().is_none());
        assert_eq!(traverser.error_count(), 1);

        // A healthy walk with the same observer is unaffected.
        let walked = traverse(temp.path(), TraverseOptions::default())
            .on_error(|_| panic!("observer failure"))
            .count();
        assert_eq!(walked, walked_before);
    }

    #[test]
    fn test_cancellation_stops_walk() {
        let temp = create_test_tree();
        let token = CancellationToken::new();
        let mut traverser =
            traverse(temp.path(), TraverseOptions::default()).with_cancellation(token.clone());

        assert!(traverser.next().is_some());
        token.cancel();
        assert!(traverser.next().is_none());
        assert!(traverser.is_cancelled());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_skipped_unless_followed() {
        let temp = create_test_tree();
        std::os::unix::fs::symlink(
            temp.path().join("file1.txt"),
            temp.path().join("link.txt"),
        )
        .unwrap();

        let records: Vec<_> = traverse(temp.path(), TraverseOptions::default()).collect();
        assert!(!names(&records).contains("link.txt"));

        let options = TraverseOptions::builder()
            .follow_symlinks(true)
            .build()
            .unwrap();
        let records: Vec<_> = traverse(temp.path(), options).collect();
        assert!(names(&records).contains("link.txt"));
    }
}
