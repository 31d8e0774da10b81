//! Duplicate file detection using content hashing.
//!
//! Uses a three-phase algorithm for efficiency:
//! 1. Group files by size (instant, O(n))
//! 2. Hash the first few KiB of every size-matched file
//! 3. Compute the full BLAKE3 hash for partial-hash matches
//!
//! This minimizes disk I/O by eliminating non-duplicates early. Hashing runs
//! on a rayon pool in fixed-size chunks; the calling thread alone folds each
//! chunk's results into the grouping maps.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use blake3::Hasher;
use derive_builder::Builder;
use indexmap::IndexMap;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use reclaim_core::{
    ContentHash, DuplicateGroup, DuplicateMember, FileRecord, HashError, MAX_QUICK_HASH_SIZE,
    MIN_DUPLICATE_SIZE, QUICK_HASH_SIZE, ScanOptions, ScanProgress,
};

use crate::progress::emit;

/// Number of internal phases reported through progress.
const PHASES: u8 = 3;

/// Partial hash progress is reported every this many files.
const PARTIAL_PROGRESS_INTERVAL: usize = 100;

/// Full hash progress is reported every this many files.
const FULL_PROGRESS_INTERVAL: usize = 50;

/// Files above this size are hashed through a memory map.
const MMAP_THRESHOLD: u64 = 128 * 1024;

/// Configuration for duplicate detection.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct DuplicateConfig {
    /// Minimum file size to consider (skip tiny files).
    #[builder(default = "MIN_DUPLICATE_SIZE")]
    pub min_size: u64,

    /// Number of bytes hashed from the start of each candidate.
    #[builder(default = "QUICK_HASH_SIZE")]
    pub quick_hash_size: usize,

    /// Hashing threads (0 = rayon's global pool).
    #[builder(default = "0")]
    pub threads: usize,
}

impl Default for DuplicateConfig {
    fn default() -> Self {
        Self {
            min_size: MIN_DUPLICATE_SIZE,
            quick_hash_size: QUICK_HASH_SIZE,
            threads: 0,
        }
    }
}

impl DuplicateConfig {
    /// Create a new config builder.
    pub fn builder() -> DuplicateConfigBuilder {
        DuplicateConfigBuilder::default()
    }

    /// Partial hash length, capped at 64 KiB.
    pub fn effective_quick_hash_size(&self) -> usize {
        self.quick_hash_size.clamp(1, MAX_QUICK_HASH_SIZE)
    }
}

impl From<&ScanOptions> for DuplicateConfig {
    fn from(options: &ScanOptions) -> Self {
        Self {
            min_size: options.min_duplicate_size,
            quick_hash_size: options.effective_quick_hash_size(),
            threads: options.hash_threads,
        }
    }
}

/// Duplicate file finder.
pub struct DuplicateFinder {
    config: DuplicateConfig,
    cancel: CancellationToken,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with default config.
    pub fn new() -> Self {
        Self::with_config(DuplicateConfig::default())
    }

    /// Create a new duplicate finder with custom config.
    pub fn with_config(config: DuplicateConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Skip remaining hashing once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Find groups of byte-identical files.
    ///
    /// Files that cannot be read at hash time are dropped; they never fail
    /// the search. Members of each group are ordered oldest first.
    pub fn find_duplicates<F>(&self, files: &[FileRecord], mut on_progress: F) -> Vec<DuplicateGroup>
    where
        F: FnMut(&ScanProgress),
    {
        let pool = self.hash_pool();
        let pool = pool.as_ref();

        // Phase 1: group by size
        emit(
            &mut on_progress,
            ScanProgress::status(1, PHASES, "Grouping files by size..."),
        );
        let size_groups = group_by_size(files, self.config.min_size);
        let candidates = size_groups.iter().map(Vec::len).sum::<usize>() as u64;
        let examined = files.len() as u64;
        emit(
            &mut on_progress,
            ScanProgress::new(
                1,
                PHASES,
                examined,
                examined,
                format!(
                    "Found {} size groups with {} potential duplicates",
                    size_groups.len(),
                    candidates
                ),
            ),
        );
        debug!(
            files = files.len(),
            size_groups = size_groups.len(),
            candidates,
            "size bucketing done"
        );

        // Phase 2: partial hash
        emit(
            &mut on_progress,
            ScanProgress::status(2, PHASES, "Computing quick hashes..."),
        );
        let partial_groups = self.group_by_partial_hash(&size_groups, pool, &mut on_progress);
        let to_verify = partial_groups.iter().map(Vec::len).sum::<usize>() as u64;
        emit(
            &mut on_progress,
            ScanProgress::new(
                2,
                PHASES,
                candidates,
                candidates,
                format!("Found {} quick hash matches", partial_groups.len()),
            ),
        );

        // Phase 3: full hash
        emit(
            &mut on_progress,
            ScanProgress::status(3, PHASES, "Verifying duplicates with full hash..."),
        );
        let groups = self.group_by_full_hash(&partial_groups, pool, &mut on_progress);
        emit(
            &mut on_progress,
            ScanProgress::new(
                3,
                PHASES,
                to_verify,
                to_verify,
                format!("Found {} duplicate groups", groups.len()),
            )
            .completed(),
        );
        info!(groups = groups.len(), verified = to_verify, "duplicate detection done");

        groups
    }

    /// Build a dedicated hashing pool when a thread count is configured.
    fn hash_pool(&self) -> Option<ThreadPool> {
        if self.config.threads == 0 {
            return None;
        }
        ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .thread_name(|i| format!("reclaim-hash-{i}"))
            .build()
            .inspect_err(|err| warn!(error = %err, "falling back to global rayon pool"))
            .ok()
    }

    /// Phase 2: split size groups by the hash of their leading bytes.
    fn group_by_partial_hash<'f, F>(
        &self,
        size_groups: &[Vec<&'f FileRecord>],
        pool: Option<&ThreadPool>,
        on_progress: &mut F,
    ) -> Vec<Vec<&'f FileRecord>>
    where
        F: FnMut(&ScanProgress),
    {
        let candidates: Vec<&FileRecord> = size_groups.iter().flatten().copied().collect();
        let total = candidates.len() as u64;
        let mut groups: IndexMap<(u64, [u8; 32]), Vec<&FileRecord>> = IndexMap::new();
        let mut processed = 0u64;

        for chunk in candidates.chunks(PARTIAL_PROGRESS_INTERVAL) {
            let hashes: Vec<Result<[u8; 32], HashError>> = in_pool(pool, || {
                chunk.par_iter().map(|f| self.partial_hash(&f.path)).collect()
            });

            for (file, hash) in chunk.iter().zip(hashes) {
                match hash {
                    Ok(hash) => groups.entry((file.size, hash)).or_default().push(*file),
                    Err(err) => log_dropped(&err),
                }
            }

            processed += chunk.len() as u64;
            if processed % PARTIAL_PROGRESS_INTERVAL as u64 == 0 {
                emit(
                    on_progress,
                    ScanProgress::new(
                        2,
                        PHASES,
                        processed,
                        total,
                        format!("Quick hashing: {processed}/{total}"),
                    ),
                );
            }
        }

        groups.into_values().filter(|g| g.len() > 1).collect()
    }

    /// Phase 3: split partial-hash groups by full content hash.
    fn group_by_full_hash<F>(
        &self,
        partial_groups: &[Vec<&FileRecord>],
        pool: Option<&ThreadPool>,
        on_progress: &mut F,
    ) -> Vec<DuplicateGroup>
    where
        F: FnMut(&ScanProgress),
    {
        let candidates: Vec<(usize, &FileRecord)> = partial_groups
            .iter()
            .enumerate()
            .flat_map(|(i, group)| group.iter().map(move |f| (i, *f)))
            .collect();
        let total = candidates.len() as u64;
        let mut by_group: Vec<IndexMap<ContentHash, Vec<&FileRecord>>> =
            partial_groups.iter().map(|_| IndexMap::new()).collect();
        let mut processed = 0u64;

        for chunk in candidates.chunks(FULL_PROGRESS_INTERVAL) {
            let hashes: Vec<Result<ContentHash, HashError>> = in_pool(pool, || {
                chunk.par_iter().map(|(_, f)| self.full_hash(&f.path)).collect()
            });

            for ((group, file), hash) in chunk.iter().zip(hashes) {
                match hash {
                    Ok(hash) => by_group[*group].entry(hash).or_default().push(*file),
                    Err(err) => log_dropped(&err),
                }
            }

            processed += chunk.len() as u64;
            if processed % FULL_PROGRESS_INTERVAL as u64 == 0 {
                emit(
                    on_progress,
                    ScanProgress::new(
                        3,
                        PHASES,
                        processed,
                        total,
                        format!("Verifying: {processed}/{total}"),
                    ),
                );
            }
        }

        by_group
            .into_iter()
            .flatten()
            .filter(|(_, files)| files.len() >= 2)
            .map(|(hash, mut files)| {
                // Oldest first; stable so ties keep encounter order.
                files.sort_by_key(|f| f.timestamps.modified);
                DuplicateGroup {
                    hash,
                    size: files[0].size,
                    files: files.into_iter().map(DuplicateMember::from).collect(),
                }
            })
            .collect()
    }

    /// Hash the first `quick_hash_size` bytes of a file.
    fn partial_hash(&self, path: &Path) -> Result<[u8; 32], HashError> {
        if self.cancel.is_cancelled() {
            return Err(HashError::Cancelled);
        }

        let limit = self.config.effective_quick_hash_size();
        let file = File::open(path).map_err(|e| HashError::io(path, e))?;
        let mut head = Vec::with_capacity(limit);
        file.take(limit as u64)
            .read_to_end(&mut head)
            .map_err(|e| HashError::io(path, e))?;

        if head.is_empty() {
            return Err(HashError::Empty {
                path: path.to_path_buf(),
            });
        }

        Ok(*blake3::hash(&head).as_bytes())
    }

    /// Compute full BLAKE3 hash of a file.
    fn full_hash(&self, path: &Path) -> Result<ContentHash, HashError> {
        if self.cancel.is_cancelled() {
            return Err(HashError::Cancelled);
        }

        let file = File::open(path).map_err(|e| HashError::io(path, e))?;
        let file_size = file.metadata().map_err(|e| HashError::io(path, e))?.len();

        let mut hasher = Hasher::new();
        if file_size > MMAP_THRESHOLD {
            hasher
                .update_mmap(path)
                .map_err(|e| HashError::io(path, e))?;
        } else {
            hasher
                .update_reader(file)
                .map_err(|e| HashError::io(path, e))?;
        }

        Ok(ContentHash::new(*hasher.finalize().as_bytes()))
    }
}

impl Default for DuplicateFinder {
    fn default() -> Self {
        Self::new()
    }
}

/// Phase 1: bucket files of at least `min_size` bytes by exact size,
/// keeping only buckets with two or more members.
fn group_by_size(files: &[FileRecord], min_size: u64) -> Vec<Vec<&FileRecord>> {
    let mut groups: IndexMap<u64, Vec<&FileRecord>> = IndexMap::new();
    for file in files.iter().filter(|f| !f.is_dir && f.size >= min_size) {
        groups.entry(file.size).or_default().push(file);
    }
    groups.into_values().filter(|g| g.len() > 1).collect()
}

fn in_pool<R, OP>(pool: Option<&ThreadPool>, op: OP) -> R
where
    R: Send,
    OP: FnOnce() -> R + Send,
{
    match pool {
        Some(pool) => pool.install(op),
        None => op(),
    }
}

fn log_dropped(err: &HashError) {
    if !matches!(err, HashError::Cancelled) {
        debug!(error = %err, "dropping duplicate candidate");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reclaim_core::Timestamps;
    use std::fs;
    use std::time::{Duration, UNIX_EPOCH};
    use tempfile::TempDir;

    fn record(path: &Path, modified_secs: u64) -> FileRecord {
        let size = fs::metadata(path).unwrap().len();
        FileRecord::new(
            path,
            size,
            Timestamps::with_modified(UNIX_EPOCH + Duration::from_secs(modified_secs)),
        )
    }

    fn create_test_files() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        let content = vec![b'd'; 2000];

        fs::write(root.join("file1.bin"), &content).unwrap();
        fs::write(root.join("file2.bin"), &content).unwrap();
        fs::write(root.join("file3.bin"), vec![b'u'; 2000]).unwrap();

        temp
    }

    #[test]
    fn test_compute_full_hash() {
        let temp = create_test_files();
        let finder = DuplicateFinder::new();

        let hash1 = finder.full_hash(&temp.path().join("file1.bin")).unwrap();
        let hash2 = finder.full_hash(&temp.path().join("file2.bin")).unwrap();
        let hash3 = finder.full_hash(&temp.path().join("file3.bin")).unwrap();

        assert_eq!(hash1, hash2);
        assert_ne!(hash1, hash3);
        assert_eq!(hash1, ContentHash::new(*blake3::hash(&[b'd'; 2000]).as_bytes()));
    }

    #[test]
    fn test_partial_hash_reads_only_prefix() {
        let temp = TempDir::new().unwrap();
        let mut a = vec![b'x'; 8192];
        let mut b = a.clone();
        a[8000] = b'a';
        b[8000] = b'b';
        fs::write(temp.path().join("a"), &a).unwrap();
        fs::write(temp.path().join("b"), &b).unwrap();

        let finder = DuplicateFinder::new();
        let hash_a = finder.partial_hash(&temp.path().join("a")).unwrap();
        let hash_b = finder.partial_hash(&temp.path().join("b")).unwrap();
        assert_eq!(hash_a, hash_b);
        assert_ne!(
            finder.full_hash(&temp.path().join("a")).unwrap(),
            finder.full_hash(&temp.path().join("b")).unwrap()
        );
    }

    #[test]
    fn test_missing_file_is_a_hash_error() {
        let temp = TempDir::new().unwrap();
        let finder = DuplicateFinder::new();
        let result = finder.partial_hash(&temp.path().join("gone"));
        assert!(matches!(result, Err(HashError::Io { .. })));
    }

    #[test]
    fn test_group_by_size_drops_small_and_singletons() {
        let temp = create_test_files();
        let root = temp.path();
        fs::write(root.join("tiny1"), b"same").unwrap();
        fs::write(root.join("tiny2"), b"same").unwrap();
        fs::write(root.join("odd"), vec![0u8; 3000]).unwrap();

        let files: Vec<_> = ["file1.bin", "file2.bin", "file3.bin", "tiny1", "tiny2", "odd"]
            .iter()
            .map(|n| record(&root.join(n), 0))
            .collect();

        let groups = group_by_size(&files, MIN_DUPLICATE_SIZE);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 3);
    }

    #[test]
    fn test_members_sorted_oldest_first() {
        let temp = create_test_files();
        let root = temp.path();
        let files = vec![
            record(&root.join("file2.bin"), 200),
            record(&root.join("file1.bin"), 100),
        ];

        let groups = DuplicateFinder::new().find_duplicates(&files, |_| {});
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].files[0].path, root.join("file1.bin"));
        assert_eq!(groups[0].files[1].path, root.join("file2.bin"));
    }

    #[test]
    fn test_dedicated_pool() {
        let temp = create_test_files();
        let root = temp.path();
        let files = vec![
            record(&root.join("file1.bin"), 1),
            record(&root.join("file2.bin"), 2),
            record(&root.join("file3.bin"), 3),
        ];

        let config = DuplicateConfig::builder().threads(2usize).build().unwrap();
        let groups = DuplicateFinder::with_config(config).find_duplicates(&files, |_| {});
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].count(), 2);
    }
}
