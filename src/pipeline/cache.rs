//! Per-file extraction cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::watcher::FileSnapshot;

/// Memo of the last-seen identity fingerprint per watched file.
///
/// Some watch backends fire notifications without an actual content
/// change; the cache filters those out so extraction only runs when
/// size, mtime or inode actually drifted.
#[derive(Debug, Default)]
pub struct ExtractionCache {
    snapshots: HashMap<PathBuf, FileSnapshot>,
}

impl ExtractionCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a file needs re-extraction for the given snapshot.
    ///
    /// True iff no prior snapshot exists or any of size, mtime or inode
    /// differs from the stored one.
    #[must_use]
    pub fn should_process(&self, path: &Path, snapshot: &FileSnapshot) -> bool {
        match self.snapshots.get(path) {
            Some(stored) => {
                stored.size != snapshot.size
                    || stored.mtime != snapshot.mtime
                    || stored.ino != snapshot.ino
            }
            None => true,
        }
    }

    /// Store the snapshot after a successful extraction.
    pub fn record(&mut self, path: PathBuf, snapshot: FileSnapshot) {
        self.snapshots.insert(path, snapshot);
    }

    /// Drop a deleted file's entry. Returns whether it was present.
    pub fn remove(&mut self, path: &Path) -> bool {
        self.snapshots.remove(path).is_some()
    }

    /// Number of files currently tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether the cache tracks no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    fn snapshot(size: u64, mtime_offset: u64, ino: u64) -> FileSnapshot {
        FileSnapshot {
            size,
            mtime: SystemTime::UNIX_EPOCH + Duration::from_secs(mtime_offset),
            ino,
        }
    }

    #[test]
    fn test_unseen_file_is_processed() {
        let cache = ExtractionCache::new();
        assert!(cache.should_process(Path::new("/p/a.html"), &snapshot(1, 1, 1)));
    }

    #[test]
    fn test_identical_snapshot_is_not_reprocessed() {
        let mut cache = ExtractionCache::new();
        let path = PathBuf::from("/p/a.html");
        cache.record(path.clone(), snapshot(10, 5, 42));

        assert!(!cache.should_process(&path, &snapshot(10, 5, 42)));
    }

    #[test]
    fn test_any_fingerprint_drift_triggers_processing() {
        let mut cache = ExtractionCache::new();
        let path = PathBuf::from("/p/a.html");
        cache.record(path.clone(), snapshot(10, 5, 42));

        assert!(cache.should_process(&path, &snapshot(11, 5, 42)));
        assert!(cache.should_process(&path, &snapshot(10, 6, 42)));
        assert!(cache.should_process(&path, &snapshot(10, 5, 43)));
    }

    #[test]
    fn test_remove_reports_presence() {
        let mut cache = ExtractionCache::new();
        let path = PathBuf::from("/p/a.html");
        cache.record(path.clone(), snapshot(1, 1, 1));

        assert!(cache.remove(&path));
        assert!(!cache.remove(&path));
        assert!(cache.is_empty());
    }
}
