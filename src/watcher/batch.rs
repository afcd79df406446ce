//! Change batch types.
//!
//! A [`ChangeBatch`] is the coalesced net effect of all filesystem events
//! observed within one debounce window: for every touched path, either the
//! latest on-disk snapshot or `None` when the path ended up deleted.

use std::collections::BTreeMap;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Identity fingerprint of a file at a point in time.
///
/// Used purely for change detection, never for content. Replaced wholesale
/// on every observed change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSnapshot {
    /// File size in bytes.
    pub size: u64,
    /// Last modification time.
    pub mtime: SystemTime,
    /// Inode number, or 0 on platforms without one.
    pub ino: u64,
}

impl FileSnapshot {
    /// Build a snapshot from filesystem metadata.
    #[must_use]
    pub fn from_metadata(metadata: &Metadata) -> Self {
        Self {
            size: metadata.len(),
            mtime: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            ino: inode(metadata),
        }
    }

    /// Stat a path, returning `None` if it does not exist (or is not a file).
    #[must_use]
    pub fn probe(path: &Path) -> Option<Self> {
        let metadata = std::fs::metadata(path).ok()?;
        if metadata.is_file() {
            Some(Self::from_metadata(&metadata))
        } else {
            None
        }
    }
}

#[cfg(unix)]
fn inode(metadata: &Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    metadata.ino()
}

#[cfg(not(unix))]
fn inode(_metadata: &Metadata) -> u64 {
    0
}

/// Ordered mapping from watched path to its latest snapshot, or `None` for
/// a deletion. Consumed exactly once by the orchestrator.
///
/// Later insertions for the same path replace earlier ones, so a batch
/// always carries the net effect per path.
pub type ChangeBatch = BTreeMap<PathBuf, Option<FileSnapshot>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_missing_path() {
        assert!(FileSnapshot::probe(Path::new("/definitely/not/here.html")).is_none());
    }

    #[test]
    fn test_probe_directory_is_none() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(FileSnapshot::probe(dir.path()).is_none());
    }

    #[test]
    fn test_probe_reflects_size() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("page.html");
        std::fs::write(&file, "<html></html>").unwrap();

        let snap = FileSnapshot::probe(&file).unwrap();
        assert_eq!(snap.size, 13);
    }

    #[test]
    fn test_batch_keeps_net_effect_per_path() {
        let mut batch = ChangeBatch::new();
        let path = PathBuf::from("/tmp/page.html");

        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("f");
        std::fs::write(&file, "x").unwrap();
        let snap = FileSnapshot::probe(&file).unwrap();

        batch.insert(path.clone(), Some(snap));
        batch.insert(path.clone(), None);

        assert_eq!(batch.len(), 1);
        assert!(batch.get(&path).unwrap().is_none());
    }
}
