//! Watcher error types.

use std::path::PathBuf;

/// Errors that can occur during change aggregation.
///
/// Any error surfaced by the notify backend is fatal to the batch
/// sequence: it is delivered to the next pull and never retried.
#[derive(thiserror::Error, Debug)]
pub enum WatcherError {
    /// Notify watcher error.
    #[error("File watcher error: {0}")]
    Notify(#[from] notify::Error),

    /// A watch target has no parent directory that can be registered.
    #[error("Cannot watch path without an accessible parent: {0}")]
    Unwatchable(PathBuf),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_display() {
        let err: WatcherError = notify::Error::generic("boom").into();
        assert!(err.to_string().contains("File watcher error"));
    }

    #[test]
    fn test_unwatchable_display() {
        let err = WatcherError::Unwatchable(PathBuf::from("/nope/index.html"));
        assert_eq!(
            err.to_string(),
            "Cannot watch path without an accessible parent: /nope/index.html"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: WatcherError = io_err.into();
        assert!(matches!(err, WatcherError::Io(_)));
    }
}
