//! Change aggregator with notify integration.
//!
//! Wraps low-level filesystem notifications into a cancellable, pull-model
//! sequence of [`ChangeBatch`] values. Events are debounced so that editor
//! save bursts coalesce into a single batch; an un-pulled batch keeps
//! accumulating further events, and a pull always receives the most
//! up-to-date batch.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use notify_debouncer_full::{new_debouncer, notify::RecursiveMode, DebounceEventResult};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use super::batch::{ChangeBatch, FileSnapshot};
use super::error::WatcherError;

/// Quiet period that must elapse before accumulated events are delivered.
/// Long enough to absorb a save burst, short enough to feel instantaneous.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(120);

/// How often the bridge thread re-checks for cancellation.
const BRIDGE_POLL: Duration = Duration::from_millis(100);

/// Shared slot holding the single in-progress batch.
///
/// The notify side only ever merges into `pending` under the lock; the
/// consumer takes ownership of the whole batch on pull, so a delivered
/// batch is never mutated afterwards.
#[derive(Default)]
struct SlotState {
    pending: ChangeBatch,
    ready: bool,
    done: bool,
    error: Option<WatcherError>,
}

struct BatchSlot {
    state: Mutex<SlotState>,
    wakeup: Notify,
}

impl BatchSlot {
    fn lock(&self) -> std::sync::MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Debounced, crash-resistant aggregator over a set of watched file paths.
///
/// In persistent mode the sequence runs until [`close`](Self::close) is
/// called or the notify backend fails. In run-once mode the sequence
/// delivers the initial-scan batch (or nothing, if no target exists) and
/// terminates without registering any watch handles.
pub struct ChangeAggregator {
    slot: Arc<BatchSlot>,
    cancel: CancellationToken,
    bridge: Option<thread::JoinHandle<()>>,
}

impl ChangeAggregator {
    /// Start aggregating changes for the given target files.
    ///
    /// Every existing target is reported in the first batch (the initial
    /// scan), which fires even in run-once mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the notify watcher cannot be created or a
    /// target's parent directory cannot be registered.
    pub fn watch(targets: Vec<PathBuf>, persistent: bool) -> Result<Self, WatcherError> {
        let targets: HashSet<PathBuf> = targets.iter().map(|p| absolutize(p)).collect();

        let mut initial = ChangeBatch::new();
        for target in &targets {
            if let Some(snapshot) = FileSnapshot::probe(target) {
                initial.insert(target.clone(), Some(snapshot));
            }
        }

        let slot = Arc::new(BatchSlot {
            state: Mutex::new(SlotState {
                ready: !initial.is_empty(),
                done: !persistent,
                pending: initial,
                error: None,
            }),
            wakeup: Notify::new(),
        });

        if !persistent {
            return Ok(Self {
                slot,
                cancel: CancellationToken::new(),
                bridge: None,
            });
        }

        let (notify_tx, notify_rx) = std_mpsc::channel();
        let mut debouncer = new_debouncer(DEBOUNCE_WINDOW, None, move |result| {
            let _ = notify_tx.send(result);
        })?;

        // Watch each target's parent so deletions and re-creations of the
        // target itself are still observed.
        let mut watched_dirs = HashSet::new();
        for target in &targets {
            let parent = target
                .parent()
                .filter(|p| p.is_dir())
                .ok_or_else(|| WatcherError::Unwatchable(target.clone()))?;
            if watched_dirs.insert(parent.to_path_buf()) {
                debouncer.watch(parent, RecursiveMode::NonRecursive)?;
            }
        }

        let cancel = CancellationToken::new();
        let bridge_cancel = cancel.clone();
        let bridge_slot = Arc::clone(&slot);

        // Bridge thread: serializes notify-side merges into the pending
        // batch and wakes the consumer.
        let bridge = thread::spawn(move || {
            loop {
                if bridge_cancel.is_cancelled() {
                    break;
                }
                match notify_rx.recv_timeout(BRIDGE_POLL) {
                    Ok(result) => {
                        Self::merge_debounce_result(result, &targets, &bridge_slot);
                    }
                    Err(std_mpsc::RecvTimeoutError::Timeout) => {}
                    Err(std_mpsc::RecvTimeoutError::Disconnected) => break,
                }
            }

            // Stops the underlying watcher before the sequence completes.
            drop(debouncer);

            let mut state = bridge_slot.lock();
            state.done = true;
            drop(state);
            bridge_slot.wakeup.notify_one();
        });

        Ok(Self {
            slot,
            cancel,
            bridge: Some(bridge),
        })
    }

    /// Pull the next change batch.
    ///
    /// Suspends until a debounce window elapses with accumulated events.
    /// Returns `None` when the sequence has terminated (run-once mode
    /// exhausted, or the aggregator was closed). A backend failure is
    /// returned as `Some(Err(_))` exactly once; the sequence is terminated
    /// afterwards.
    pub async fn next(&mut self) -> Option<Result<ChangeBatch, WatcherError>> {
        loop {
            {
                let mut state = self.slot.lock();
                if let Some(err) = state.error.take() {
                    state.done = true;
                    return Some(Err(err));
                }
                if state.ready {
                    state.ready = false;
                    if !state.pending.is_empty() {
                        return Some(Ok(std::mem::take(&mut state.pending)));
                    }
                }
                if state.done {
                    if state.pending.is_empty() {
                        return None;
                    }
                    return Some(Ok(std::mem::take(&mut state.pending)));
                }
            }
            self.slot.wakeup.notified().await;
        }
    }

    /// Cancel the aggregation and stop the underlying watcher.
    ///
    /// Joins the bridge thread, so no watch handles remain once this
    /// returns.
    pub async fn close(&mut self) {
        self.cancel.cancel();
        self.slot.wakeup.notify_one();
        if let Some(handle) = self.bridge.take() {
            let _ = tokio::task::spawn_blocking(move || handle.join()).await;
        }
    }

    fn merge_debounce_result(
        result: DebounceEventResult,
        targets: &HashSet<PathBuf>,
        slot: &BatchSlot,
    ) {
        match result {
            Ok(events) => {
                let mut touched = Vec::new();
                for event in &events {
                    for path in &event.paths {
                        if targets.contains(path) {
                            touched.push(path.clone());
                        }
                    }
                }
                if touched.is_empty() {
                    return;
                }

                let mut state = slot.lock();
                for path in touched {
                    // Re-probe rather than trusting the event kind: the net
                    // effect is whatever is on disk after the quiet period.
                    let snapshot = FileSnapshot::probe(&path);
                    state.pending.insert(path, snapshot);
                }
                state.ready = true;
                drop(state);
                slot.wakeup.notify_one();
            }
            Err(mut errors) => {
                if errors.is_empty() {
                    return;
                }
                let mut state = slot.lock();
                if state.error.is_none() {
                    state.error = Some(WatcherError::Notify(errors.remove(0)));
                }
                drop(state);
                slot.wakeup.notify_one();
            }
        }
    }
}

impl Drop for ChangeAggregator {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn absolutize(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn pull(
        aggregator: &mut ChangeAggregator,
    ) -> Option<Result<ChangeBatch, WatcherError>> {
        tokio::time::timeout(Duration::from_secs(3), aggregator.next())
            .await
            .expect("timed out waiting for batch")
    }

    #[tokio::test]
    async fn test_run_once_delivers_initial_scan_then_ends() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.html");
        let b = dir.path().join("b.html");
        std::fs::write(&a, "<html>a</html>").unwrap();
        std::fs::write(&b, "<html>b</html>").unwrap();

        let mut aggregator =
            ChangeAggregator::watch(vec![a.clone(), b.clone()], false).unwrap();

        let batch = pull(&mut aggregator).await.unwrap().unwrap();
        assert_eq!(batch.len(), 2);
        assert!(batch.values().all(Option::is_some));

        assert!(pull(&mut aggregator).await.is_none());
    }

    #[tokio::test]
    async fn test_run_once_with_no_matching_files() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.html");

        let mut aggregator = ChangeAggregator::watch(vec![missing], false).unwrap();
        assert!(pull(&mut aggregator).await.is_none());
    }

    #[tokio::test]
    async fn test_persistent_coalesces_changes_into_one_batch() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("page.html");
        std::fs::write(&file, "<html>v1</html>").unwrap();

        let mut aggregator = match ChangeAggregator::watch(vec![file.clone()], true) {
            Ok(a) => a,
            Err(WatcherError::Notify(e)) => {
                // Skip when the system watch limit is exhausted.
                eprintln!("Skipping test due to system limit: {e}");
                return;
            }
            Err(e) => panic!("Unexpected error: {e}"),
        };

        // Initial scan batch.
        let first = pull(&mut aggregator).await.unwrap().unwrap();
        assert_eq!(first.len(), 1);

        // A burst of writes within the debounce window lands as one batch.
        std::fs::write(&file, "<html>v2</html>").unwrap();
        std::fs::write(&file, "<html>v3 longer</html>").unwrap();

        let second = pull(&mut aggregator).await.unwrap().unwrap();
        assert_eq!(second.len(), 1);
        let snapshot = second.get(&absolutize(&file)).unwrap().as_ref().unwrap();
        assert_eq!(snapshot.size, "<html>v3 longer</html>".len() as u64);

        aggregator.close().await;
    }

    #[tokio::test]
    async fn test_deletion_reported_as_absent_snapshot() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("page.html");
        std::fs::write(&file, "<html></html>").unwrap();

        let mut aggregator = match ChangeAggregator::watch(vec![file.clone()], true) {
            Ok(a) => a,
            Err(WatcherError::Notify(e)) => {
                eprintln!("Skipping test due to system limit: {e}");
                return;
            }
            Err(e) => panic!("Unexpected error: {e}"),
        };

        let _initial = pull(&mut aggregator).await.unwrap().unwrap();

        std::fs::remove_file(&file).unwrap();

        let batch = pull(&mut aggregator).await.unwrap().unwrap();
        assert!(batch.get(&absolutize(&file)).unwrap().is_none());

        aggregator.close().await;
    }

    #[tokio::test]
    async fn test_close_terminates_sequence() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("page.html");
        std::fs::write(&file, "<html></html>").unwrap();

        let mut aggregator = match ChangeAggregator::watch(vec![file], true) {
            Ok(a) => a,
            Err(WatcherError::Notify(e)) => {
                eprintln!("Skipping test due to system limit: {e}");
                return;
            }
            Err(e) => panic!("Unexpected error: {e}"),
        };

        let _initial = pull(&mut aggregator).await.unwrap().unwrap();
        aggregator.close().await;
        assert!(pull(&mut aggregator).await.is_none());
    }
}
