//! Change aggregation over watched markup files.
//!
//! Turns a noisy stream of filesystem events into discrete change batches.

mod aggregator;
mod batch;
mod error;

pub use aggregator::{ChangeAggregator, DEBOUNCE_WINDOW};
pub use batch::{ChangeBatch, FileSnapshot};
pub use error::WatcherError;
