//! Incremental build pipeline.

mod cache;
mod differ;
mod orchestrator;
mod output;

pub use cache::ExtractionCache;
pub use differ::{sets_differ, RebuildDecision};
pub use orchestrator::{EngineFactory, Orchestrator, PipelineError, RunOptions, RunOutcome};
pub use output::{collapse_whitespace, splice, write_artifact};
