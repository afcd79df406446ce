//! classweave - incremental CSS generation for watched markup files.

pub mod config;
pub mod display;
pub mod engine;
pub mod extract;
pub mod pipeline;
pub mod watcher;
