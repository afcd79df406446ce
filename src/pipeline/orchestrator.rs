//! Build orchestration loop.
//!
//! Consumes change batches from the aggregator, drives the extraction
//! cache and candidate differ, hot-reloads configuration, invokes the
//! generation engine and writes the artifact when a cycle warrants it.
//! Batches are processed strictly in arrival order; no batch starts
//! before the previous write or skip completes.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Instant;

use futures_util::future::join_all;
use tokio_util::sync::CancellationToken;

use crate::config::{ConfigLoader, ProjectConfig};
use crate::display;
use crate::engine::{GenerationEngine, RuleEngine, TokenReport};
use crate::extract;
use crate::watcher::{ChangeAggregator, ChangeBatch, FileSnapshot, WatcherError};

use super::cache::ExtractionCache;
use super::differ::{self, RebuildDecision};
use super::output;

/// Builds a fresh engine from the current configuration. Invoked on
/// startup and again on every config reload.
pub type EngineFactory = Box<dyn Fn(&ProjectConfig) -> Box<dyn GenerationEngine> + Send + Sync>;

/// Options for a pipeline run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Source files to watch. The first one is the designated template
    /// whose content receives the generated stylesheet.
    pub inputs: Vec<PathBuf>,
    /// Artifact output path.
    pub output: PathBuf,
    /// Explicit config file path; searched for when absent.
    pub config: Option<PathBuf>,
    /// Keep watching after the initial build.
    pub watch: bool,
}

/// How a pipeline run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// At least one batch was processed.
    Completed {
        /// Number of processed batches.
        runs: u64,
    },
    /// The sequence ended without any input file ever matching.
    NoMatchingFiles,
    /// The run was cancelled from outside.
    Cancelled,
}

/// Fatal pipeline errors.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    /// The watch backend failed; the sequence cannot continue.
    #[error(transparent)]
    Watcher(#[from] WatcherError),

    /// An extraction task panicked or was aborted.
    #[error("Extraction task failed: {0}")]
    Extraction(#[from] tokio::task::JoinError),

    /// The artifact could not be written.
    #[error("Failed to write artifact {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn placeholder_set() -> HashSet<String> {
    // The empty placeholder keeps "zero real tokens" distinguishable so
    // an empty generation still produces an artifact.
    HashSet::from([String::new()])
}

fn absolutize(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// The incremental build orchestrator.
///
/// Owns all mutable pipeline state: the extraction cache, per-file
/// candidates, the previous candidate set, the unknown-token ledger and
/// the engine instance. Everything is mutated only from the run loop.
pub struct Orchestrator {
    inputs: Vec<PathBuf>,
    output: PathBuf,
    watch_mode: bool,
    config_file: Option<PathBuf>,
    config: ProjectConfig,
    engine_factory: EngineFactory,
    engine: Box<dyn GenerationEngine>,
    cache: ExtractionCache,
    candidates_by_file: HashMap<PathBuf, Vec<String>>,
    last_candidates: HashSet<String>,
    unknown_tokens: HashSet<String>,
    /// Starts below zero: no batch has been processed yet.
    run_count: i64,
    /// First input path; its content is always the rewritten template.
    template_path: Option<PathBuf>,
    template_content: Option<String>,
}

impl Orchestrator {
    /// Create an orchestrator with a custom engine factory.
    #[must_use]
    pub fn new(options: RunOptions, engine_factory: EngineFactory) -> Self {
        let inputs: Vec<PathBuf> = options.inputs.iter().map(|p| absolutize(p)).collect();
        let config_file = options
            .config
            .as_ref()
            .map(|p| absolutize(p))
            .or_else(|| ConfigLoader::new().find_config_file());

        let config = match &config_file {
            Some(path) => {
                let started = Instant::now();
                let config = ConfigLoader::load_or_default(path);
                display::print_config_loaded(path, started.elapsed());
                config
            }
            None => ProjectConfig::default(),
        };

        let engine = (engine_factory)(&config);
        let template_path = inputs.first().cloned();

        Self {
            inputs,
            output: options.output,
            watch_mode: options.watch,
            config_file,
            config,
            engine_factory,
            engine,
            cache: ExtractionCache::new(),
            candidates_by_file: HashMap::new(),
            last_candidates: placeholder_set(),
            unknown_tokens: HashSet::new(),
            run_count: -1,
            template_path,
            template_content: None,
        }
    }

    /// Create an orchestrator backed by the built-in [`RuleEngine`].
    #[must_use]
    pub fn with_rule_engine(options: RunOptions) -> Self {
        Self::new(
            options,
            Box::new(|config| Box::new(RuleEngine::new(config)) as Box<dyn GenerationEngine>),
        )
    }

    /// Run the pipeline until the batch sequence ends or `cancel` fires.
    ///
    /// # Errors
    ///
    /// Propagates watch-backend failures, extraction task failures and
    /// artifact write failures; all are fatal.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<RunOutcome, PipelineError> {
        let mut targets = self.inputs.clone();
        if let Some(config_file) = &self.config_file {
            targets.push(config_file.clone());
        }

        let mut aggregator = ChangeAggregator::watch(targets, self.watch_mode)?;

        loop {
            let pulled = tokio::select! {
                () = cancel.cancelled() => {
                    aggregator.close().await;
                    return Ok(RunOutcome::Cancelled);
                }
                pulled = aggregator.next() => pulled,
            };

            match pulled {
                None => break,
                Some(Err(err)) => {
                    aggregator.close().await;
                    return Err(err.into());
                }
                Some(Ok(batch)) => {
                    self.process_batch(batch, &cancel).await?;
                    if cancel.is_cancelled() {
                        aggregator.close().await;
                        return Ok(RunOutcome::Cancelled);
                    }
                    if self.watch_mode {
                        display::print_waiting();
                    }
                }
            }
        }

        if self.run_count < 0 {
            Ok(RunOutcome::NoMatchingFiles)
        } else {
            Ok(RunOutcome::Completed {
                runs: u64::try_from(self.run_count + 1).unwrap_or_default(),
            })
        }
    }

    async fn process_batch(
        &mut self,
        batch: ChangeBatch,
        cancel: &CancellationToken,
    ) -> Result<(), PipelineError> {
        self.run_count += 1;
        display::print_processing(batch.len(), self.watch_mode);
        let started = Instant::now();

        // The first processed batch always generates; the config was just
        // loaded, so its presence in this batch is not a change.
        let mut forced = self.run_count == 0;
        let mut to_extract: Vec<(PathBuf, FileSnapshot)> = Vec::new();

        // Config reload is evaluated before any candidate rebuilding so
        // the new configuration governs this cycle's interpretation.
        for (path, snapshot) in batch {
            if self.config_file.as_deref() == Some(path.as_path()) {
                if self.run_count > 0 {
                    self.reload_config();
                    forced = true;
                }
                continue;
            }
            match snapshot {
                Some(snapshot) => {
                    if self.cache.should_process(&path, &snapshot) {
                        to_extract.push((path, snapshot));
                    }
                }
                None => {
                    // Deletion is conservatively change-forcing even when
                    // the union set stays identical.
                    self.cache.remove(&path);
                    self.candidates_by_file.remove(&path);
                    forced = true;
                }
            }
        }

        // Fan out extraction of independent files, join before touching
        // any pipeline state.
        let tasks: Vec<_> = to_extract
            .iter()
            .map(|(path, _)| {
                let path = path.clone();
                tokio::spawn(async move { extract::extract_file(&path).await })
            })
            .collect();
        let results = join_all(tasks).await;

        if cancel.is_cancelled() {
            // In-flight work completed; its results are discarded.
            return Ok(());
        }

        let mut has_new_token = false;
        for ((path, snapshot), result) in to_extract.into_iter().zip(results) {
            let extraction = result?;
            self.cache.record(path.clone(), snapshot);
            if self.template_path.as_deref() == Some(path.as_path()) {
                self.template_content = Some(extraction.content);
            }
            if !has_new_token {
                has_new_token = extraction
                    .tokens
                    .iter()
                    .any(|token| !self.last_candidates.contains(token));
            }
            self.candidates_by_file.insert(path, extraction.tokens);
        }

        // Rebuild the candidate set from scratch; incremental patching
        // leaks stale tokens when a file's set shrinks.
        let mut next_candidates = placeholder_set();
        for tokens in self.candidates_by_file.values() {
            for token in tokens {
                next_candidates.insert(token.clone());
            }
        }

        display::print_extracted(
            next_candidates.len() - 1,
            self.candidates_by_file.len(),
            started.elapsed(),
        );

        let decision = RebuildDecision {
            forced: forced || has_new_token,
            sets_differ: differ::sets_differ(&self.last_candidates, &next_candidates),
        };

        if decision.should_generate() {
            let generation_started = Instant::now();
            let joined = self.joined_candidates(&next_candidates);
            self.engine.reset();
            let generated = self.engine.generate(&joined);

            for report in &generated.reports {
                if let TokenReport::UnknownDirective(token) = report {
                    // Warned once; the ledger excludes it from later runs
                    // until a config reload clears it.
                    if self.unknown_tokens.insert(token.clone()) {
                        display::print_unknown_token(token);
                    }
                }
            }
            display::print_generated(generated.rule_count, generation_started.elapsed());
            self.last_candidates = next_candidates;

            if cancel.is_cancelled() {
                return Ok(());
            }
            self.write_artifact(&generated.css, started).await?;
        } else {
            self.last_candidates = next_candidates;
            display::print_skipped();
        }

        Ok(())
    }

    async fn write_artifact(&self, css: &str, started: Instant) -> Result<(), PipelineError> {
        let Some(template) = &self.template_content else {
            tracing::warn!(
                output = %self.output.display(),
                "No template content extracted yet, skipping artifact write"
            );
            return Ok(());
        };

        let merged = output::splice(template, &self.config.marker, css);
        let minified = output::collapse_whitespace(&merged);
        output::write_artifact(&self.output, &minified)
            .await
            .map_err(|source| PipelineError::Write {
                path: self.output.clone(),
                source,
            })?;
        display::print_finished(&self.output, started.elapsed());
        Ok(())
    }

    /// Sorted, space-joined candidates with ledger tokens excluded.
    fn joined_candidates(&self, candidates: &HashSet<String>) -> String {
        let mut tokens: Vec<&str> = candidates
            .iter()
            .map(String::as_str)
            .filter(|token| !token.is_empty() && !self.unknown_tokens.contains(*token))
            .collect();
        tokens.sort_unstable();
        tokens.join(" ")
    }

    fn reload_config(&mut self) {
        if let Some(path) = &self.config_file {
            let started = Instant::now();
            self.config = ConfigLoader::load_or_default(path);
            display::print_config_loaded(path, started.elapsed());
        }
        self.unknown_tokens.clear();
        self.last_candidates = placeholder_set();
        self.engine = (self.engine_factory)(&self.config);
    }

    /// Path of the designated template file, if any input was given.
    #[must_use]
    pub fn template_path(&self) -> Option<&Path> {
        self.template_path.as_deref()
    }
}
