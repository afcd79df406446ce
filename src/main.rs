//! classweave - incremental CSS generation for watched markup files.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use classweave::display;
use classweave::pipeline::{Orchestrator, RunOptions, RunOutcome};

#[derive(Parser)]
#[command(
    name = "classweave",
    about = "Incremental CSS generator that watches markup files for class changes",
    version
)]
struct Cli {
    /// Markup files to watch. The first one is the template the
    /// generated stylesheet is injected into.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output artifact path.
    #[arg(short, long, default_value = "output.html")]
    output: PathBuf,

    /// Config file path (default {.,src,pages,docs}/classweave.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Keep watching for changes after the initial build.
    #[arg(short, long)]
    watch: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let options = RunOptions {
        inputs: cli.inputs,
        output: cli.output,
        config: cli.config,
        watch: cli.watch,
    };

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_cancel.cancel();
        }
    });

    match Orchestrator::with_rule_engine(options).run(cancel).await {
        Ok(RunOutcome::NoMatchingFiles) => {
            display::print_no_matching_files();
            ExitCode::SUCCESS
        }
        Ok(RunOutcome::Completed { runs }) => {
            tracing::debug!(runs, "Pipeline completed");
            ExitCode::SUCCESS
        }
        Ok(RunOutcome::Cancelled) => {
            tracing::info!("Cancelled, shutting down");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
