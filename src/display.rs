//! Colored CLI progress output.
//!
//! User-facing progress lines for the build pipeline; diagnostic detail
//! goes through `tracing` instead.

use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use owo_colors::OwoColorize;

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

fn ms(elapsed: Duration) -> String {
    format!("{} ms", elapsed.as_millis())
}

fn flush() {
    let _ = io::stdout().flush();
}

/// Announce the start of a batch cycle.
pub fn print_processing(files: usize, watch_mode: bool) {
    let changed = if watch_mode { " changed" } else { "" };
    println!(
        "{}",
        format!("Processing {}{changed} file{}", files.bold(), plural(files)).cyan()
    );
    flush();
}

/// Report the extraction phase of a cycle.
pub fn print_extracted(candidates: usize, files: usize, elapsed: Duration) {
    println!(
        "{}",
        format!(
            "Extracted {} candidate{} from {files} file{} in {}",
            candidates.bold(),
            plural(candidates),
            plural(files),
            ms(elapsed).bold()
        )
        .dimmed()
    );
    flush();
}

/// Report a completed generation pass.
pub fn print_generated(rules: usize, elapsed: Duration) {
    println!(
        "{}",
        format!(
            "Generated {} CSS rule{} in {}",
            rules.bold(),
            plural(rules),
            ms(elapsed).bold()
        )
        .dimmed()
    );
    flush();
}

/// Report a written artifact.
pub fn print_finished(output: &Path, elapsed: Duration) {
    println!(
        "{}",
        format!(
            "Finished {} in {}",
            output.display().bold(),
            ms(elapsed).bold()
        )
        .green()
    );
    flush();
}

/// Report a skipped cycle.
pub fn print_skipped() {
    println!(
        "{}",
        "No new classes detected - skipped generating CSS"
            .green()
            .dimmed()
    );
    flush();
}

/// Announce that the watcher is idle.
pub fn print_waiting() {
    println!("\n{}", "Waiting for file changes...".dimmed());
    flush();
}

/// Warn about a token the engine could not recognize. Printed once per
/// token; the ledger silences repeats.
pub fn print_unknown_token(token: &str) {
    println!("{}", format!("Unknown rule: {token}").yellow());
    flush();
}

/// Report a loaded (or reloaded) configuration file.
pub fn print_config_loaded(path: &Path, elapsed: Duration) {
    println!(
        "{}",
        format!(
            "Loaded configuration from {} in {}",
            path.display().bold(),
            ms(elapsed).bold()
        )
        .green()
    );
    flush();
}

/// Report that no input file ever matched. Informational, not an error.
pub fn print_no_matching_files() {
    println!("{}", "No matching files found...".yellow());
    flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plural() {
        assert_eq!(plural(1), "");
        assert_eq!(plural(0), "s");
        assert_eq!(plural(2), "s");
    }

    #[test]
    fn test_ms_format() {
        assert_eq!(ms(Duration::from_millis(42)), "42 ms");
    }
}
