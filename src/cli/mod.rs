//! CLI module for the Konig test harness
//!
//! ## Usage
//!
//! ```text
//! konig-test [OPTIONS]
//! ```
//!
//! Runs every `test/*.ko` case through compile → execute → compare and prints
//! a summary. The process exits 0 when every case passed, 1 when any failed
//! and 2 when the run could not start.
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::env;
use std::fmt;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::Parser;

use crate::harness::{ConsoleReporter, HarnessConfig, HarnessError, SystemRunner, run_suite};
use crate::version::HARNESS_VERSION;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    /// One or more test cases failed
    pub const FAILURE: ExitCode = ExitCode(1);
    /// The run could not start
    pub const ERROR: ExitCode = ExitCode(2);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }

    /// Render a harness error as a diagnostic that stops the run (exit code 2).
    pub fn fatal(err: HarnessError) -> Self {
        Self::new(format!("{:?}", miette::Report::new(err)), ExitCode::ERROR)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Compile, run and diff every Konig test case
#[derive(Parser, Debug)]
#[command(name = "konig-test")]
#[command(version = HARNESS_VERSION)]
#[command(about = "Compile, run and diff every Konig test case", long_about = None)]
pub struct Cli {
    /// Change to this directory before doing anything else
    #[arg(short = 'C', long = "directory", value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Directory holding the .ko sources and .res expectations
    #[arg(long, value_name = "DIR", default_value = "test")]
    pub test_dir: PathBuf,

    /// Compiler invoked with each source path
    #[arg(long, value_name = "PROGRAM", default_value = "./compile.sh")]
    pub compiler: PathBuf,

    /// Comparator invoked with the captured and expected output paths
    #[arg(long, value_name = "PROGRAM", default_value = "diff")]
    pub comparator: PathBuf,

    /// Kill any stage running longer than this many seconds
    #[arg(long, value_name = "SECONDS", value_parser = parse_timeout)]
    pub timeout: Option<Duration>,

    /// Only run tests whose name contains this substring
    #[arg(short = 'k', value_name = "EXPR")]
    pub filter: Option<String>,

    /// Show stage statuses and comparator output for failures
    #[arg(short, long)]
    pub verbose: bool,

    /// Leave compiled artifacts and captured output in place
    #[arg(long)]
    pub keep_artifacts: bool,

    /// Never color output
    #[arg(long)]
    pub no_color: bool,
}

impl Cli {
    /// Build the harness configuration from the parsed arguments.
    pub fn harness_config(&self) -> HarnessConfig {
        HarnessConfig::new()
            .with_test_dir(&self.test_dir)
            .with_compiler(&self.compiler)
            .with_comparator(&self.comparator)
            .with_timeout(self.timeout)
            .with_filter(self.filter.clone())
            .with_keep_artifacts(self.keep_artifacts)
    }
}

fn parse_timeout(raw: &str) -> Result<Duration, String> {
    let secs: f64 = raw.parse().map_err(|_| format!("'{raw}' is not a number of seconds"))?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err("timeout must be a positive number of seconds".to_string());
    }
    Duration::try_from_secs_f64(secs).map_err(|e| e.to_string())
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    // clap exits with status 2 on usage errors, matching ExitCode::ERROR
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the parsed command line and return the exit code.
pub fn execute(cli: Cli) -> CliResult<ExitCode> {
    if let Some(dir) = &cli.directory {
        env::set_current_dir(dir).map_err(|e| {
            CliError::new(
                format!("Cannot change to directory '{}': {}", dir.display(), e),
                ExitCode::ERROR,
            )
        })?;
    }

    let config = cli.harness_config();
    let color = !cli.no_color && io::stdout().is_terminal();
    let mut reporter = ConsoleReporter::stdout(color, cli.verbose);

    let summary = run_suite(&config, &SystemRunner, &mut reporter).map_err(run_error)?;

    if summary.all_passed() {
        Ok(ExitCode::SUCCESS)
    } else {
        // Summary already printed
        Err(CliError::new("", ExitCode::FAILURE))
    }
}

/// Map a run that did not complete to exit code 2.
///
/// A lost report is as incomplete as a run that never started, so neither
/// reuses the "tests failed" code.
fn run_error(err: HarnessError) -> CliError {
    match err {
        HarnessError::Report(io) => CliError::new(format!("Error writing report: {io}"), ExitCode::ERROR),
        other => CliError::fatal(other),
    }
}

// ============================================================================
// Tests
// ============================================================================
