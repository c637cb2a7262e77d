//! Golden-file test harness for the Konig compiler
//!
//! Each test case is a `test/<name>.ko` source file paired with a
//! `test/<name>.res` expectation. Running a case is a fixed three-stage
//! pipeline of external processes:
//!
//! 1. compile: `./compile.sh test/<name>.ko` (stdout discarded, leaves `<name>.out`)
//! 2. execute: `./<name>.out > test/<name>.txt`
//! 3. compare: `diff test/<name>.txt test/<name>.res` (stdout captured)
//!
//! A case passes only when every stage exits with status zero and the
//! comparator printed nothing.
//!
//! ## Modules
//!
//! - `config` - Layout, tool commands and run options
//! - `discovery` - Test case enumeration
//! - `process` - The process invocation boundary (`ProcessRunner`)
//! - `pipeline` - The compile/execute/compare sequence for one case
//! - `verdict` - PASS/FAIL classification and the run summary
//! - `report` - Progress and summary output (`Reporter`)
//! - `runner` - The orchestration loop and artifact cleanup
//!
//! ## Errors
//!
//! Only discovery failures abort a run. Anything that goes wrong inside a
//! single case (a stage that cannot be launched, a non-zero status, a diff)
//! becomes a FAIL for that case and the loop moves on.

use std::io;
use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

pub mod config;
pub mod discovery;
pub mod pipeline;
pub mod process;
pub mod report;
pub mod runner;
pub mod verdict;

pub use config::HarnessConfig;
pub use discovery::{TestCase, discover_tests};
pub use pipeline::{CaseRun, Pipeline};
pub use process::{Invocation, ProcessRunner, Stage, StageResult, StageStatus, StdoutTarget, SystemRunner};
pub use report::{ConsoleReporter, Reporter};
pub use runner::{remove_artifacts, run_suite};
pub use verdict::{FailureReason, RunSummary, Verdict, judge};

/// Errors raised by the harness library.
///
/// `Discovery` is fatal for a run. `Launch`, `Capture` and `Wait` are raised by
/// a [`ProcessRunner`] and contained by the pipeline, which turns them into a
/// failed stage.
#[derive(Debug, Error, Diagnostic)]
pub enum HarnessError {
    #[error("cannot read test directory '{}'", .path.display())]
    #[diagnostic(
        code(konig::discovery),
        help("run the harness from the directory that contains `test/`, or pass --test-dir")
    )]
    Discovery {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to launch {stage} stage '{}'", .program.display())]
    #[diagnostic(code(konig::launch))]
    Launch {
        stage: Stage,
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot create capture file '{}'", .path.display())]
    #[diagnostic(code(konig::capture))]
    Capture {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed waiting for {stage} stage")]
    #[diagnostic(code(konig::wait))]
    Wait {
        stage: Stage,
        #[source]
        source: io::Error,
    },

    #[error("failed to write report: {0}")]
    #[diagnostic(code(konig::report))]
    Report(#[from] io::Error),
}

/// Result type for harness operations.
pub type HarnessResult<T> = Result<T, HarnessError>;
