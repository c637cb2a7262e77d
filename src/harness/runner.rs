//! The orchestration loop
//!
//! Discovery → for each case: report start, run pipeline, judge, record,
//! report verdict → cleanup → report summary. Strictly sequential.

use std::fs;
use std::io;
use std::path::Path;

use super::config::HarnessConfig;
use super::discovery::{TestCase, discover_tests};
use super::pipeline::Pipeline;
use super::process::ProcessRunner;
use super::report::Reporter;
use super::verdict::{RunSummary, judge};
use super::HarnessResult;

/// Run the whole suite described by `config`.
///
/// ## Errors
///
/// Fails before running anything if the test directory cannot be read. A
/// reporter write error does not stop the loop or the cleanup; the first one
/// is returned once the run is over. Individual test failures are never
/// errors; they are counted in the returned [`RunSummary`].
pub fn run_suite<R, P>(config: &HarnessConfig, runner: &R, reporter: &mut P) -> HarnessResult<RunSummary>
where
    R: ProcessRunner,
    P: Reporter + ?Sized,
{
    let mut cases = discover_tests(&config.test_dir, &config.source_ext)?;
    if let Some(keyword) = config.filter.as_deref() {
        cases.retain(|case| case.name().contains(keyword));
    }

    let pipeline = Pipeline::new(config, runner);
    let mut summary = RunSummary::new(cases.len());

    let mut report_error = None;

    for case in &cases {
        keep_first(&mut report_error, reporter.on_test_start(case));
        let run = pipeline.run_case(case);
        let verdict = judge(&run);
        summary.record(case, &verdict);
        keep_first(&mut report_error, reporter.on_test_complete(case, &run, &verdict));
    }

    if config.keep_artifacts {
        tracing::info!("keeping generated artifacts");
    } else {
        let removed = remove_artifacts(config, &cases);
        tracing::debug!(removed, "cleaned up generated artifacts");
    }

    keep_first(&mut report_error, reporter.on_run_complete(&summary));
    match report_error {
        Some(err) => Err(err.into()),
        None => Ok(summary),
    }
}

fn keep_first(slot: &mut Option<io::Error>, result: io::Result<()>) {
    if let Err(e) = result {
        if slot.is_none() {
            tracing::warn!(error = %e, "report output failed, continuing run");
            *slot = Some(e);
        }
    }
}

/// Delete the compiled artifact and captured output of every case.
///
/// Sources and expectations are never touched. Files that do not exist are
/// skipped; other removal errors are logged and do not stop the pass.
/// Returns the number of files removed.
pub fn remove_artifacts(config: &HarnessConfig, cases: &[TestCase]) -> usize {
    cases
        .iter()
        .flat_map(|case| [config.artifact_path(case.name()), config.output_path(case.name())])
        .filter(|path| remove_if_present(path))
        .count()
}

fn remove_if_present(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => true,
        Err(e) if e.kind() == io::ErrorKind::NotFound => false,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not remove artifact");
            false
        }
    }
}
