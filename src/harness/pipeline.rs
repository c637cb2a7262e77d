//! The per-case compile → execute → compare sequence

use super::config::HarnessConfig;
use super::discovery::TestCase;
use super::process::{Invocation, ProcessRunner, Stage, StageResult, StageStatus, StdoutTarget};

/// Results of all three stages for one test case
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseRun {
    pub compile: StageResult,
    pub execute: StageResult,
    pub compare: StageResult,
}

impl CaseRun {
    pub fn stages(&self) -> [&StageResult; 3] {
        [&self.compile, &self.execute, &self.compare]
    }
}

/// Drives the three stages of a test case through a [`ProcessRunner`]
pub struct Pipeline<'a, R: ProcessRunner> {
    config: &'a HarnessConfig,
    runner: &'a R,
}

impl<'a, R: ProcessRunner> Pipeline<'a, R> {
    pub fn new(config: &'a HarnessConfig, runner: &'a R) -> Self {
        Self { config, runner }
    }

    /// Run compile, execute and compare for `case`.
    ///
    /// All three stages run even when an earlier one failed; each consumes
    /// whatever files the previous one left behind. Launch and wait errors
    /// are folded into [`StageStatus::LaunchFailed`] so one broken case never
    /// stops the suite.
    #[tracing::instrument(skip_all, fields(case = %case))]
    pub fn run_case(&self, case: &TestCase) -> CaseRun {
        CaseRun {
            compile: self.run_stage(compile_invocation(self.config, case)),
            execute: self.run_stage(execute_invocation(self.config, case)),
            compare: self.run_stage(compare_invocation(self.config, case)),
        }
    }

    fn run_stage(&self, invocation: Invocation) -> StageResult {
        match self.runner.run(&invocation) {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(stage = %invocation.stage, error = %err, "stage could not run");
                StageResult::new(invocation.stage, StageStatus::LaunchFailed(error_chain(&err)))
            }
        }
    }
}

/// `<compiler> test/<name>.ko`, stdout discarded
pub fn compile_invocation(config: &HarnessConfig, case: &TestCase) -> Invocation {
    Invocation {
        stage: Stage::Compile,
        program: config.compiler.clone(),
        args: vec![config.source_path(case.name()).into_os_string()],
        stdout: StdoutTarget::Discard,
        timeout: config.timeout,
    }
}

/// `./<name>.out > test/<name>.txt`
pub fn execute_invocation(config: &HarnessConfig, case: &TestCase) -> Invocation {
    Invocation {
        stage: Stage::Execute,
        program: config.artifact_path(case.name()),
        args: Vec::new(),
        stdout: StdoutTarget::File(config.output_path(case.name())),
        timeout: config.timeout,
    }
}

/// `<comparator> test/<name>.txt test/<name>.res`, stdout captured
pub fn compare_invocation(config: &HarnessConfig, case: &TestCase) -> Invocation {
    Invocation {
        stage: Stage::Compare,
        program: config.comparator.clone(),
        args: vec![
            config.output_path(case.name()).into_os_string(),
            config.expected_path(case.name()).into_os_string(),
        ],
        stdout: StdoutTarget::Capture,
        timeout: config.timeout,
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
