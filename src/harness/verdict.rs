//! PASS/FAIL classification and run totals
//!
//! A case fails if any stage did not exit with status zero, or if the
//! comparator printed anything. An empty diff alone never makes a pass.

use super::discovery::TestCase;
use super::pipeline::CaseRun;
use super::process::{Stage, StageStatus};

/// Why a case failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// A stage did not exit with status zero
    Stage { stage: Stage, status: StageStatus },
    /// The comparator reported a difference
    Mismatch { diff: Vec<u8> },
}

/// Outcome of one test case
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    /// Reasons in stage order, mismatch last
    Fail(Vec<FailureReason>),
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

/// Classify a finished case.
pub fn judge(run: &CaseRun) -> Verdict {
    let mut reasons: Vec<FailureReason> = run
        .stages()
        .into_iter()
        .filter(|result| !result.status.is_success())
        .map(|result| FailureReason::Stage {
            stage: result.stage,
            status: result.status.clone(),
        })
        .collect();

    if !run.compare.stdout.is_empty() {
        reasons.push(FailureReason::Mismatch {
            diff: run.compare.stdout.clone(),
        });
    }

    if reasons.is_empty() { Verdict::Pass } else { Verdict::Fail(reasons) }
}

/// Totals for a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub failed: usize,
    /// Names of failing cases, in run order
    pub failures: Vec<String>,
}

impl RunSummary {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn record(&mut self, case: &TestCase, verdict: &Verdict) {
        if !verdict.is_pass() {
            self.failed += 1;
            self.failures.push(case.name().to_string());
        }
    }

    pub fn passed(&self) -> usize {
        self.total - self.failed
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}
