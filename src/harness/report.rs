//! Run reporting
//!
//! The run loop talks to a [`Reporter`] instead of printing directly, so the
//! console format can be swapped or captured in tests.

use std::io::{self, Write};

use super::discovery::TestCase;
use super::pipeline::CaseRun;
use super::verdict::{FailureReason, RunSummary, Verdict};

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const BOLD_GREEN: &str = "\x1b[1;32m";
const BOLD_RED: &str = "\x1b[1;31m";
const RESET: &str = "\x1b[0m";

/// Receives run events in order: `on_test_start`/`on_test_complete` once per
/// case, then `on_run_complete` once after cleanup.
pub trait Reporter {
    /// Called before the pipeline of `case` starts
    fn on_test_start(&mut self, case: &TestCase) -> io::Result<()>;

    /// Called once the verdict for `case` is known
    fn on_test_complete(&mut self, case: &TestCase, run: &CaseRun, verdict: &Verdict) -> io::Result<()>;

    /// Called once at the very end
    fn on_run_complete(&mut self, summary: &RunSummary) -> io::Result<()>;
}

/// Line-oriented console reporter
pub struct ConsoleReporter<W: Write> {
    out: W,
    color: bool,
    verbose: bool,
}

impl ConsoleReporter<io::Stdout> {
    pub fn stdout(color: bool, verbose: bool) -> Self {
        Self::new(io::stdout(), color, verbose)
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, color: bool, verbose: bool) -> Self {
        Self { out, color, verbose }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.color {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn write_failure_detail(&mut self, reasons: &[FailureReason]) -> io::Result<()> {
        for reason in reasons {
            match reason {
                FailureReason::Stage { stage, status } => {
                    writeln!(self.out, "    {stage}: {status}")?;
                }
                FailureReason::Mismatch { diff } => {
                    writeln!(self.out, "    compare output:")?;
                    for line in String::from_utf8_lossy(diff).lines() {
                        writeln!(self.out, "      {line}")?;
                    }
                }
            }
        }
        Ok(())
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn on_test_start(&mut self, case: &TestCase) -> io::Result<()> {
        writeln!(self.out, "[+] Running test \"{case}\"...")?;
        self.out.flush()
    }

    fn on_test_complete(&mut self, case: &TestCase, _run: &CaseRun, verdict: &Verdict) -> io::Result<()> {
        match verdict {
            Verdict::Pass => {
                let line = self.paint(GREEN, &format!("[+] test \"{case}\" PASSED."));
                writeln!(self.out, "{line}")?;
            }
            Verdict::Fail(reasons) => {
                let line = self.paint(RED, &format!("[!] test \"{case}\" FAILED. (!!!)"));
                writeln!(self.out, "{line}")?;
                if self.verbose {
                    self.write_failure_detail(reasons)?;
                }
            }
        }
        self.out.flush()
    }

    fn on_run_complete(&mut self, summary: &RunSummary) -> io::Result<()> {
        writeln!(self.out)?;
        if summary.all_passed() {
            let line = self.paint(
                BOLD_GREEN,
                &format!("[+] {}/{} test cases PASSED", summary.total, summary.total),
            );
            writeln!(self.out, "{line}")?;
        } else {
            let line = self.paint(
                BOLD_RED,
                &format!("[!] {}/{} test cases FAILED (!!!)", summary.failed, summary.total),
            );
            writeln!(self.out, "{line}")?;
            for name in &summary.failures {
                writeln!(self.out, "    - {name}")?;
            }
        }
        self.out.flush()
    }
}
