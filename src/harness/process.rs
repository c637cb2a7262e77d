//! Process invocation boundary
//!
//! Every stage of the pipeline is an external process. The [`ProcessRunner`]
//! trait is the single seam through which they are launched, so the pipeline
//! and run loop can be driven by a scripted runner in tests. [`SystemRunner`]
//! is the real implementation on top of `std::process`.

use std::ffi::OsString;
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::{Child, ChildStdout, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use super::{HarnessError, HarnessResult};

/// One of the three pipeline stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Compile,
    Execute,
    Compare,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compile => "compile",
            Self::Execute => "execute",
            Self::Compare => "compare",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a stage's standard output goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StdoutTarget {
    /// Thrown away
    Discard,
    /// Written to a file, created or truncated before launch
    File(PathBuf),
    /// Collected into [`StageResult::stdout`]
    Capture,
}

/// A fully described external process call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub stage: Stage,
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub stdout: StdoutTarget,
    pub timeout: Option<Duration>,
}

/// How a stage terminated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageStatus {
    /// Exited normally with this code
    Code(i32),
    /// Terminated by a signal, no exit code
    Killed,
    /// Could not be started at all
    LaunchFailed(String),
    /// Killed after exceeding the configured timeout
    TimedOut(Duration),
}

impl StageStatus {
    /// Only a normal exit with code zero counts as success.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Code(0))
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => write!(f, "exit status {code}"),
            Self::Killed => f.write_str("killed by signal"),
            Self::LaunchFailed(reason) => write!(f, "launch failed: {reason}"),
            Self::TimedOut(limit) => write!(f, "timed out after {:.1}s", limit.as_secs_f64()),
        }
    }
}

/// Typed result of one stage: termination status plus captured stdout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageResult {
    pub stage: Stage,
    pub status: StageStatus,
    /// Empty unless the invocation asked for [`StdoutTarget::Capture`]
    pub stdout: Vec<u8>,
}

impl StageResult {
    pub fn new(stage: Stage, status: StageStatus) -> Self {
        Self {
            stage,
            status,
            stdout: Vec::new(),
        }
    }

    pub fn with_stdout(mut self, stdout: impl Into<Vec<u8>>) -> Self {
        self.stdout = stdout.into();
        self
    }
}

/// Launches stage processes.
pub trait ProcessRunner {
    /// Run `invocation` to completion (or timeout) and report how it ended.
    ///
    /// A process that starts and exits non-zero is an `Ok` result. `Err` is
    /// reserved for processes that could not be started or waited on.
    fn run(&self, invocation: &Invocation) -> HarnessResult<StageResult>;
}

/// How often a bounded wait polls the child
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Minimum time given to the stdout reader once the child is gone
const DRAIN_GRACE: Duration = Duration::from_millis(100);

/// Runs stages as real child processes of the harness.
///
/// Children inherit the harness's working directory and standard error.
/// Standard input is closed so an artifact that reads it sees EOF instead of
/// blocking on the terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> HarnessResult<StageResult> {
        let stage = invocation.stage;
        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args).stdin(Stdio::null()).stderr(Stdio::inherit());

        match &invocation.stdout {
            StdoutTarget::Discard => {
                command.stdout(Stdio::null());
            }
            StdoutTarget::File(path) => {
                let file = File::create(path).map_err(|source| HarnessError::Capture {
                    path: path.clone(),
                    source,
                })?;
                command.stdout(Stdio::from(file));
            }
            StdoutTarget::Capture => {
                command.stdout(Stdio::piped());
            }
        }

        let mut child = command.spawn().map_err(|source| HarnessError::Launch {
            stage,
            program: invocation.program.clone(),
            source,
        })?;

        // Drain the pipe concurrently; a large diff would otherwise fill it and
        // stall the child while we wait on it.
        let capture = child.stdout.take().map(spawn_reader);
        let wait_error = |source: io::Error| HarnessError::Wait { stage, source };

        let (status, stdout) = match invocation.timeout {
            None => {
                let exit = child.wait().map_err(wait_error)?;
                let stdout = match capture {
                    Some(rx) => drain(&rx, None).map_err(wait_error)?.unwrap_or_default(),
                    None => Vec::new(),
                };
                (exit_status(exit), stdout)
            }
            Some(limit) => {
                let started = Instant::now();
                let status = match wait_with_timeout(&mut child, limit).map_err(wait_error)? {
                    Some(exit) => exit_status(exit),
                    None => StageStatus::TimedOut(limit),
                };
                // A descendant of the killed child can keep the pipe open, so the
                // reader gets whatever is left of the limit and no more.
                let budget = match status {
                    StageStatus::TimedOut(_) => DRAIN_GRACE,
                    _ => limit.saturating_sub(started.elapsed()).max(DRAIN_GRACE),
                };
                match capture {
                    None => (status, Vec::new()),
                    Some(rx) => match drain(&rx, Some(budget)).map_err(wait_error)? {
                        Some(stdout) => (status, stdout),
                        None => {
                            tracing::warn!(%stage, "stdout still open after timeout, abandoning capture");
                            (StageStatus::TimedOut(limit), Vec::new())
                        }
                    },
                }
            }
        };

        tracing::debug!(
            %stage,
            program = %invocation.program.display(),
            status = %status,
            captured = stdout.len(),
            "stage finished"
        );

        Ok(StageResult { stage, status, stdout })
    }
}

fn exit_status(status: ExitStatus) -> StageStatus {
    status.code().map_or(StageStatus::Killed, StageStatus::Code)
}

/// Read a child's stdout to EOF on a separate thread.
///
/// The thread is detached; if the receiver gives up on it, it finishes when
/// the last writer closes the pipe.
fn spawn_reader(mut pipe: ChildStdout) -> Receiver<io::Result<Vec<u8>>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let result = pipe.read_to_end(&mut buf).map(|_| buf);
        let _ = tx.send(result);
    });
    rx
}

/// Collect a reader's result, waiting at most `budget` if one is given.
///
/// `Ok(None)` means the budget ran out before the pipe reached EOF. A failed
/// read is an error, never a silently truncated capture.
fn drain(rx: &Receiver<io::Result<Vec<u8>>>, budget: Option<Duration>) -> io::Result<Option<Vec<u8>>> {
    let received = match budget {
        None => rx.recv().map_err(|_| reader_gone()),
        Some(budget) => match rx.recv_timeout(budget) {
            Ok(result) => Ok(result),
            Err(RecvTimeoutError::Timeout) => return Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(reader_gone()),
        },
    };
    received?.map(Some)
}

fn reader_gone() -> io::Error {
    io::Error::other("stdout reader exited without a result")
}

/// Wait for `child` for at most `limit`. Returns `None` if it had to be killed.
fn wait_with_timeout(child: &mut Child, limit: Duration) -> io::Result<Option<ExitStatus>> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if start.elapsed() >= limit {
            // The child may exit between try_wait and kill; that race is harmless.
            let _ = child.kill();
            child.wait()?;
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! A scripted runner that never spawns anything.

    use std::cell::RefCell;

    use super::*;

    type Responder = Box<dyn Fn(&Invocation) -> HarnessResult<StageResult>>;

    pub(crate) struct ScriptedRunner {
        responder: Responder,
        calls: RefCell<Vec<Invocation>>,
    }

    impl ScriptedRunner {
        pub(crate) fn new(responder: impl Fn(&Invocation) -> HarnessResult<StageResult> + 'static) -> Self {
            Self {
                responder: Box::new(responder),
                calls: RefCell::new(Vec::new()),
            }
        }

        /// Every stage exits zero and the comparator prints nothing.
        pub(crate) fn all_pass() -> Self {
            Self::new(|inv| Ok(StageResult::new(inv.stage, StageStatus::Code(0))))
        }

        pub(crate) fn calls(&self) -> Vec<Invocation> {
            self.calls.borrow().clone()
        }
    }

    impl ProcessRunner for ScriptedRunner {
        fn run(&self, invocation: &Invocation) -> HarnessResult<StageResult> {
            self.calls.borrow_mut().push(invocation.clone());
            (self.responder)(invocation)
        }
    }
}
