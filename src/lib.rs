#![forbid(unsafe_code)]
//! Konig Test Harness
//!
//! Drives the Konig compiler over a directory of golden-file test cases:
//! each `test/<name>.ko` is compiled, the resulting `<name>.out` is run with
//! its output captured to `test/<name>.txt`, and that capture is diffed
//! against `test/<name>.res`.
//!
//! The harness never compiles, runs or compares anything itself. It only
//! sequences external processes and interprets their exit statuses and the
//! comparator's output.
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod cli;
pub mod harness;
pub mod version;

pub use harness::{HarnessConfig, HarnessError, RunSummary, Verdict, run_suite};
