//! Property-based tests for the Konig test harness
//!
//! These tests use proptest to check discovery and verdict invariants across
//! many generated inputs.

use std::collections::BTreeSet;
use std::fs;

use konig_harness::harness::{CaseRun, Stage, StageResult, StageStatus, Verdict, discover_tests, judge};
use proptest::prelude::*;
use tempfile::tempdir;

fn base_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,11}"
}

fn status() -> impl Strategy<Value = StageStatus> {
    prop_oneof![
        4 => Just(StageStatus::Code(0)),
        2 => (1..=255i32).prop_map(StageStatus::Code),
        1 => Just(StageStatus::Killed),
        1 => Just(StageStatus::LaunchFailed("no such file".to_string())),
    ]
}

// =============================================================================
// Discovery Properties
// =============================================================================

proptest! {
    /// Property: only exact `.ko` suffixes become test cases, named by their stem
    #[test]
    fn discovery_returns_exactly_the_ko_stems(
        sources in prop::collection::btree_set(base_name(), 0..8),
        others in prop::collection::btree_set((base_name(), prop::sample::select(vec![".res", ".txt", ".KO", ".ko.bak", ".out", ""])), 0..8),
    ) {
        let dir = tempdir().unwrap();
        for name in &sources {
            fs::write(dir.path().join(format!("{name}.ko")), "").unwrap();
        }
        for (name, ext) in &others {
            fs::write(dir.path().join(format!("{name}{ext}")), "").unwrap();
        }

        let found: BTreeSet<String> = discover_tests(dir.path(), ".ko")
            .unwrap()
            .iter()
            .map(|case| case.name().to_string())
            .collect();

        prop_assert_eq!(found, sources);
    }
}

// =============================================================================
// Verdict Properties
// =============================================================================

proptest! {
    /// Property: a case passes iff every stage exited zero and the diff is empty
    #[test]
    fn verdict_passes_only_on_clean_runs(
        compile in status(),
        execute in status(),
        compare in status(),
        diff in prop::collection::vec(any::<u8>(), 0..4),
    ) {
        let clean = compile.is_success() && execute.is_success() && compare.is_success() && diff.is_empty();
        let run = CaseRun {
            compile: StageResult::new(Stage::Compile, compile),
            execute: StageResult::new(Stage::Execute, execute),
            compare: StageResult::new(Stage::Compare, compare).with_stdout(diff),
        };

        prop_assert_eq!(judge(&run) == Verdict::Pass, clean);
    }
}
