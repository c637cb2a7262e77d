//! End-to-end runs of the `konig-test` binary against shell-script stand-ins
//! for the compiler.
//!
//! The fake `compile.sh` turns `test/<name>.ko` into a `<name>.out` script that
//! prints the source file verbatim, so a case passes when its `.ko` and `.res`
//! have the same contents. Sources containing `COMPILE_ERROR` make it exit 1
//! without producing an artifact; sources containing `HANG` produce an
//! artifact that never finishes.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::{TempDir, tempdir};

const FAKE_COMPILER: &str = r#"#!/bin/sh
src="$1"
name=$(basename "$src" .ko)
if grep -q COMPILE_ERROR "$src"; then
    echo "error: cannot compile $src" >&2
    exit 1
fi
if grep -q HANG "$src"; then
    printf '#!/bin/sh\nexec sleep 30\n' > "$name.out"
else
    printf '#!/bin/sh\ncat "%s"\n' "$src" > "$name.out"
fi
chmod +x "$name.out"
echo "compiled $name"
"#;

fn write_executable(path: &Path, contents: &str) {
    fs::write(path, contents).unwrap();
    let mut perms = fs::metadata(path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).unwrap();
}

/// A project directory with `compile.sh` and a `test/` directory holding `files`.
fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = tempdir().unwrap();
    write_executable(&dir.path().join("compile.sh"), FAKE_COMPILER);
    let test_dir = dir.path().join("test");
    fs::create_dir(&test_dir).unwrap();
    for (name, contents) in files {
        fs::write(test_dir.join(name), contents).unwrap();
    }
    dir
}

fn harness(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("konig-test").unwrap();
    cmd.current_dir(dir.path());
    cmd
}

#[test]
fn matching_output_passes_and_cleans_up() {
    let dir = project(&[("add.ko", "3\n"), ("add.res", "3\n")]);

    harness(&dir)
        .assert()
        .success()
        .stdout(contains("[+] Running test \"add\"..."))
        .stdout(contains("[+] test \"add\" PASSED."))
        .stdout(contains("\n[+] 1/1 test cases PASSED\n"))
        // compiler stdout is discarded
        .stdout(contains("compiled add").not());

    assert!(!dir.path().join("add.out").exists());
    assert!(!dir.path().join("test/add.txt").exists());
    assert!(dir.path().join("test/add.ko").exists());
    assert!(dir.path().join("test/add.res").exists());
}

#[test]
fn mismatched_output_fails() {
    let dir = project(&[("add.ko", "3\n"), ("add.res", "4\n")]);

    harness(&dir)
        .assert()
        .code(1)
        .stdout(contains("[!] test \"add\" FAILED. (!!!)"))
        .stdout(contains("[!] 1/1 test cases FAILED (!!!)"));

    assert!(!dir.path().join("add.out").exists());
    assert!(!dir.path().join("test/add.txt").exists());
}

#[test]
fn compile_failure_fails_even_when_stale_artifact_matches() {
    let dir = project(&[("bad.ko", "COMPILE_ERROR\n"), ("bad.res", "3\n")]);
    // Left over from an earlier, interrupted run
    write_executable(&dir.path().join("bad.out"), "#!/bin/sh\necho 3\n");

    harness(&dir)
        .assert()
        .code(1)
        .stdout(contains("[!] test \"bad\" FAILED. (!!!)"))
        .stderr(contains("error: cannot compile"));
}

#[test]
fn missing_expectation_fails_without_aborting() {
    let dir = project(&[("lonely.ko", "1\n"), ("ok.ko", "2\n"), ("ok.res", "2\n")]);

    harness(&dir)
        .assert()
        .code(1)
        .stdout(contains("[!] test \"lonely\" FAILED. (!!!)"))
        .stdout(contains("[+] test \"ok\" PASSED."))
        .stdout(contains("[!] 1/2 test cases FAILED (!!!)"))
        .stdout(contains("    - lonely"));
}

#[test]
fn empty_suite_reports_zero_of_zero() {
    let dir = project(&[("readme.md", "nothing here\n")]);

    harness(&dir)
        .assert()
        .success()
        .stdout("\n[+] 0/0 test cases PASSED\n");
}

#[test]
fn missing_test_directory_is_fatal() {
    let dir = tempdir().unwrap();
    let mut cmd = Command::cargo_bin("konig-test").unwrap();

    cmd.arg("-C")
        .arg(dir.path())
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty())
        .stderr(contains("cannot read test directory"));
}

#[test]
fn hung_artifact_is_killed_by_timeout() {
    let dir = project(&[("hang.ko", "HANG\n"), ("hang.res", "\n")]);

    harness(&dir)
        .args(["--timeout", "0.5", "-v"])
        .timeout(std::time::Duration::from_secs(20))
        .assert()
        .code(1)
        .stdout(contains("[!] test \"hang\" FAILED. (!!!)"))
        .stdout(contains("execute: timed out after 0.5s"));
}

#[test]
fn keep_artifacts_leaves_generated_files() {
    let dir = project(&[("add.ko", "3\n"), ("add.res", "3\n")]);

    harness(&dir).arg("--keep-artifacts").assert().success();

    assert!(dir.path().join("add.out").exists());
    assert_eq!(fs::read_to_string(dir.path().join("test/add.txt")).unwrap(), "3\n");
}
