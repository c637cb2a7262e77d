//! Test case discovery
//!
//! A test case is named by the base name of a source file in the test
//! directory. Order is whatever the directory listing yields; it is not
//! sorted.

use std::fmt;
use std::fs;
use std::path::Path;

use super::{HarnessError, HarnessResult};

/// A discovered test case, identified by its base name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TestCase {
    name: String,
}

impl TestCase {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// List every entry of `dir` whose file name ends with `source_ext`.
///
/// The suffix match is exact and case-sensitive. Entries whose names are not
/// valid UTF-8, or that consist of the suffix alone, are skipped.
///
/// ## Errors
///
/// Returns [`HarnessError::Discovery`] if `dir` is missing or unreadable.
pub fn discover_tests(dir: &Path, source_ext: &str) -> HarnessResult<Vec<TestCase>> {
    let discovery_error = |source: std::io::Error| HarnessError::Discovery {
        path: dir.to_path_buf(),
        source,
    };

    let mut cases = Vec::new();
    for entry in fs::read_dir(dir).map_err(discovery_error)? {
        let entry = entry.map_err(discovery_error)?;
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            tracing::debug!(entry = ?entry.path(), "skipping non UTF-8 file name");
            continue;
        };
        match file_name.strip_suffix(source_ext) {
            Some(stem) if !stem.is_empty() => cases.push(TestCase::new(stem)),
            _ => {}
        }
    }

    tracing::debug!(dir = %dir.display(), count = cases.len(), "discovered test cases");
    Ok(cases)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::tempdir;

    fn names(cases: &[TestCase]) -> BTreeSet<String> {
        cases.iter().map(|c| c.name().to_string()).collect()
    }

    #[test]
    fn test_discovers_only_source_files() {
        let dir = tempdir().unwrap();
        for file in ["add.ko", "add.res", "loop.ko", "loop.txt", "notes.md"] {
            fs::write(dir.path().join(file), "").unwrap();
        }

        let cases = discover_tests(dir.path(), ".ko").unwrap();
        assert_eq!(names(&cases), BTreeSet::from(["add".to_string(), "loop".to_string()]));
    }

    #[test]
    fn test_suffix_match_is_case_sensitive() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("upper.KO"), "").unwrap();
        fs::write(dir.path().join("kobold"), "").unwrap();
        fs::write(dir.path().join("a.ko.bak"), "").unwrap();

        assert!(discover_tests(dir.path(), ".ko").unwrap().is_empty());
    }

    #[test]
    fn test_multi_dot_names_keep_inner_dots() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("nested.call.ko"), "").unwrap();

        let cases = discover_tests(dir.path(), ".ko").unwrap();
        assert_eq!(cases, vec![TestCase::new("nested.call")]);
    }

    #[test]
    fn test_bare_extension_is_skipped() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".ko"), "").unwrap();

        assert!(discover_tests(dir.path(), ".ko").unwrap().is_empty());
    }

    #[test]
    fn test_empty_directory_is_not_an_error() {
        let dir = tempdir().unwrap();
        assert!(discover_tests(dir.path(), ".ko").unwrap().is_empty());
    }

    #[test]
    fn test_missing_directory_is_discovery_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");

        let err = discover_tests(&missing, ".ko").unwrap_err();
        assert!(matches!(err, HarnessError::Discovery { ref path, .. } if *path == missing));
    }
}
