//! Harness configuration
//!
//! The defaults reproduce the fixed layout the Konig test suite has always
//! used: sources and expectations under `test/`, artifacts in the working
//! directory, `./compile.sh` as the compiler and `diff` as the comparator.

use std::path::PathBuf;
use std::time::Duration;

/// Layout, tools and run options for one harness run
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Directory holding `.ko` sources, `.res` expectations and `.txt` captures
    pub test_dir: PathBuf,
    /// Directory the compiler leaves `<name>.out` artifacts in
    pub work_dir: PathBuf,
    /// Suffix marking a test source file
    pub source_ext: String,
    /// Suffix of the stored expectation file
    pub expected_ext: String,
    /// Suffix of the captured output file
    pub output_ext: String,
    /// Suffix of the compiled artifact
    pub artifact_ext: String,
    /// Compiler command, invoked with the source path as its only argument
    pub compiler: PathBuf,
    /// Comparator command, invoked with the captured and expected paths
    pub comparator: PathBuf,
    /// Upper bound on each stage's run time; `None` waits forever
    pub timeout: Option<Duration>,
    /// Only run tests whose name contains this substring
    pub filter: Option<String>,
    /// Skip the final artifact cleanup
    pub keep_artifacts: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            test_dir: PathBuf::from("test"),
            work_dir: PathBuf::from("."),
            source_ext: ".ko".to_string(),
            expected_ext: ".res".to_string(),
            output_ext: ".txt".to_string(),
            artifact_ext: ".out".to_string(),
            compiler: PathBuf::from("./compile.sh"),
            comparator: PathBuf::from("diff"),
            timeout: None,
            filter: None,
            keep_artifacts: false,
        }
    }
}

impl HarnessConfig {
    /// Create a new config with the standard layout
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_test_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.test_dir = dir.into();
        self
    }

    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    pub fn with_compiler(mut self, compiler: impl Into<PathBuf>) -> Self {
        self.compiler = compiler.into();
        self
    }

    pub fn with_comparator(mut self, comparator: impl Into<PathBuf>) -> Self {
        self.comparator = comparator.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_keep_artifacts(mut self, keep: bool) -> Self {
        self.keep_artifacts = keep;
        self
    }

    /// `test/<name>.ko`
    pub fn source_path(&self, name: &str) -> PathBuf {
        self.test_dir.join(format!("{name}{}", self.source_ext))
    }

    /// `test/<name>.res`
    pub fn expected_path(&self, name: &str) -> PathBuf {
        self.test_dir.join(format!("{name}{}", self.expected_ext))
    }

    /// `test/<name>.txt`
    pub fn output_path(&self, name: &str) -> PathBuf {
        self.test_dir.join(format!("{name}{}", self.output_ext))
    }

    /// `./<name>.out`
    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.work_dir.join(format!("{name}{}", self.artifact_ext))
    }
}
