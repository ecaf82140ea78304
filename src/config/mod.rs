//! Process-wide runner configuration.
//!
//! Built once at startup from the parsed command line (which itself reads
//! `TIMEOUT` / `MAX_OUTPUT_KB` / `SNIPPET_WORKSPACE`) and passed by reference
//! into the locator and executor. Nothing below reads the environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_WORKSPACE: &str = "/workspace";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_OUTPUT_KB: u64 = 256;

/// Output subdirectory, relative to the workspace root.
pub const OUTPUT_DIR_NAME: &str = "output";
pub const RESULT_FILE_NAME: &str = "result.txt";

/// Wall-clock and output bounds for one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionLimits {
    /// Kill the snippet after this many seconds.
    pub timeout_secs: u64,

    /// Per-stream capture cap in KiB.
    pub max_output_kb: u64,
}

impl ExecutionLimits {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Per-stream capture cap in bytes.
    pub fn max_output_bytes(&self) -> usize {
        usize::try_from(self.max_output_kb.saturating_mul(1024)).unwrap_or(usize::MAX)
    }
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_output_kb: DEFAULT_MAX_OUTPUT_KB,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Workspace root: holds the snippet and is the child's working directory.
    pub workspace: PathBuf,

    pub limits: ExecutionLimits,
}

impl RunnerConfig {
    pub fn new(workspace: impl Into<PathBuf>, limits: ExecutionLimits) -> Self {
        Self {
            workspace: workspace.into(),
            limits,
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        output_dir(&self.workspace)
    }

    pub fn result_path(&self) -> PathBuf {
        self.output_dir().join(RESULT_FILE_NAME)
    }
}

pub fn output_dir(workspace: &Path) -> PathBuf {
    workspace.join(OUTPUT_DIR_NAME)
}
