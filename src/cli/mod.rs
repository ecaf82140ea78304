use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::config::{
    DEFAULT_MAX_OUTPUT_KB, DEFAULT_TIMEOUT_SECS, DEFAULT_WORKSPACE, ExecutionLimits, RunnerConfig,
};
use crate::sandbox::{ExtensionRegistry, SandboxError, report, run_workspace};

#[derive(Parser, Debug)]
#[command(name = "snippet-runner")]
#[command(
    author,
    version,
    about = "Run the single code snippet in a workspace under a timeout"
)]
pub struct Cli {
    /// Workspace holding the snippet; also the child's working directory
    #[arg(long, env = "SNIPPET_WORKSPACE", default_value = DEFAULT_WORKSPACE)]
    pub workspace: PathBuf,

    /// Wall-clock limit for the snippet, in seconds
    #[arg(
        long,
        env = "TIMEOUT",
        default_value_t = DEFAULT_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout: u64,

    /// Per-stream output cap, in KiB
    #[arg(
        long,
        env = "MAX_OUTPUT_KB",
        default_value_t = DEFAULT_MAX_OUTPUT_KB,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub max_output_kb: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Resolve the runner configuration. The workspace is made absolute so
    /// snippet paths handed to interpreters are absolute too.
    pub fn runner_config(&self) -> Result<RunnerConfig> {
        let workspace = std::path::absolute(&self.workspace).with_context(|| {
            format!(
                "Failed to resolve workspace path {}",
                self.workspace.display()
            )
        })?;

        Ok(RunnerConfig::new(
            workspace,
            ExecutionLimits {
                timeout_secs: self.timeout,
                max_output_kb: self.max_output_kb,
            },
        ))
    }
}

/// Run the workspace snippet and return the process exit code.
pub async fn run(config: RunnerConfig) -> i32 {
    let registry = ExtensionRegistry::default();
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();

    match run_workspace(&config, &registry, &mut stdout, &mut stderr).await {
        Ok(code) => code,
        Err(e) => report_failure(&e, &mut stderr),
    }
}

/// Print a terminal failure and map it to its exit code. A broken error
/// channel does not change the code.
fn report_failure<W: Write>(error: &SandboxError, err: &mut W) -> i32 {
    tracing::debug!("Runner failed: {:?}", error);
    if let Err(write_err) = report::print_failure(error, err) {
        tracing::debug!("Failed to report runner failure: {}", write_err);
    }
    error.exit_code()
}
