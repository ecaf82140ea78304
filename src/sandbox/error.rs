use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Exit code reported when the snippet outlives its wall-clock budget.
pub const EXIT_TIMEOUT: i32 = 124;

/// Exit code reported when the workspace holds nothing runnable.
pub const EXIT_NO_CANDIDATE: i32 = 1;

/// Exit code reported when the interpreter binary itself cannot be found.
pub const EXIT_INTERPRETER_NOT_FOUND: i32 = 127;

/// Exit code for any other runner-side failure.
pub const EXIT_RUNNER_FAILURE: i32 = 2;

/// Terminal failures of a single runner invocation.
///
/// A snippet that exits non-zero is not an error; its code is forwarded
/// through [`ExecutionResult`](super::ExecutionResult) instead.
#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("No runnable code found in {}", workspace.display())]
    NoCandidateFile {
        workspace: PathBuf,
        supported: Vec<String>,
    },

    #[error("execution timed out after {seconds} seconds")]
    TimeoutExceeded { seconds: u64 },

    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to capture child output: {0}")]
    Capture(#[source] io::Error),

    #[error("failed to write to console: {0}")]
    Console(#[source] io::Error),

    #[error("failed to write result artifact {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read workspace {}: {source}", path.display())]
    Workspace {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The locator handed over an extension the registry does not know.
    #[error("internal error: no interpreter registered for extension {0:?}")]
    UnregisteredExtension(String),
}

impl SandboxError {
    /// Process exit code the runner terminates with for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            SandboxError::NoCandidateFile { .. } => EXIT_NO_CANDIDATE,
            SandboxError::TimeoutExceeded { .. } => EXIT_TIMEOUT,
            SandboxError::Spawn { source, .. } if source.kind() == io::ErrorKind::NotFound => {
                EXIT_INTERPRETER_NOT_FOUND
            }
            _ => EXIT_RUNNER_FAILURE,
        }
    }
}
