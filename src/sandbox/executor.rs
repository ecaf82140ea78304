use std::ffi::OsString;
use std::io;
use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use super::error::SandboxError;
use super::locate::SnippetReference;
use super::registry::{ExtensionRegistry, Interpreter};
use crate::config::RunnerConfig;

/// Outcome of a snippet that terminated on its own within the timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// The child's exit code, or `128 + signal` if a signal ended it.
    pub exit_code: i32,
    /// First `cap` bytes of stdout.
    pub stdout: Vec<u8>,
    /// First `cap` bytes of stderr.
    pub stderr: Vec<u8>,
}

/// Interpreter argv for `reference`, snippet path last.
pub fn build_command(
    reference: &SnippetReference,
    registry: &ExtensionRegistry,
) -> Result<Vec<OsString>, SandboxError> {
    interpreter_for(reference, registry).map(|interpreter| interpreter.argv(&reference.path))
}

fn interpreter_for<'a>(
    reference: &SnippetReference,
    registry: &'a ExtensionRegistry,
) -> Result<&'a Interpreter, SandboxError> {
    registry
        .get(&reference.extension)
        .ok_or_else(|| SandboxError::UnregisteredExtension(reference.extension.clone()))
}

/// Run the snippet with the workspace root as working directory.
///
/// The child gets `/dev/null` as stdin and separate stdout/stderr pipes,
/// each kept to the first `limits.max_output_bytes()` bytes. Waiting for exit
/// and draining both pipes is bounded by `limits.timeout()`; on expiry the
/// child's process group is killed and `TimeoutExceeded` is returned with no
/// partial output.
pub async fn execute(
    reference: &SnippetReference,
    registry: &ExtensionRegistry,
    config: &RunnerConfig,
) -> Result<ExecutionResult, SandboxError> {
    let interpreter = interpreter_for(reference, registry)?;
    let limits = config.limits;

    let mut command = Command::new(interpreter.program());
    command
        .args(interpreter.args())
        .arg(&reference.path)
        .current_dir(&config.workspace)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    // Own process group, so a timeout can take down the snippet's
    // children along with it.
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.as_std_mut().process_group(0);
    }

    let mut child = command.spawn().map_err(|source| SandboxError::Spawn {
        program: interpreter.program().to_string(),
        source,
    })?;
    let pid = child.id();
    debug!(
        "Spawned {} {} as pid {:?}",
        interpreter.program(),
        reference.path.display(),
        pid
    );

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| SandboxError::Capture(io::Error::other("child stdout was not piped")))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| SandboxError::Capture(io::Error::other("child stderr was not piped")))?;

    let cap = limits.max_output_bytes();
    let completion = async {
        tokio::try_join!(
            child.wait(),
            read_capped(stdout, cap),
            read_capped(stderr, cap)
        )
    };
    let outcome = tokio::time::timeout(limits.timeout(), completion).await;

    let (status, stdout, stderr) = match outcome {
        Ok(joined) => joined.map_err(SandboxError::Capture)?,
        Err(_) => {
            debug!("pid {:?} exceeded {}s, terminating", pid, limits.timeout_secs);
            terminate(&mut child, pid).await;
            return Err(SandboxError::TimeoutExceeded {
                seconds: limits.timeout_secs,
            });
        }
    };

    for (name, captured) in [("stdout", &stdout), ("stderr", &stderr)] {
        if captured.total > captured.bytes.len() as u64 {
            debug!(
                "Truncated {} from {} to {} bytes",
                name,
                captured.total,
                captured.bytes.len()
            );
        }
    }

    let exit_code = exit_code_of(status);
    debug!("pid {:?} exited with {}", pid, exit_code);

    Ok(ExecutionResult {
        exit_code,
        stdout: stdout.bytes,
        stderr: stderr.bytes,
    })
}

/// Head of a stream plus how many bytes the stream carried in total.
struct Captured {
    bytes: Vec<u8>,
    total: u64,
}

/// Read `reader` to EOF, keeping only the first `cap` bytes.
///
/// The remainder is drained and dropped so the child never stalls on a
/// full pipe.
async fn read_capped<R>(mut reader: R, cap: usize) -> io::Result<Captured>
where
    R: AsyncRead + Unpin,
{
    let mut bytes = Vec::new();
    let mut total = 0u64;
    let mut buf = [0u8; 8192];

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        total += n as u64;
        let room = cap.saturating_sub(bytes.len());
        bytes.extend_from_slice(&buf[..n.min(room)]);
    }

    Ok(Captured { bytes, total })
}

/// SIGKILL the snippet's process group, then kill and reap the direct child.
///
/// Descendants that left the group (e.g. via setsid) are not reached.
async fn terminate(child: &mut Child, pid: Option<u32>) {
    #[cfg(unix)]
    if let Some(pid) = pid {
        use nix::errno::Errno;
        use nix::sys::signal::{Signal, killpg};
        use nix::unistd::Pid;

        match killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(e) => warn!("Failed to signal process group {}: {}", pid, e),
        }
    }

    #[cfg(not(unix))]
    let _ = pid;

    if let Err(e) = child.kill().await {
        debug!("Child already gone after timeout: {}", e);
    }
}

fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    -1
}
