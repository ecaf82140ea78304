use std::io::Write;

use tracing::debug;

use super::error::SandboxError;
use super::executor::{build_command, execute};
use super::locate::{SnippetReference, locate};
use super::registry::ExtensionRegistry;
use super::report;
use crate::config::RunnerConfig;

/// Locate the workspace snippet and run it.
///
/// Returns the exit code the runner should terminate with. Terminal
/// failures (nothing runnable, timeout, persistence) come back as
/// `SandboxError`; use [`SandboxError::exit_code`] for those.
pub async fn run_workspace<O, E>(
    config: &RunnerConfig,
    registry: &ExtensionRegistry,
    out: &mut O,
    err: &mut E,
) -> Result<i32, SandboxError>
where
    O: Write,
    E: Write,
{
    let Some(reference) = locate(&config.workspace, registry)? else {
        return Err(SandboxError::NoCandidateFile {
            workspace: config.workspace.clone(),
            supported: registry.extensions(),
        });
    };

    run_snippet(&reference, config, registry, out, err).await
}

/// Execute one located snippet: run, echo, persist, summarize.
///
/// The artifact is written only after a completed run; a timeout
/// short-circuits before the output directory is touched.
pub async fn run_snippet<O, E>(
    reference: &SnippetReference,
    config: &RunnerConfig,
    registry: &ExtensionRegistry,
    out: &mut O,
    err: &mut E,
) -> Result<i32, SandboxError>
where
    O: Write,
    E: Write,
{
    let argv = build_command(reference, registry)?;
    let shown: Vec<_> = argv.iter().map(|arg| arg.to_string_lossy()).collect();
    writeln!(
        out,
        "Running: {} (timeout={}s)",
        shown.join(" "),
        config.limits.timeout_secs
    )
    .and_then(|_| out.flush())
    .map_err(SandboxError::Console)?;

    let result = execute(reference, registry, config).await?;

    report::echo(&result, out, err).map_err(SandboxError::Console)?;

    let path = config.result_path();
    report::persist(&result, &path)?;

    writeln!(out)
        .and_then(|_| writeln!(out, "Exit code: {}", result.exit_code))
        .and_then(|_| writeln!(out, "Output saved to: {}", path.display()))
        .and_then(|_| out.flush())
        .map_err(SandboxError::Console)?;

    debug!("Snippet {} finished with {}", reference.path.display(), result.exit_code);
    Ok(result.exit_code)
}
