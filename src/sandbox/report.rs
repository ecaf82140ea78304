//! Console transcript and the persisted result artifact.
//!
//! Output bytes are written exactly as captured, so the artifact holds the
//! same head-truncated payload the executor kept.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tracing::debug;

use super::error::SandboxError;
use super::executor::ExecutionResult;

const STDOUT_HEADER: &[u8] = b"--- stdout ---\n";
const STDERR_HEADER: &[u8] = b"--- stderr ---\n";

/// Echo non-empty stdout to `out` and non-empty stderr to `err`, each under
/// its labeled section.
pub fn echo<O, E>(result: &ExecutionResult, out: &mut O, err: &mut E) -> io::Result<()>
where
    O: Write,
    E: Write,
{
    if !result.stdout.is_empty() {
        write_section(out, STDOUT_HEADER, &result.stdout)?;
        out.flush()?;
    }
    if !result.stderr.is_empty() {
        write_section(err, STDERR_HEADER, &result.stderr)?;
        err.flush()?;
    }
    Ok(())
}

/// Render the artifact: exit code, stdout block, and the stderr block only
/// when stderr is non-empty.
pub fn render_artifact(result: &ExecutionResult) -> Vec<u8> {
    let mut buf = Vec::with_capacity(result.stdout.len() + result.stderr.len() + 64);
    buf.extend_from_slice(format!("exit_code: {}\n", result.exit_code).as_bytes());

    // Writes into a Vec cannot fail.
    let _ = write_section(&mut buf, STDOUT_HEADER, &result.stdout);
    if !result.stderr.is_empty() {
        let _ = write_section(&mut buf, STDERR_HEADER, &result.stderr);
    }
    buf
}

/// Write the artifact to `path`, creating its directory and replacing any
/// previous result.
pub fn persist(result: &ExecutionResult, path: &Path) -> Result<(), SandboxError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|source| SandboxError::Persistence {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    fs::write(path, render_artifact(result)).map_err(|source| SandboxError::Persistence {
        path: path.to_path_buf(),
        source,
    })?;

    debug!("Wrote result artifact {}", path.display());
    Ok(())
}

/// Print a terminal failure the way operators expect to read it.
pub fn print_failure<E: Write>(error: &SandboxError, err: &mut E) -> io::Result<()> {
    match error {
        SandboxError::NoCandidateFile { supported, .. } => {
            writeln!(err, "{}", error)?;
            writeln!(err, "Supported extensions: {}", supported.join(", "))?;
        }
        _ => writeln!(err, "Error: {}", error)?,
    }
    err.flush()
}

fn write_section<W: Write>(w: &mut W, header: &[u8], body: &[u8]) -> io::Result<()> {
    w.write_all(header)?;
    w.write_all(body)?;
    w.write_all(b"\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn result(exit_code: i32, stdout: &str, stderr: &str) -> ExecutionResult {
        ExecutionResult {
            exit_code,
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
        }
    }

    #[test]
    fn artifact_omits_empty_stderr() {
        let rendered = render_artifact(&result(0, "hello\n", ""));
        assert_eq!(
            String::from_utf8(rendered).unwrap(),
            "exit_code: 0\n--- stdout ---\nhello\n\n"
        );
    }

    #[test]
    fn artifact_includes_stderr_when_present() {
        let rendered = render_artifact(&result(2, "", "boom"));
        assert_eq!(
            String::from_utf8(rendered).unwrap(),
            "exit_code: 2\n--- stdout ---\n\n--- stderr ---\nboom\n"
        );
    }

    #[test]
    fn artifact_keeps_raw_bytes() {
        // A cap can land inside a multi-byte character; the bytes pass through untouched.
        let cut = ExecutionResult {
            exit_code: 0,
            stdout: vec![b'a', 0xE2, 0x82],
            stderr: Vec::new(),
        };
        let rendered = render_artifact(&cut);
        assert!(rendered.windows(3).any(|w| w == [b'a', 0xE2, 0x82]));
    }

    #[test]
    fn echo_routes_streams_to_their_channels() {
        let mut out = Vec::new();
        let mut err = Vec::new();
        echo(&result(1, "o", "e"), &mut out, &mut err).unwrap();
        assert_eq!(out, b"--- stdout ---\no\n");
        assert_eq!(err, b"--- stderr ---\ne\n");
    }

    #[test]
    fn echo_skips_empty_streams() {
        let mut out = Vec::new();
        let mut err = Vec::new();
        echo(&result(0, "", ""), &mut out, &mut err).unwrap();
        assert!(out.is_empty());
        assert!(err.is_empty());
    }

    #[test]
    fn persist_creates_directory_and_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("output").join("result.txt");

        persist(&result(5, "first run with a long body\n", "warn"), &path).unwrap();
        persist(&result(0, "second\n", ""), &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "exit_code: 0\n--- stdout ---\nsecond\n\n");
    }

    #[cfg(unix)]
    #[test]
    fn persist_failure_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        // A regular file where the output directory should be.
        fs::write(tmp.path().join("output"), "not a dir").unwrap();
        let path = tmp.path().join("output").join("result.txt");

        let err = persist(&result(0, "", ""), &path).unwrap_err();
        assert!(matches!(err, SandboxError::Persistence { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn no_candidate_lists_supported_extensions() {
        let error = SandboxError::NoCandidateFile {
            workspace: PathBuf::from("/workspace"),
            supported: vec![".py".into(), ".sh".into()],
        };
        let mut err = Vec::new();
        print_failure(&error, &mut err).unwrap();
        assert_eq!(
            String::from_utf8(err).unwrap(),
            "No runnable code found in /workspace\nSupported extensions: .py, .sh\n"
        );
    }

    #[test]
    fn other_failures_are_prefixed() {
        let mut err = Vec::new();
        print_failure(&SandboxError::TimeoutExceeded { seconds: 30 }, &mut err).unwrap();
        assert_eq!(
            String::from_utf8(err).unwrap(),
            "Error: execution timed out after 30 seconds\n"
        );
    }
}
