use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::error::SandboxError;
use super::registry::ExtensionRegistry;

/// A runnable file found in the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetReference {
    /// Absolute when the workspace path is absolute.
    pub path: PathBuf,
    /// Registered extension including the leading dot.
    pub extension: String,
}

/// Find the first registered snippet in `workspace`, scanning names in
/// ascending lexicographic order.
///
/// Returns `Ok(None)` when nothing matches; only a workspace that cannot be
/// listed is an error.
pub fn locate(
    workspace: &Path,
    registry: &ExtensionRegistry,
) -> Result<Option<SnippetReference>, SandboxError> {
    let workspace_err = |source| SandboxError::Workspace {
        path: workspace.to_path_buf(),
        source,
    };

    let mut names = Vec::new();
    for entry in fs::read_dir(workspace).map_err(workspace_err)? {
        names.push(entry.map_err(workspace_err)?.file_name());
    }
    names.sort();

    for name in names {
        let path = workspace.join(&name);

        // Follows symlinks: a link to a regular file counts, a link to a
        // directory or a dangling link does not.
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => {}
            _ => continue,
        }

        let Some(extension) = extension_of(Path::new(&name)) else {
            continue;
        };
        if registry.contains(&extension) {
            debug!("Located snippet {} ({})", path.display(), extension);
            return Ok(Some(SnippetReference { path, extension }));
        }
    }

    debug!("No registered snippet in {}", workspace.display());
    Ok(None)
}

/// Extension with its leading dot. A name whose only dot is leading
/// (`.bashrc`) has no extension.
fn extension_of(name: &Path) -> Option<String> {
    name.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, "echo hi\n").unwrap();
        path
    }

    #[test]
    fn finds_single_registered_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = touch(tmp.path(), "main.py");

        let found = locate(tmp.path(), &ExtensionRegistry::default())
            .unwrap()
            .unwrap();
        assert_eq!(found.path, path);
        assert_eq!(found.extension, ".py");
    }

    #[test]
    fn empty_workspace_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let found = locate(tmp.path(), &ExtensionRegistry::default()).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn unregistered_and_extensionless_files_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "README");
        touch(tmp.path(), "notes.txt");
        touch(tmp.path(), ".sh");
        touch(tmp.path(), "trailing.");
        touch(tmp.path(), "upper.PY");

        let found = locate(tmp.path(), &ExtensionRegistry::default()).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn first_name_in_sort_order_wins() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "b.py");
        touch(tmp.path(), "c.sh");
        let first = touch(tmp.path(), "a.sh");

        for _ in 0..5 {
            let found = locate(tmp.path(), &ExtensionRegistry::default())
                .unwrap()
                .unwrap();
            assert_eq!(found.path, first);
            assert_eq!(found.extension, ".sh");
        }
    }

    #[test]
    fn directories_are_skipped_even_with_registered_names() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("a.py")).unwrap();
        let file = touch(tmp.path(), "b.py");

        let found = locate(tmp.path(), &ExtensionRegistry::default())
            .unwrap()
            .unwrap();
        assert_eq!(found.path, file);
    }

    #[test]
    fn files_in_subdirectories_are_not_considered() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("nested")).unwrap();
        touch(&tmp.path().join("nested"), "inner.py");

        let found = locate(tmp.path(), &ExtensionRegistry::default()).unwrap();
        assert!(found.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn symlink_to_directory_is_skipped_but_link_to_file_counts() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("dir")).unwrap();
        std::os::unix::fs::symlink(tmp.path().join("dir"), tmp.path().join("a.py")).unwrap();
        let target = touch(tmp.path(), "z.txt");
        std::os::unix::fs::symlink(&target, tmp.path().join("b.sh")).unwrap();

        let found = locate(tmp.path(), &ExtensionRegistry::default())
            .unwrap()
            .unwrap();
        assert_eq!(found.path, tmp.path().join("b.sh"));
    }

    #[test]
    fn missing_workspace_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = locate(&tmp.path().join("gone"), &ExtensionRegistry::default()).unwrap_err();
        assert!(matches!(err, SandboxError::Workspace { .. }));
    }

    #[test]
    fn extension_keeps_leading_dot() {
        assert_eq!(extension_of(Path::new("a.tar.sh")).as_deref(), Some(".sh"));
        assert_eq!(extension_of(Path::new(".bashrc")), None);
        assert_eq!(extension_of(Path::new("Makefile")), None);
    }
}
