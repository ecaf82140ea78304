use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("extension {0:?} must start with '.' and name at least one character")]
    InvalidExtension(String),

    #[error("extension {0:?} has an empty interpreter command")]
    EmptyCommand(String),
}

/// Interpreter command template for one file extension.
///
/// The snippet path is always appended after `command`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpreter {
    command: Vec<String>,
}

impl Interpreter {
    /// Full argv for running `snippet` with this interpreter. The path is
    /// passed through untouched, so non-UTF-8 names still resolve.
    pub fn argv(&self, snippet: &Path) -> Vec<OsString> {
        self.command
            .iter()
            .map(OsString::from)
            .chain(std::iter::once(snippet.as_os_str().to_os_string()))
            .collect()
    }

    /// Interpreter binary; never empty once validated by the registry.
    pub fn program(&self) -> &str {
        &self.command[0]
    }

    /// Template tokens after the program, before the snippet path.
    pub fn args(&self) -> &[String] {
        &self.command[1..]
    }
}

/// Validated, immutable mapping from extension (with leading dot,
/// case-sensitive) to interpreter.
#[derive(Debug, Clone)]
pub struct ExtensionRegistry {
    entries: BTreeMap<String, Interpreter>,
}

impl ExtensionRegistry {
    /// Build a registry, rejecting malformed keys and empty commands.
    pub fn new<I, K, C, T>(entries: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = (K, C)>,
        K: Into<String>,
        C: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (ext, command) in entries {
            let ext = ext.into();
            if !ext.starts_with('.') || ext.len() < 2 {
                return Err(RegistryError::InvalidExtension(ext));
            }
            let command: Vec<String> = command.into_iter().map(Into::into).collect();
            if command.is_empty() || command[0].is_empty() {
                return Err(RegistryError::EmptyCommand(ext));
            }
            map.insert(ext, Interpreter { command });
        }
        Ok(Self { entries: map })
    }

    pub fn get(&self, extension: &str) -> Option<&Interpreter> {
        self.entries.get(extension)
    }

    pub fn contains(&self, extension: &str) -> bool {
        self.entries.contains_key(extension)
    }

    /// Registered extensions in sorted order.
    pub fn extensions(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

impl Default for ExtensionRegistry {
    fn default() -> Self {
        Self {
            entries: BTreeMap::from([
                (
                    ".py".to_string(),
                    Interpreter {
                        command: vec!["python3".to_string()],
                    },
                ),
                (
                    ".sh".to_string(),
                    Interpreter {
                        command: vec!["bash".to_string()],
                    },
                ),
            ]),
        }
    }
}
