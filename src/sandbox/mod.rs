//! Single-snippet execution: locate one runnable file in the workspace, run it
//! under its interpreter with a wall-clock timeout, bound and persist its output.
//!
//! Containment is limited to the timeout and per-stream output caps. There is
//! no filesystem or network isolation and no privilege dropping.

pub mod error;
pub mod executor;
pub mod locate;
pub mod registry;
pub mod report;
pub mod runner;

pub use error::SandboxError;
pub use executor::{ExecutionResult, build_command, execute};
pub use locate::{SnippetReference, locate};
pub use registry::{ExtensionRegistry, Interpreter, RegistryError};
pub use runner::{run_snippet, run_workspace};
