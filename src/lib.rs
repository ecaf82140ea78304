//! snippet-runner - run the one code snippet in a workspace under a timeout
//!
//! This crate provides:
//! - Snippet location by registered file extension
//! - Child-process execution with wall-clock timeout and process-group kill
//! - Head-truncated stdout/stderr capture
//! - A persisted plain-text result artifact

pub mod cli;
pub mod config;
pub mod sandbox;

pub use config::{ExecutionLimits, RunnerConfig};
