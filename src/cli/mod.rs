//! CLI module for the Instant8 deployment tool.
//!
//! This module provides the command-line driver around the orchestrator.

mod commands;
mod output;

pub use commands::{Cli, Commands, LogFormat, OutputFormat};
pub use output::{CredentialCheck, OutputFormatter};
