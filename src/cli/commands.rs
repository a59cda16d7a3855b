//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Instant8 - deploy one infrastructure request to Azure, AWS or GCP.
#[derive(Parser, Debug)]
#[command(name = "instant8")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the orchestrator settings file.
    #[arg(short, long, global = true, env = "INSTANT8_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Diagnostic log format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub log_format: LogFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Deploy a request to a provider.
    Deploy {
        /// Deployment request file (YAML or JSON).
        #[arg(short, long)]
        config: PathBuf,

        /// Provider name (azure, aws, gcp) or tool name.
        #[arg(short, long)]
        provider: String,

        /// Exported environment-variable records to read credentials from.
        #[arg(long, env = "INSTANT8_CREDENTIALS")]
        credentials: Option<PathBuf>,

        /// Show the step board when the deployment ends.
        #[arg(long)]
        progress: bool,
    },

    /// Validate a deployment request for a provider.
    Validate {
        /// Deployment request file (YAML or JSON).
        #[arg(short, long)]
        config: PathBuf,

        /// Provider name (azure, aws, gcp) or tool name.
        #[arg(short, long, default_value = "azure")]
        provider: String,
    },

    /// Show which provider credentials are available and usable.
    Credentials {
        /// Exported environment-variable records to read credentials from.
        #[arg(long, env = "INSTANT8_CREDENTIALS")]
        credentials: Option<PathBuf>,
    },

    /// List region mappings.
    Regions {
        /// Only show this provider.
        provider: Option<String>,
    },
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// Diagnostic log format options.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}
