//! Orchestrator settings.
//!
//! These settings map to `instant8.yaml` and control how deployments are
//! executed: against an in-process simulation or live provider APIs, how fast
//! simulated steps and the progress tracker move, and which fallback provider
//! receives tool-named requests.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ConfigError, Result};
use crate::provider::Provider;

/// Default Azure Resource Manager endpoint.
pub const AZURE_MANAGEMENT_ENDPOINT: &str = "https://management.azure.com";

/// Default Microsoft identity platform endpoint.
pub const AZURE_LOGIN_ENDPOINT: &str = "https://login.microsoftonline.com";

/// Resource Manager API version used for resource group calls.
pub const AZURE_RESOURCES_API_VERSION: &str = "2021-04-01";

/// Top-level orchestrator settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrchestratorSettings {
    /// Execution mode.
    #[serde(default)]
    pub mode: ExecutionMode,
    /// Provider used when the caller names an infrastructure tool.
    #[serde(default)]
    pub fallback_provider: Option<Provider>,
    /// Delay applied to each simulated provisioning step, in milliseconds.
    #[serde(default = "default_step_delay_ms")]
    pub step_delay_ms: u64,
    /// Deadline for a single deployment, in seconds.
    #[serde(default = "default_deploy_timeout_secs")]
    pub deploy_timeout_secs: u64,
    /// Progress tracker cadence.
    #[serde(default)]
    pub progress: ProgressSettings,
    /// Finished deployments kept for status queries.
    #[serde(default = "default_retained_deployments")]
    pub retained_deployments: usize,
    /// Azure-specific settings.
    #[serde(default)]
    pub azure: AzureSettings,
    /// AWS-specific settings.
    #[serde(default)]
    pub aws: AwsSettings,
}

/// How provisioning steps are executed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Steps run against an in-process backend; nothing remote is touched.
    #[default]
    Simulated,
    /// Azure resource groups are created through Resource Manager.
    Live,
}

/// Progress tracker cadence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgressSettings {
    /// Interval between progress ticks, in milliseconds.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Percentage added on each tick.
    #[serde(default = "default_increment")]
    pub increment: u8,
}

/// Azure-specific settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AzureSettings {
    /// Run a first-page resource group listing while validating credentials.
    #[serde(default)]
    pub smoke_test: bool,
    /// Resource Manager endpoint.
    #[serde(default = "default_management_endpoint")]
    pub management_endpoint: String,
    /// Identity platform endpoint.
    #[serde(default = "default_login_endpoint")]
    pub login_endpoint: String,
    /// Resource Manager API version.
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

/// AWS-specific settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AwsSettings {
    /// Run an S3 `ListBuckets` call while validating credentials.
    #[serde(default)]
    pub smoke_test: bool,
}

// Default value functions

const fn default_step_delay_ms() -> u64 {
    250
}

const fn default_deploy_timeout_secs() -> u64 {
    900
}

const fn default_retained_deployments() -> usize {
    256
}

const fn default_tick_ms() -> u64 {
    800
}

const fn default_increment() -> u8 {
    2
}

fn default_management_endpoint() -> String {
    String::from(AZURE_MANAGEMENT_ENDPOINT)
}

fn default_login_endpoint() -> String {
    String::from(AZURE_LOGIN_ENDPOINT)
}

fn default_api_version() -> String {
    String::from(AZURE_RESOURCES_API_VERSION)
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::default(),
            fallback_provider: None,
            step_delay_ms: default_step_delay_ms(),
            deploy_timeout_secs: default_deploy_timeout_secs(),
            progress: ProgressSettings::default(),
            retained_deployments: default_retained_deployments(),
            azure: AzureSettings::default(),
            aws: AwsSettings::default(),
        }
    }
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            increment: default_increment(),
        }
    }
}

impl Default for AzureSettings {
    fn default() -> Self {
        Self {
            smoke_test: false,
            management_endpoint: default_management_endpoint(),
            login_endpoint: default_login_endpoint(),
            api_version: default_api_version(),
        }
    }
}

impl OrchestratorSettings {
    /// Returns the simulated step delay.
    #[must_use]
    pub const fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    /// Returns the deployment deadline.
    #[must_use]
    pub const fn deploy_timeout(&self) -> Duration {
        Duration::from_secs(self.deploy_timeout_secs)
    }

    /// Checks values that would stall or break every deployment.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero progress tick or a zero deploy timeout.
    pub fn validate(&self) -> Result<()> {
        if self.progress.tick_ms == 0 {
            return Err(
                ConfigError::invalid_setting("progress.tick_ms", "must be greater than zero").into(),
            );
        }
        if self.deploy_timeout_secs == 0 {
            return Err(
                ConfigError::invalid_setting("deploy_timeout_secs", "must be greater than zero")
                    .into(),
            );
        }
        Ok(())
    }

    /// Returns true when live provider APIs are used.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(self.mode, ExecutionMode::Live)
    }
}

impl ProgressSettings {
    /// Returns the tick interval, never shorter than one millisecond.
    #[must_use]
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Simulated => f.write_str("simulated"),
            Self::Live => f.write_str("live"),
        }
    }
}
