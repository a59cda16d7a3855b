//! Error types for the Instant8 deployment orchestrator.
//!
//! This module provides the error hierarchy for every stage of a deployment
//! attempt: configuration, credentials, authentication, provisioning, and the
//! provider REST clients underneath them.

use std::path::PathBuf;
use thiserror::Error;

use crate::progress::DeploymentStage;
use crate::provider::Provider;

/// The main error type for the Instant8 orchestrator.
#[derive(Debug, Error)]
pub enum Instant8Error {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Credential bundle errors.
    #[error("{0}")]
    Credential(#[from] CredentialError),

    /// Provider authentication errors.
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Provisioning errors.
    #[error("Provisioning error: {0}")]
    Provisioning(#[from] ProvisioningError),

    /// Provider API errors.
    #[error("{0}")]
    Api(#[from] ProviderApiError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of failures surfaced in a deployment result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Unsupported provider, malformed settings or credential bundle.
    Configuration,
    /// Credentials present but rejected by the provider.
    Authentication,
    /// A provisioning step failed.
    Provisioning,
    /// Anything else.
    Internal,
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("Configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// A setting holds an invalid value.
    #[error("Invalid setting '{field}': {message}")]
    InvalidSetting {
        /// Setting that failed validation.
        field: String,
        /// Description of the problem.
        message: String,
    },

    /// The requested provider is not supported.
    #[error("Unsupported cloud provider '{name}'. Supported providers: azure, aws, gcp")]
    UnsupportedProvider {
        /// Provider name as supplied by the caller.
        name: String,
    },

    /// A tooling name was given but no fallback provider is configured.
    #[error("'{tool}' is an infrastructure tool, not a cloud provider, and no fallback provider is configured")]
    ToolWithoutFallback {
        /// Tool name as supplied by the caller.
        tool: String,
    },
}

/// Credential bundle errors.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Credentials are missing or fail the well-formedness rules.
    #[error("Invalid or missing credentials for {provider}")]
    Invalid {
        /// Provider whose credentials were rejected.
        provider: Provider,
    },

    /// Persisted credential data could not be parsed.
    #[error("Malformed persisted credentials in {source_name}: {message}")]
    Malformed {
        /// Name of the credential source.
        source_name: String,
        /// Description of the parse failure.
        message: String,
    },
}

/// Provider authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A provider-native authentication handle could not be built.
    #[error("{provider} authentication handle could not be created: {message}")]
    HandleConstruction {
        /// Provider being authenticated.
        provider: Provider,
        /// Description of the failure.
        message: String,
    },

    /// The provider rejected the credentials.
    #[error("{provider} rejected the supplied credentials: {message}")]
    Rejected {
        /// Provider that rejected the credentials.
        provider: Provider,
        /// Provider-supplied reason.
        message: String,
    },
}

/// Provisioning errors.
#[derive(Debug, Error)]
pub enum ProvisioningError {
    /// A provisioning step failed.
    #[error("step {step} ({title}) failed: {message}")]
    StepFailed {
        /// One-based index of the failing step.
        step: usize,
        /// Short title of the failing step.
        title: String,
        /// Deployment stage the step belongs to.
        stage: DeploymentStage,
        /// Underlying failure.
        message: String,
    },

    /// The provider client could not be initialized.
    #[error("{provider} client is not initialized: {message}")]
    ClientUnavailable {
        /// Provider whose client is unavailable.
        provider: Provider,
        /// Description of the failure.
        message: String,
    },

    /// The deployment exceeded its deadline.
    #[error("deployment {deployment_id} exceeded its {timeout_secs}s deadline")]
    Timeout {
        /// Deployment that timed out.
        deployment_id: String,
        /// Configured deadline.
        timeout_secs: u64,
    },
}

/// Errors raised by the provider REST and SDK clients.
#[derive(Debug, Error)]
pub enum ProviderApiError {
    /// The API answered 401 or 403.
    #[error("{provider} API rejected the request as unauthorized: {message}")]
    Unauthorized {
        /// Provider that answered.
        provider: Provider,
        /// Response body or reason.
        message: String,
    },

    /// API request failed.
    #[error("{provider} API request failed: {status} - {message}")]
    RequestFailed {
        /// Provider that answered.
        provider: Provider,
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// Rate limited.
    #[error("{provider} API rate limited, retry after {retry_after_secs} seconds")]
    RateLimited {
        /// Provider that answered.
        provider: Provider,
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// Network error.
    #[error("Network error communicating with {provider}: {message}")]
    Network {
        /// Provider being contacted.
        provider: Provider,
        /// Description of the network error.
        message: String,
    },

    /// Invalid response from the API.
    #[error("Invalid response from {provider} API: {message}")]
    InvalidResponse {
        /// Provider that answered.
        provider: Provider,
        /// Description of the response issue.
        message: String,
    },
}

/// Result type alias for Instant8 operations.
pub type Result<T> = std::result::Result<T, Instant8Error>;

impl Instant8Error {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if this error is retryable at the transport level.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Api(ProviderApiError::RateLimited { .. } | ProviderApiError::Network { .. })
        )
    }

    /// Returns the suggested retry delay in seconds, if applicable.
    #[must_use]
    pub const fn retry_delay_secs(&self) -> Option<u64> {
        match self {
            Self::Api(ProviderApiError::RateLimited { retry_after_secs, .. }) => {
                Some(*retry_after_secs)
            }
            Self::Api(ProviderApiError::Network { .. }) => Some(1),
            _ => None,
        }
    }

    /// Maps this error onto the failure taxonomy reported to callers.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_) | Self::Credential(_) => ErrorCategory::Configuration,
            Self::Auth(_) | Self::Api(ProviderApiError::Unauthorized { .. }) => {
                ErrorCategory::Authentication
            }
            Self::Provisioning(_) | Self::Api(_) => ErrorCategory::Provisioning,
            Self::Io(_) | Self::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Returns the deployment stage at which this error occurred, if known.
    #[must_use]
    pub const fn stage(&self) -> Option<DeploymentStage> {
        match self {
            Self::Config(_) => Some(DeploymentStage::Validation),
            Self::Credential(_) | Self::Auth(_) => Some(DeploymentStage::Authentication),
            Self::Provisioning(ProvisioningError::StepFailed { stage, .. }) => Some(*stage),
            Self::Provisioning(ProvisioningError::ClientUnavailable { .. })
            | Self::Api(ProviderApiError::Unauthorized { .. }) => {
                Some(DeploymentStage::Authentication)
            }
            _ => None,
        }
    }
}

impl ConfigError {
    /// Creates an invalid-setting error for a specific field.
    #[must_use]
    pub fn invalid_setting(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSetting {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl ProviderApiError {
    /// Creates an API request error.
    #[must_use]
    pub fn request_failed(provider: Provider, status: u16, message: impl Into<String>) -> Self {
        Self::RequestFailed {
            provider,
            status,
            message: message.into(),
        }
    }

    /// Creates a network error.
    #[must_use]
    pub fn network(provider: Provider, message: impl Into<String>) -> Self {
        Self::Network {
            provider,
            message: message.into(),
        }
    }
}
