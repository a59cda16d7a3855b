//! Cloud provider identification and provider-name resolution.
//!
//! Callers name a target provider with a free-form string. This module turns
//! that string into a [`Provider`], handling the compatibility rule that an
//! infrastructure-as-code tool name resolves to a configured fallback cloud.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::info;

use crate::error::ConfigError;

/// A supported cloud provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Microsoft Azure.
    Azure,
    /// Amazon Web Services.
    Aws,
    /// Google Cloud Platform.
    Gcp,
}

/// Infrastructure-as-code tools callers sometimes pass instead of a cloud name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfraTool {
    /// Pulumi.
    Pulumi,
    /// Terraform / OpenTofu.
    Terraform,
    /// AWS `CloudFormation`.
    CloudFormation,
    /// Azure Bicep / ARM templates.
    Bicep,
}

/// Outcome of resolving a caller-supplied provider name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderSelection {
    /// The caller named a provider directly.
    Direct(Provider),
    /// The caller named a tool; the configured fallback provider was chosen.
    Fallback {
        /// Tool the caller named.
        tool: InfraTool,
        /// Provider used instead.
        provider: Provider,
    },
}

impl Provider {
    /// All supported providers, in dispatch order.
    pub const ALL: [Self; 3] = [Self::Azure, Self::Aws, Self::Gcp];

    /// Lowercase identifier, used as the deployment id prefix.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Azure => "azure",
            Self::Aws => "aws",
            Self::Gcp => "gcp",
        }
    }

    /// Human-facing name used in log lines and error messages.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Azure => "Azure",
            Self::Aws => "AWS",
            Self::Gcp => "GCP",
        }
    }

    /// Parses a provider name, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn parse_normalized(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "azure" => Some(Self::Azure),
            "aws" => Some(Self::Aws),
            "gcp" => Some(Self::Gcp),
            _ => None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Provider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_normalized(s).ok_or_else(|| ConfigError::UnsupportedProvider {
            name: s.trim().to_string(),
        })
    }
}

impl InfraTool {
    /// Parses a tool name, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn parse_normalized(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "pulumi" => Some(Self::Pulumi),
            "terraform" | "opentofu" => Some(Self::Terraform),
            "cloudformation" => Some(Self::CloudFormation),
            "bicep" | "arm" => Some(Self::Bicep),
            _ => None,
        }
    }
}

impl fmt::Display for InfraTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pulumi => "pulumi",
            Self::Terraform => "terraform",
            Self::CloudFormation => "cloudformation",
            Self::Bicep => "bicep",
        };
        f.write_str(name)
    }
}

impl ProviderSelection {
    /// Resolves a caller-supplied name into a provider.
    ///
    /// Tool names resolve to `fallback` when one is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is neither a provider nor a tool, or if it
    /// is a tool and no fallback is configured.
    pub fn resolve(name: &str, fallback: Option<Provider>) -> Result<Self, ConfigError> {
        if let Some(provider) = Provider::parse_normalized(name) {
            return Ok(Self::Direct(provider));
        }

        if let Some(tool) = InfraTool::parse_normalized(name) {
            return fallback.map_or_else(
                || {
                    Err(ConfigError::ToolWithoutFallback {
                        tool: tool.to_string(),
                    })
                },
                |provider| {
                    info!("'{tool}' is a tool name, deploying to fallback provider {provider}");
                    Ok(Self::Fallback { tool, provider })
                },
            );
        }

        Err(ConfigError::UnsupportedProvider {
            name: name.trim().to_string(),
        })
    }

    /// Returns the provider that will receive the deployment.
    #[must_use]
    pub const fn provider(self) -> Provider {
        match self {
            Self::Direct(provider) | Self::Fallback { provider, .. } => provider,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive_and_trimmed() {
        assert_eq!(Provider::parse_normalized("  AzUrE "), Some(Provider::Azure));
        assert_eq!(Provider::parse_normalized("AWS"), Some(Provider::Aws));
        assert_eq!(Provider::parse_normalized("\tgcp\n"), Some(Provider::Gcp));
        assert_eq!(Provider::parse_normalized("digitalocean"), None);
    }

    #[test]
    fn test_from_str_reports_unsupported_name() {
        let err = "  linode ".parse::<Provider>().unwrap_err();
        assert!(err.to_string().contains("'linode'"));
    }

    #[test]
    fn test_tool_name_uses_fallback() {
        let selection = ProviderSelection::resolve("Pulumi", Some(Provider::Azure)).unwrap();
        assert_eq!(
            selection,
            ProviderSelection::Fallback {
                tool: InfraTool::Pulumi,
                provider: Provider::Azure,
            }
        );
        assert_eq!(selection.provider(), Provider::Azure);
    }

    #[test]
    fn test_tool_name_without_fallback_is_rejected() {
        let err = ProviderSelection::resolve("terraform", None).unwrap_err();
        assert!(matches!(err, ConfigError::ToolWithoutFallback { .. }));
    }

    #[test]
    fn test_unknown_name_is_rejected_even_with_fallback() {
        let err = ProviderSelection::resolve("oracle", Some(Provider::Gcp)).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedProvider { .. }));
    }
}
