//! Advisory validation of deployment requests.
//!
//! Deployment requests are never rejected for their content: unknown workload
//! types and regions fall back to generic steps and default locations. The
//! validator reports what will fall back so that callers and logs can show it.

use tracing::debug;

use crate::provider::Provider;

use super::spec::{DeploymentConfig, DEFAULT_CORES, DEFAULT_MEMORY_GB, DEFAULT_STORAGE_GB};

/// Validator for deployment requests.
#[derive(Debug, Default)]
pub struct ConfigValidator;

/// Severity of a validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The field is empty; the deployment will still run with defaults.
    Error,
    /// A fallback value will be used.
    Warning,
}

/// A single validation finding.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ValidationIssue {
    /// The field the finding refers to.
    pub field: String,
    /// Human-readable message.
    pub message: String,
    /// Severity of the finding.
    pub severity: Severity,
}

/// Validation report containing all findings.
#[derive(Debug, Default, serde::Serialize)]
pub struct ValidationReport {
    /// Findings in field order.
    pub issues: Vec<ValidationIssue>,
}

impl ConfigValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a deployment request for the given provider.
    #[must_use]
    pub fn validate(&self, config: &DeploymentConfig, provider: Provider) -> ValidationReport {
        let mut report = ValidationReport::default();

        for (field, value) in [
            ("os", &config.os),
            ("cpu", &config.cpu),
            ("ram", &config.ram),
            ("storage", &config.storage),
            ("region", &config.region),
        ] {
            if value.trim().is_empty() {
                report.push(field, format!("{field} is empty"), Severity::Error);
            }
        }

        if !config.cpu.trim().is_empty() && !has_digit(&config.cpu) {
            report.push(
                "cpu",
                format!("'{}' has no core count, using {DEFAULT_CORES} cores", config.cpu),
                Severity::Warning,
            );
        }

        if !config.ram.trim().is_empty() && !has_digit(&config.ram) {
            report.push(
                "ram",
                format!("'{}' has no size, using {DEFAULT_MEMORY_GB}GB", config.ram),
                Severity::Warning,
            );
        }

        if !config.storage.trim().is_empty() && !has_digit(&config.storage) {
            report.push(
                "storage",
                format!("'{}' has no size, using {DEFAULT_STORAGE_GB}GB", config.storage),
                Severity::Warning,
            );
        }

        if !config.workload.is_known() {
            report.push(
                "type",
                format!(
                    "Unknown workload type '{}', only generic provisioning steps will run",
                    config.workload
                ),
                Severity::Warning,
            );
        }

        let regions = crate::deploy::region_table(provider);
        if !config.region.trim().is_empty() && regions.lookup(&config.region).is_none() {
            report.push(
                "region",
                format!(
                    "Region '{}' is not mapped for {provider}, using default location {}",
                    config.region,
                    regions.default_location()
                ),
                Severity::Warning,
            );
        }

        debug!("Validation produced {} findings", report.issues.len());
        report
    }
}

impl ValidationReport {
    fn push(&mut self, field: &str, message: String, severity: Severity) {
        self.issues.push(ValidationIssue {
            field: field.to_string(),
            message,
            severity,
        });
    }

    /// Returns true if no error-level findings were produced.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        !self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    /// Returns the warning-level findings.
    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn has_digit(value: &str) -> bool {
    value.chars().any(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::spec::WorkloadType;

    fn sample() -> DeploymentConfig {
        DeploymentConfig {
            os: String::from("Ubuntu 22.04 LTS"),
            cpu: String::from("4 cores"),
            ram: String::from("8GB"),
            storage: String::from("50GB SSD"),
            region: String::from("us-east-1"),
            workload: WorkloadType::WebApplication,
        }
    }

    #[test]
    fn test_clean_config() {
        let report = ConfigValidator::new().validate(&sample(), Provider::Azure);
        assert!(report.is_clean());
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_unknown_region_and_type_are_warnings() {
        let mut config = sample();
        config.region = String::from("mars-north-1");
        config.workload = WorkloadType::Other(String::from("quantum"));

        let report = ConfigValidator::new().validate(&config, Provider::Azure);
        assert!(report.is_clean());
        assert_eq!(report.warnings().count(), 2);
        assert!(report.issues.iter().any(|i| i.message.contains("eastus")));
    }

    #[test]
    fn test_empty_fields_are_errors() {
        let mut config = sample();
        config.os = String::from("  ");
        let report = ConfigValidator::new().validate(&config, Provider::Gcp);
        assert!(!report.is_clean());
        assert_eq!(report.issues[0].field, "os");
    }
}
