//! Output formatting for CLI commands.
//!
//! Every formatter returns a `String`; the binary decides where it goes.

use colored::Colorize;
use serde::Serialize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::auth::ProviderAuthenticator;
use crate::config::{Severity, ValidationReport};
use crate::credentials::CredentialSet;
use crate::deploy::{DeploymentResult, ERROR_LINE_PREFIX, region_table};
use crate::progress::{StepBoard, StepStatus};
use crate::provider::Provider;

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Result of checking one provider's credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialCheck {
    /// Provider checked.
    pub provider: Provider,
    /// Whether a bundle was found.
    pub present: bool,
    /// Whether the bundle passed validation.
    pub valid: bool,
    /// Error raised while validating, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CredentialCheck {
    /// Validates one provider's bundle.
    ///
    /// An authenticator error marks this provider invalid and is kept on the
    /// check instead of being returned.
    pub async fn run(
        authenticator: &dyn ProviderAuthenticator,
        credentials: &CredentialSet,
    ) -> Self {
        let provider = authenticator.provider();
        let (valid, error) = match authenticator.validate(credentials).await {
            Ok(valid) => (valid, None),
            Err(e) => (false, Some(e.to_string())),
        };
        Self {
            provider,
            present: credentials.bundle(provider).is_some(),
            valid,
            error,
        }
    }
}

/// Region row for table display.
#[derive(Tabled)]
struct RegionRow {
    #[tabled(rename = "Provider")]
    provider: String,
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "Location")]
    location: String,
}

/// Credential row for table display.
#[derive(Tabled)]
struct CredentialRow {
    #[tabled(rename = "Provider")]
    provider: String,
    #[tabled(rename = "Bundle")]
    present: String,
    #[tabled(rename = "Status")]
    status: String,
}

/// Validation finding row for table display.
#[derive(Tabled)]
struct IssueRow {
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Message")]
    message: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a deployment result.
    #[must_use]
    pub fn format_result(&self, result: &DeploymentResult) -> String {
        match self.format {
            OutputFormat::Json => to_json(result),
            OutputFormat::Text => Self::format_result_text(result),
        }
    }

    fn format_result_text(result: &DeploymentResult) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "\n🚀 Deployment {}\n", result.deployment_id.bold());

        for line in &result.logs {
            if line.starts_with(ERROR_LINE_PREFIX) {
                let _ = writeln!(output, "   {}", line.red());
            } else {
                let _ = writeln!(output, "   {line}");
            }
        }

        if result.success {
            let _ = write!(
                output,
                "\n{} Endpoint: {}\n",
                "✓".green(),
                result.url.as_deref().unwrap_or_default().cyan()
            );
        } else {
            let _ = write!(
                output,
                "\n{} {}\n",
                "✗".red(),
                result.error.as_deref().unwrap_or("deployment failed")
            );
        }
        output
    }

    /// Formats a validation report.
    #[must_use]
    pub fn format_validation(&self, provider: Provider, report: &ValidationReport) -> String {
        match self.format {
            OutputFormat::Json => to_json(&serde_json::json!({
                "provider": provider,
                "clean": report.is_clean(),
                "issues": report.issues,
            })),
            OutputFormat::Text => Self::format_validation_text(provider, report),
        }
    }

    fn format_validation_text(provider: Provider, report: &ValidationReport) -> String {
        if report.issues.is_empty() {
            return format!("{} Request is valid for {provider}\n", "✓".green());
        }

        let rows: Vec<IssueRow> = report
            .issues
            .iter()
            .map(|issue| IssueRow {
                severity: match issue.severity {
                    Severity::Error => "error".red().to_string(),
                    Severity::Warning => "warning".yellow().to_string(),
                },
                field: issue.field.clone(),
                message: Self::truncate(&issue.message, 70),
            })
            .collect();

        let mut output = format!("\n📋 Validation for {provider}\n\n");
        output.push_str(&Table::new(rows).to_string());
        output.push('\n');
        let _ = write!(
            output,
            "\n{} error(s), {} warning(s)\n",
            report.issues.len() - report.warnings().count(),
            report.warnings().count()
        );
        output
    }

    /// Formats region tables for the given providers.
    #[must_use]
    pub fn format_regions(&self, providers: &[Provider]) -> String {
        let rows: Vec<RegionRow> = providers
            .iter()
            .flat_map(|&provider| {
                let table = region_table(provider);
                table
                    .entries()
                    .iter()
                    .map(move |(region, location)| RegionRow {
                        provider: provider.to_string(),
                        region: (*region).to_string(),
                        location: (*location).to_string(),
                    })
                    .chain(std::iter::once(RegionRow {
                        provider: provider.to_string(),
                        region: String::from("(default)"),
                        location: table.default_location().to_string(),
                    }))
            })
            .collect();

        match self.format {
            OutputFormat::Json => to_json(
                &rows
                    .iter()
                    .map(|r| {
                        serde_json::json!({
                            "provider": r.provider,
                            "region": r.region,
                            "location": r.location,
                        })
                    })
                    .collect::<Vec<_>>(),
            ),
            OutputFormat::Text => format!("{}\n", Table::new(rows)),
        }
    }

    /// Formats credential checks.
    #[must_use]
    pub fn format_credentials(&self, checks: &[CredentialCheck]) -> String {
        match self.format {
            OutputFormat::Json => to_json(&checks),
            OutputFormat::Text => {
                let rows: Vec<CredentialRow> = checks
                    .iter()
                    .map(|c| CredentialRow {
                        provider: c.provider.to_string(),
                        present: if c.present { "yes" } else { "no" }.to_string(),
                        status: match (c.present, c.valid, &c.error) {
                            (_, true, _) => "valid".green().to_string(),
                            (_, false, Some(e)) => format!("error: {}", Self::truncate(e, 60))
                                .red()
                                .to_string(),
                            (true, false, None) => "invalid".red().to_string(),
                            (false, false, None) => "missing".dimmed().to_string(),
                        },
                    })
                    .collect();
                format!("{}\n", Table::new(rows))
            }
        }
    }

    /// Formats the step board.
    #[must_use]
    pub fn format_board(&self, board: &StepBoard) -> String {
        match self.format {
            OutputFormat::Json => to_json(board),
            OutputFormat::Text => {
                let mut output = format!("\nProgress: {}%\n", board.percent());
                for step in board.steps() {
                    let marker = match step.status {
                        StepStatus::Pending => "○".dimmed().to_string(),
                        StepStatus::Running => "◐".yellow().to_string(),
                        StepStatus::Completed => "●".green().to_string(),
                        StepStatus::Error => "✗".red().to_string(),
                    };
                    let _ = writeln!(output, "  {marker} {}. {}", step.id, step.title);
                }
                output
            }
        }
    }

    /// Truncates a string to a maximum number of characters.
    fn truncate(s: &str, max_len: usize) -> String {
        if s.chars().count() <= max_len {
            s.to_string()
        } else {
            let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
            format!("{head}...")
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigValidator, DeploymentConfig, WorkloadType};

    #[test]
    fn test_result_json_is_camel_case() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let result = DeploymentResult::succeeded(
            "azure-1",
            "https://webapplication-azure-1.azurewebsites.net",
            vec![String::from("🔄 Initializing Azure deployment...")],
        );
        let json: serde_json::Value = serde_json::from_str(&formatter.format_result(&result)).unwrap();
        assert_eq!(json["deploymentId"], "azure-1");
        assert_eq!(json["success"], true);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_failed_result_text_shows_error() {
        colored::control::set_override(false);
        let formatter = OutputFormatter::new(OutputFormat::Text);
        let result = DeploymentResult::failed(
            "aws-1",
            "Invalid or missing credentials for AWS",
            vec![format!("{ERROR_LINE_PREFIX}Invalid or missing credentials for AWS")],
        );
        let text = formatter.format_result(&result);
        assert!(text.contains("aws-1"));
        assert!(text.contains("✗ Invalid or missing credentials for AWS"));
    }

    #[test]
    fn test_regions_include_defaults() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let json: serde_json::Value =
            serde_json::from_str(&formatter.format_regions(&[Provider::Gcp])).unwrap();
        let rows = json.as_array().unwrap();
        assert!(rows.iter().any(|r| r["region"] == "(default)" && r["location"] == "us-central1"));
        assert!(rows.iter().all(|r| r["provider"] == "GCP"));
    }

    #[test]
    fn test_validation_text_counts() {
        colored::control::set_override(false);
        let config = DeploymentConfig {
            os: String::new(),
            cpu: String::from("lots"),
            ram: String::from("8GB"),
            storage: String::from("50GB"),
            region: String::from("us-east-1"),
            workload: WorkloadType::Database,
        };
        let report = ConfigValidator::new().validate(&config, Provider::Aws);
        let text = OutputFormatter::new(OutputFormat::Text).format_validation(Provider::Aws, &report);
        assert!(text.contains("1 error(s), 1 warning(s)"));
    }

    #[tokio::test]
    async fn test_credential_error_does_not_stop_report() {
        use crate::auth::{Authenticators, MockProviderAuthenticator};
        use crate::config::OrchestratorSettings;
        use crate::error::{AuthError, Instant8Error};
        use std::sync::Arc;

        colored::control::set_override(false);
        let mut failing = MockProviderAuthenticator::new();
        failing.expect_provider().return_const(Provider::Azure);
        failing.expect_validate().returning(|_| {
            Err(Instant8Error::Auth(AuthError::Rejected {
                provider: Provider::Azure,
                message: String::from("AADSTS7000215"),
            }))
        });
        let env: crate::config::EnvLookup = Arc::new(|_| None);
        let mut authenticators = Authenticators::from_settings(&OrchestratorSettings::default(), env);
        authenticators.replace(Arc::new(failing));

        let credentials = CredentialSet::new();
        let mut checks = Vec::new();
        for provider in Provider::ALL {
            let authenticator = authenticators.for_provider(provider).as_ref();
            checks.push(CredentialCheck::run(authenticator, &credentials).await);
        }

        assert_eq!(checks.len(), 3);
        assert!(!checks[0].valid);
        assert!(checks[0].error.as_deref().unwrap().contains("AADSTS7000215"));
        assert_eq!(checks[1].provider, Provider::Aws);
        assert!(checks[1].error.is_none());

        let text = OutputFormatter::new(OutputFormat::Text).format_credentials(&checks);
        assert!(text.contains("error: "));
        assert!(text.contains("missing"));
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(OutputFormatter::truncate("héllo wörld", 8), "héllo...");
        assert_eq!(OutputFormatter::truncate("short", 8), "short");
    }
}
