//! Deployment log sink and result value.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::{Arc, Mutex, PoisonError};

/// Prefix that marks an error line in a deployment log.
pub const ERROR_LINE_PREFIX: &str = "❌ Error: ";

/// Ordered, human-readable deployment log.
///
/// Clones share the same lines, so a status reader can follow a deployment
/// while it runs.
#[derive(Debug, Clone, Default)]
pub struct DeploymentLog {
    lines: Arc<Mutex<Vec<String>>>,
}

/// Outcome of one deployment attempt.
///
/// A successful result always carries a URL and no error; a failed one always
/// carries an error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentResult {
    /// Whether the deployment succeeded.
    pub success: bool,
    /// Deployment identifier.
    pub deployment_id: String,
    /// Reachable endpoint, on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Failure message, on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Log lines in the order they were produced.
    pub logs: Vec<String>,
}

impl DeploymentLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a line.
    pub fn push(&self, line: impl Into<String>) {
        self.guard().push(line.into());
    }

    /// Appends an error line.
    pub fn push_error(&self, error: impl Display) {
        self.push(format!("{ERROR_LINE_PREFIX}{error}"));
    }

    /// Returns true if the last line is an error line.
    #[must_use]
    pub fn ends_with_error(&self) -> bool {
        self.guard()
            .last()
            .is_some_and(|line| line.starts_with(ERROR_LINE_PREFIX))
    }

    /// Returns a copy of the lines.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.guard().clone()
    }

    /// Number of lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.guard().len()
    }

    /// Returns true if nothing was logged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DeploymentResult {
    /// Creates a successful result.
    #[must_use]
    pub fn succeeded(deployment_id: impl Into<String>, url: impl Into<String>, logs: Vec<String>) -> Self {
        Self {
            success: true,
            deployment_id: deployment_id.into(),
            url: Some(url.into()),
            error: None,
            logs,
        }
    }

    /// Creates a failed result.
    #[must_use]
    pub fn failed(deployment_id: impl Into<String>, error: impl Into<String>, logs: Vec<String>) -> Self {
        Self {
            success: false,
            deployment_id: deployment_id.into(),
            url: None,
            error: Some(error.into()),
            logs,
        }
    }
}
