//! In-memory deployment status registry.
//!
//! Every attempt is registered under its id as soon as the id exists. The
//! phase only moves forward: pending, running, then completed or failed.
//! Only the most recent finished deployments are kept; running ones are never
//! evicted.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

use crate::config::OrchestratorSettings;
use crate::deploy::{DeploymentLog, StepObserver};
use crate::provider::Provider;

/// Lifecycle phase of a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentPhase {
    /// Registered, not yet dispatched.
    Pending,
    /// Dispatched to a deployer.
    Running,
    /// Finished successfully.
    Completed,
    /// Finished with an error.
    Failed,
}

impl DeploymentPhase {
    /// Returns true for completed and failed.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Point-in-time view of one deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentStatusReport {
    /// Deployment identifier.
    pub deployment_id: String,
    /// Target provider; absent when the name did not resolve.
    pub provider: Option<Provider>,
    /// Current phase.
    pub status: DeploymentPhase,
    /// Percentage of plan steps started, 100 once completed.
    pub progress: u8,
    /// Log lines so far.
    pub logs: Vec<String>,
    /// Endpoint, once completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Failure message, once failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Registration time.
    pub started_at: DateTime<Utc>,
    /// Time the deployment reached a terminal phase.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct Entry {
    provider: Option<Provider>,
    phase: DeploymentPhase,
    progress: u8,
    log: DeploymentLog,
    url: Option<String>,
    error: Option<String>,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn advance(&mut self, id: &str, phase: DeploymentPhase) -> bool {
        if self.phase.is_terminal() || phase <= self.phase {
            debug!("[{id}] ignoring {:?} -> {phase:?}", self.phase);
            return false;
        }
        self.phase = phase;
        if phase.is_terminal() {
            self.finished_at = Some(Utc::now());
        }
        true
    }
}

#[derive(Debug, Default)]
struct Entries {
    by_id: HashMap<String, Entry>,
    /// Finished ids, oldest first.
    finished: VecDeque<String>,
}

impl Entries {
    fn finish(&mut self, deployment_id: &str, retain: usize) {
        self.finished.push_back(deployment_id.to_string());
        while self.finished.len() > retain {
            if let Some(old) = self.finished.pop_front() {
                debug!("[{old}] evicted from status registry");
                self.by_id.remove(&old);
            }
        }
    }
}

/// Tracks deployments by id.
#[derive(Debug)]
pub struct DeploymentRegistry {
    entries: Mutex<Entries>,
    retain_finished: usize,
}

impl DeploymentRegistry {
    /// Creates an empty registry with the default retention.
    #[must_use]
    pub fn new() -> Self {
        Self::with_retention(OrchestratorSettings::default().retained_deployments)
    }

    /// Creates an empty registry keeping at most `retain_finished` finished
    /// deployments, and always at least one.
    #[must_use]
    pub fn with_retention(retain_finished: usize) -> Self {
        Self {
            entries: Mutex::new(Entries::default()),
            retain_finished: retain_finished.max(1),
        }
    }

    /// Number of deployments currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.guard().by_id.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.guard().by_id.is_empty()
    }

    /// Registers a pending deployment that writes to `log`.
    pub fn register(&self, deployment_id: &str, provider: Option<Provider>, log: DeploymentLog) {
        self.guard().by_id.insert(
            deployment_id.to_string(),
            Entry {
                provider,
                phase: DeploymentPhase::Pending,
                progress: 0,
                log,
                url: None,
                error: None,
                started_at: Utc::now(),
                finished_at: None,
            },
        );
    }

    /// Moves a deployment to running.
    pub fn mark_running(&self, deployment_id: &str) {
        if let Some(entry) = self.guard().by_id.get_mut(deployment_id) {
            entry.advance(deployment_id, DeploymentPhase::Running);
        }
    }

    /// Moves a deployment to completed.
    pub fn complete(&self, deployment_id: &str, url: Option<String>) {
        let mut entries = self.guard();
        let Some(entry) = entries.by_id.get_mut(deployment_id) else {
            return;
        };
        if entry.advance(deployment_id, DeploymentPhase::Completed) {
            entry.progress = 100;
            entry.url = url;
            entries.finish(deployment_id, self.retain_finished);
        }
    }

    /// Moves a deployment to failed.
    pub fn fail(&self, deployment_id: &str, error: impl Into<String>) {
        let mut entries = self.guard();
        let Some(entry) = entries.by_id.get_mut(deployment_id) else {
            return;
        };
        if entry.advance(deployment_id, DeploymentPhase::Failed) {
            entry.error = Some(error.into());
            entries.finish(deployment_id, self.retain_finished);
        }
    }

    /// Returns the current view of a deployment, or `None` for unknown ids.
    #[must_use]
    pub fn get(&self, deployment_id: &str) -> Option<DeploymentStatusReport> {
        self.guard()
            .by_id
            .get(deployment_id)
            .map(|entry| DeploymentStatusReport {
                deployment_id: deployment_id.to_string(),
                provider: entry.provider,
                status: entry.phase,
                progress: entry.progress,
                logs: entry.log.lines(),
                url: entry.url.clone(),
                error: entry.error.clone(),
                started_at: entry.started_at,
                finished_at: entry.finished_at,
            })
    }

    fn guard(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for DeploymentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StepObserver for DeploymentRegistry {
    fn step_started(&self, deployment_id: &str, index: usize, total: usize) {
        if total == 0 {
            return;
        }
        if let Some(entry) = self.guard().by_id.get_mut(deployment_id) {
            if entry.phase != DeploymentPhase::Running {
                return;
            }
            let done = index.saturating_sub(1) * 100 / total;
            let percent = u8::try_from(done.min(99)).unwrap_or(99);
            entry.progress = entry.progress.max(percent);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_is_monotonic() {
        let registry = DeploymentRegistry::new();
        let log = DeploymentLog::new();
        registry.register("azure-1", Some(Provider::Azure), log.clone());
        assert_eq!(registry.get("azure-1").unwrap().status, DeploymentPhase::Pending);

        registry.mark_running("azure-1");
        log.push("step one");
        registry.step_started("azure-1", 5, 9);
        let running = registry.get("azure-1").unwrap();
        assert_eq!(running.status, DeploymentPhase::Running);
        assert_eq!(running.progress, 44);
        assert_eq!(running.logs, vec![String::from("step one")]);

        registry.complete("azure-1", Some(String::from("https://x.azurewebsites.net")));
        registry.fail("azure-1", "late failure");
        registry.mark_running("azure-1");

        let done = registry.get("azure-1").unwrap();
        assert_eq!(done.status, DeploymentPhase::Completed);
        assert_eq!(done.progress, 100);
        assert!(done.error.is_none());
        assert!(done.finished_at.is_some());
    }

    #[test]
    fn test_failure_keeps_progress() {
        let registry = DeploymentRegistry::new();
        registry.register("aws-1", Some(Provider::Aws), DeploymentLog::new());
        registry.mark_running("aws-1");
        registry.step_started("aws-1", 3, 6);
        registry.fail("aws-1", "boom");

        let report = registry.get("aws-1").unwrap();
        assert_eq!(report.status, DeploymentPhase::Failed);
        assert_eq!(report.progress, 33);
        assert_eq!(report.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_unknown_id_is_none() {
        let registry = DeploymentRegistry::new();
        assert!(registry.get("gcp-404").is_none());
        registry.mark_running("gcp-404");
        assert!(registry.get("gcp-404").is_none());
    }

    #[test]
    fn test_finished_deployments_are_bounded() {
        let registry = DeploymentRegistry::with_retention(3);
        registry.register("aws-0", Some(Provider::Aws), DeploymentLog::new());
        registry.mark_running("aws-0");

        for i in 1..=5 {
            let id = format!("unknown-{i}");
            registry.register(&id, None, DeploymentLog::new());
            registry.fail(&id, "Unsupported cloud provider 'oracle'");
        }

        assert_eq!(registry.len(), 4);
        assert!(registry.get("unknown-1").is_none());
        assert!(registry.get("unknown-2").is_none());
        assert!(registry.get("unknown-5").is_some());
        assert_eq!(registry.get("aws-0").unwrap().status, DeploymentPhase::Running);

        registry.complete("aws-0", Some(String::from("https://x.elb.amazonaws.com")));
        assert_eq!(registry.len(), 3);
        assert!(registry.get("unknown-3").is_none());
        assert_eq!(registry.get("aws-0").unwrap().status, DeploymentPhase::Completed);
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let registry = DeploymentRegistry::new();
        registry.register("gcp-1", Some(Provider::Gcp), DeploymentLog::new());
        let json = serde_json::to_value(registry.get("gcp-1").unwrap()).unwrap();
        assert_eq!(json["deploymentId"], "gcp-1");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["provider"], "gcp");
        assert!(json.get("finishedAt").is_none());
    }
}
