//! Plan executor.
//!
//! Runs plan steps strictly in order, logging each step's line before the step
//! starts, or after it succeeds for steps whose line reports a result. The
//! first failure stops the run; steps after it never start.

use tracing::{debug, warn};

use crate::error::{ProvisioningError, Result};

use super::backend::ProvisioningBackend;
use super::plan::ProvisioningPlan;
use super::result::DeploymentLog;

/// Receives step progress from a running plan.
pub trait StepObserver: Send + Sync {
    /// Called as a step starts.
    fn step_started(&self, deployment_id: &str, index: usize, total: usize);
}

/// Executor for provisioning plans.
pub struct PlanExecutor<'a> {
    backend: &'a dyn ProvisioningBackend,
    observer: Option<&'a dyn StepObserver>,
}

impl<'a> PlanExecutor<'a> {
    /// Creates an executor over a backend.
    #[must_use]
    pub const fn new(backend: &'a dyn ProvisioningBackend) -> Self {
        Self {
            backend,
            observer: None,
        }
    }

    /// Attaches a step observer.
    #[must_use]
    pub const fn with_observer(mut self, observer: Option<&'a dyn StepObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Runs every step of the plan.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::StepFailed`] for the first step that fails.
    /// The error line is already in the log when this returns.
    pub async fn run(&self, plan: &ProvisioningPlan, log: &DeploymentLog) -> Result<()> {
        let id = plan.context.deployment_id.as_str();
        let total = plan.len();
        debug!("[{id}] running {total} steps on {} backend", self.backend.name());

        for step in &plan.steps {
            let deferred = step.kind.logs_on_success();
            if !deferred {
                log.push(step.line.clone());
            }
            if let Some(observer) = self.observer {
                observer.step_started(id, step.index, total);
            }

            if let Err(e) = self.backend.apply(&plan.context, step).await {
                warn!("[{id}] step {} ({}) failed: {e}", step.index, step.kind);
                let err = ProvisioningError::StepFailed {
                    step: step.index,
                    title: step.kind.title().to_string(),
                    stage: step.kind.stage(),
                    message: e.to_string(),
                };
                log.push_error(&err);
                return Err(err.into());
            }
            if deferred {
                log.push(step.line.clone());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DeploymentConfig, WorkloadType};
    use crate::deploy::backend::MockProvisioningBackend;
    use crate::deploy::{AwsProfile, ERROR_LINE_PREFIX};
    use crate::error::{Instant8Error, ProviderApiError};
    use crate::progress::DeploymentStage;
    use crate::provider::Provider;
    use std::sync::Mutex;

    fn plan() -> ProvisioningPlan {
        let config = DeploymentConfig {
            os: String::from("Amazon Linux 2023"),
            cpu: String::from("2 cores"),
            ram: String::from("4GB"),
            storage: String::from("20GB SSD"),
            region: String::from("us-east-1"),
            workload: WorkloadType::ApiBackend,
        };
        ProvisioningPlan::build::<AwsProfile>(&config, "aws-9")
    }

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<(usize, usize)>>,
    }

    impl StepObserver for Recorder {
        fn step_started(&self, _deployment_id: &str, index: usize, total: usize) {
            self.seen.lock().unwrap().push((index, total));
        }
    }

    #[tokio::test]
    async fn test_runs_all_steps_in_order() {
        let mut backend = MockProvisioningBackend::new();
        backend.expect_name().return_const("mock");
        backend.expect_apply().times(9).returning(|_, _| Ok(()));

        let plan = plan();
        let log = DeploymentLog::new();
        let recorder = Recorder::default();
        PlanExecutor::new(&backend)
            .with_observer(Some(&recorder))
            .run(&plan, &log)
            .await
            .unwrap();

        let expected: Vec<String> = plan.steps.iter().map(|s| s.line.clone()).collect();
        assert_eq!(log.lines(), expected);
        let seen = recorder.seen.lock().unwrap().clone();
        assert_eq!(seen.first(), Some(&(1, 9)));
        assert_eq!(seen.last(), Some(&(9, 9)));
    }

    #[tokio::test]
    async fn test_auth_context_line_needs_success() {
        let mut backend = MockProvisioningBackend::new();
        backend.expect_name().return_const("mock");
        backend.expect_apply().times(1).returning(|_, _| {
            Err(Instant8Error::Api(ProviderApiError::Unauthorized {
                provider: Provider::Aws,
                message: String::from("expired token"),
            }))
        });

        let plan = plan();
        let log = DeploymentLog::new();
        let err = PlanExecutor::new(&backend).run(&plan, &log).await.unwrap_err();

        assert_eq!(err.stage(), Some(DeploymentStage::Authentication));
        let lines = log.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with(ERROR_LINE_PREFIX));
        assert!(!lines.iter().any(|l| l.contains("established")));
    }

    #[tokio::test]
    async fn test_failure_stops_run() {
        let mut backend = MockProvisioningBackend::new();
        backend.expect_name().return_const("mock");
        backend.expect_apply().returning(|_, step| {
            if step.index == 3 {
                Err(Instant8Error::Api(ProviderApiError::request_failed(
                    Provider::Aws,
                    500,
                    "capacity unavailable",
                )))
            } else {
                Ok(())
            }
        });

        let plan = plan();
        let log = DeploymentLog::new();
        let err = PlanExecutor::new(&backend).run(&plan, &log).await.unwrap_err();

        assert_eq!(err.stage(), Some(DeploymentStage::Compute));
        let lines = log.lines();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[..3], plan.steps[..3].iter().map(|s| s.line.clone()).collect::<Vec<_>>()[..]);
        assert!(lines[3].starts_with(ERROR_LINE_PREFIX));
        assert!(lines[3].contains("capacity unavailable"));
        assert!(log.ends_with_error());
    }
}
