//! Deployment orchestration.
//!
//! The [`DeploymentOrchestrator`] is the single entry point for deployments.
//! It resolves the provider name, validates credentials, dispatches to the
//! matching deployer under a deadline and converts every failure into a
//! [`DeploymentResult`] value. Nothing below this layer is retried.

mod id;
mod registry;

use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::auth::{Authenticators, ProviderAuthenticator};
use crate::config::{ConfigValidator, DeploymentConfig, EnvLookup, OrchestratorSettings, process_env};
use crate::credentials::CredentialStore;
use crate::deploy::{DeploymentLog, DeploymentResult, Deployers, ProviderDeployer, StepObserver};
use crate::error::{CredentialError, Instant8Error, ProvisioningError, Result};
use crate::progress::{DeploymentStage, ProgressTracker, TrackerOutcome};
use crate::provider::{Provider, ProviderSelection};

pub use id::{Clock, DeploymentIdGenerator, FixedClock, SystemClock};
pub use registry::{DeploymentPhase, DeploymentRegistry, DeploymentStatusReport};

/// Id prefix used when the provider name did not resolve.
const UNRESOLVED_PREFIX: &str = "unknown";

/// Facade over credentials, authenticators and deployers.
pub struct DeploymentOrchestrator {
    settings: OrchestratorSettings,
    credentials: Arc<CredentialStore>,
    authenticators: Authenticators,
    deployers: Deployers,
    registry: DeploymentRegistry,
    ids: DeploymentIdGenerator,
    clock: Arc<dyn Clock>,
    validator: ConfigValidator,
    deploy_timeout: Duration,
}

impl DeploymentOrchestrator {
    /// Creates an orchestrator reading provider variables from the process
    /// environment.
    #[must_use]
    pub fn new(settings: OrchestratorSettings, credentials: Arc<CredentialStore>) -> Self {
        let env = process_env();
        Self {
            authenticators: Authenticators::from_settings(&settings, Arc::clone(&env)),
            deployers: Deployers::from_settings(&settings, env),
            deploy_timeout: settings.deploy_timeout(),
            registry: DeploymentRegistry::with_retention(settings.retained_deployments),
            settings,
            credentials,
            ids: DeploymentIdGenerator::new(),
            clock: Arc::new(SystemClock),
            validator: ConfigValidator::new(),
        }
    }

    /// Rebuilds the standard authenticators and deployers over `env`.
    ///
    /// Call before any `with_deployer` or `with_authenticator` override.
    #[must_use]
    pub fn with_env(mut self, env: EnvLookup) -> Self {
        self.authenticators = Authenticators::from_settings(&self.settings, Arc::clone(&env));
        self.deployers = Deployers::from_settings(&self.settings, env);
        self
    }

    /// Replaces the deployer for the provider it reports.
    #[must_use]
    pub fn with_deployer(mut self, deployer: Arc<dyn ProviderDeployer>) -> Self {
        self.deployers.replace(deployer);
        self
    }

    /// Replaces the authenticator for the provider it reports.
    #[must_use]
    pub fn with_authenticator(mut self, authenticator: Arc<dyn ProviderAuthenticator>) -> Self {
        self.authenticators.replace(authenticator);
        self
    }

    /// Replaces the clock used for deployment ids.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Overrides the per-deployment deadline.
    #[must_use]
    pub const fn with_deploy_timeout(mut self, timeout: Duration) -> Self {
        self.deploy_timeout = timeout;
        self
    }

    /// The shared credential store.
    #[must_use]
    pub const fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    /// Deploys `config` to the provider named by `provider_name`.
    ///
    /// Never fails: every error becomes a result with `success == false`,
    /// carrying the log lines produced before the failure.
    pub async fn deploy_to_provider(
        &self,
        config: &DeploymentConfig,
        provider_name: &str,
    ) -> DeploymentResult {
        self.execute(config, provider_name).await.0
    }

    /// Deploys while driving `tracker`, then reconciles it with the outcome.
    pub async fn deploy_tracked(
        &self,
        config: &DeploymentConfig,
        provider_name: &str,
        tracker: &mut ProgressTracker,
    ) -> DeploymentResult {
        tracker.start();
        let (result, failed_at) = self.execute(config, provider_name).await;
        tracker.finish(if result.success {
            TrackerOutcome::Success
        } else {
            TrackerOutcome::Failure(failed_at)
        });
        result
    }

    /// Returns the status of a deployment, or `None` for unknown ids.
    #[must_use]
    pub fn get_deployment_status(&self, deployment_id: &str) -> Option<DeploymentStatusReport> {
        self.registry.get(deployment_id)
    }

    async fn execute(
        &self,
        config: &DeploymentConfig,
        provider_name: &str,
    ) -> (DeploymentResult, Option<DeploymentStage>) {
        let log = DeploymentLog::new();
        let selection = ProviderSelection::resolve(provider_name, self.settings.fallback_provider);
        let provider = selection.as_ref().ok().map(|s| s.provider());

        let prefix = provider.map_or(UNRESOLVED_PREFIX, Provider::as_str);
        let deployment_id = self.ids.next(prefix, self.clock.as_ref());
        self.registry.register(&deployment_id, provider, log.clone());

        let outcome = match selection {
            Ok(selection) => self.run(config, selection.provider(), &deployment_id, &log).await,
            Err(e) => Err(e.into()),
        };

        match outcome {
            Ok(result) => {
                info!("[{deployment_id}] deployment succeeded: {:?}", result.url);
                self.registry.complete(&deployment_id, result.url.clone());
                (result, None)
            }
            Err(err) => {
                if !log.ends_with_error() {
                    log.push_error(&err);
                }
                let message = err.to_string();
                error!(
                    category = ?err.category(),
                    "[{deployment_id}] deployment failed: {message}"
                );
                self.registry.fail(&deployment_id, message.clone());
                (
                    DeploymentResult::failed(deployment_id, message, log.lines()),
                    err.stage(),
                )
            }
        }
    }

    async fn run(
        &self,
        config: &DeploymentConfig,
        provider: Provider,
        deployment_id: &str,
        log: &DeploymentLog,
    ) -> Result<DeploymentResult> {
        log.push(format!("🔄 Initializing {} deployment...", provider.display_name()));

        for issue in &self.validator.validate(config, provider).issues {
            warn!("[{deployment_id}] {issue}");
        }

        let credentials = self.credentials.get_credentials().await;
        let authenticator = self.authenticators.for_provider(provider);
        if !authenticator.validate(&credentials).await? {
            return Err(CredentialError::Invalid { provider }.into());
        }

        self.registry.mark_running(deployment_id);
        let deployer = self.deployers.for_provider(provider);
        let dispatch = deployer.deploy(
            config,
            deployment_id,
            &credentials,
            log,
            Some(&self.registry as &dyn StepObserver),
        );

        match tokio::time::timeout(self.deploy_timeout, dispatch).await {
            Ok(result) => result,
            Err(_) => Err(Instant8Error::from(ProvisioningError::Timeout {
                deployment_id: deployment_id.to_string(),
                timeout_secs: self.deploy_timeout.as_secs(),
            })),
        }
    }
}
