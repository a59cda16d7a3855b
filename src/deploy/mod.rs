//! Provider deployers.
//!
//! Each provider has a [`ProviderDeployer`] that turns a request into a
//! [`ProvisioningPlan`] and runs it on a [`ProvisioningBackend`]. The three
//! deployers share one implementation, [`CloudDeployer`], parameterized by a
//! [`CloudProfile`] that carries the provider's regions, sizes and wording.
//!
//! ```text
//! DeploymentConfig ──► ProvisioningPlan::build::<P>() ──► PlanExecutor ──► backend
//!                                                              │
//!                                                              ▼
//!                                                        DeploymentLog
//! ```

mod aws;
mod azure;
mod backend;
mod executor;
mod gcp;
mod plan;
mod result;

use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::clients::{AzureAuthHandle, AzureClient};
use crate::config::{AzureSettings, DeploymentConfig, EnvLookup, OrchestratorSettings};
use crate::credentials::CredentialSet;
use crate::error::{Instant8Error, ProvisioningError, Result};
use crate::provider::Provider;

pub use aws::AwsProfile;
pub use azure::AzureProfile;
pub use backend::{AzureResourceManagerBackend, ProvisioningBackend, SimulatedBackend};
#[cfg(test)]
pub use backend::MockProvisioningBackend;
pub use executor::{PlanExecutor, StepObserver};
pub use gcp::GcpProfile;
pub use plan::{
    CloudProfile, InstanceSize, ProvisioningContext, ProvisioningPlan, ProvisioningStep,
    RESOURCE_GROUP_PREFIX, RegionTable, StepKind, WorkloadStep, pick_size, resource_group_name,
};
pub use result::{DeploymentLog, DeploymentResult, ERROR_LINE_PREFIX};

/// Deploys a request on one provider.
#[async_trait]
pub trait ProviderDeployer: Send + Sync {
    /// Provider this deployer targets.
    fn provider(&self) -> Provider;

    /// Builds the plan the deployer would run.
    fn plan(&self, config: &DeploymentConfig, deployment_id: &str) -> ProvisioningPlan;

    /// Runs the plan, appending to `log` as steps start.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider client cannot be created or a step
    /// fails. Lines logged before the failure stay in `log`.
    async fn deploy(
        &self,
        config: &DeploymentConfig,
        deployment_id: &str,
        credentials: &CredentialSet,
        log: &DeploymentLog,
        observer: Option<&dyn StepObserver>,
    ) -> Result<DeploymentResult>;
}

enum BackendChoice {
    Shared(Arc<dyn ProvisioningBackend>),
    AzureLive {
        settings: AzureSettings,
        env: EnvLookup,
        step_delay: Duration,
    },
}

/// Plan-driven deployer for the provider described by `P`.
pub struct CloudDeployer<P: CloudProfile> {
    backend: BackendChoice,
    _profile: PhantomData<P>,
}

/// Azure deployer.
pub type AzureDeployer = CloudDeployer<AzureProfile>;
/// AWS deployer.
pub type AwsDeployer = CloudDeployer<AwsProfile>;
/// GCP deployer.
pub type GcpDeployer = CloudDeployer<GcpProfile>;

impl<P: CloudProfile> CloudDeployer<P> {
    /// Creates a deployer whose steps are simulated.
    #[must_use]
    pub fn simulated(step_delay: Duration) -> Self {
        Self::with_backend(Arc::new(SimulatedBackend::new(step_delay)))
    }

    /// Creates a deployer over an explicit backend.
    #[must_use]
    pub fn with_backend(backend: Arc<dyn ProvisioningBackend>) -> Self {
        Self {
            backend: BackendChoice::Shared(backend),
            _profile: PhantomData,
        }
    }
}

impl AzureDeployer {
    /// Creates a deployer that creates resource groups through Resource Manager.
    ///
    /// The client is built per deployment from the Azure bundle.
    #[must_use]
    pub fn live(settings: AzureSettings, env: EnvLookup, step_delay: Duration) -> Self {
        Self {
            backend: BackendChoice::AzureLive {
                settings,
                env,
                step_delay,
            },
            _profile: PhantomData,
        }
    }
}

impl<P: CloudProfile> CloudDeployer<P> {
    fn connect(&self, credentials: &CredentialSet) -> Result<Arc<dyn ProvisioningBackend>> {
        match &self.backend {
            BackendChoice::Shared(backend) => Ok(Arc::clone(backend)),
            BackendChoice::AzureLive {
                settings,
                env,
                step_delay,
            } => {
                let unavailable = |message: String| -> Instant8Error {
                    ProvisioningError::ClientUnavailable {
                        provider: Provider::Azure,
                        message,
                    }
                    .into()
                };
                let azure = credentials
                    .azure
                    .as_ref()
                    .ok_or_else(|| unavailable(String::from("no Azure credentials")))?;
                let handle = AzureAuthHandle::from_credentials(azure, env)
                    .map_err(|e| unavailable(e.to_string()))?;
                let client = AzureClient::new(settings, azure.subscription_id.clone(), handle)
                    .map_err(|e| unavailable(e.to_string()))?;
                Ok(Arc::new(AzureResourceManagerBackend::new(client, *step_delay)))
            }
        }
    }
}

#[async_trait]
impl<P: CloudProfile> ProviderDeployer for CloudDeployer<P> {
    fn provider(&self) -> Provider {
        P::PROVIDER
    }

    fn plan(&self, config: &DeploymentConfig, deployment_id: &str) -> ProvisioningPlan {
        ProvisioningPlan::build::<P>(config, deployment_id)
    }

    async fn deploy(
        &self,
        config: &DeploymentConfig,
        deployment_id: &str,
        credentials: &CredentialSet,
        log: &DeploymentLog,
        observer: Option<&dyn StepObserver>,
    ) -> Result<DeploymentResult> {
        let backend = self.connect(credentials)?;
        let plan = self.plan(config, deployment_id);
        info!(
            "[{deployment_id}] {} plan: {} steps in {} ({})",
            P::PROVIDER.display_name(),
            plan.len(),
            plan.context.location,
            plan.context.instance_size
        );

        PlanExecutor::new(backend.as_ref())
            .with_observer(observer)
            .run(&plan, log)
            .await?;

        log.push(format!(
            "✅ {} deployment completed successfully!",
            P::PROVIDER.display_name()
        ));
        Ok(DeploymentResult::succeeded(deployment_id, plan.url, log.lines()))
    }
}

/// One deployer per provider.
#[derive(Clone)]
pub struct Deployers {
    azure: Arc<dyn ProviderDeployer>,
    aws: Arc<dyn ProviderDeployer>,
    gcp: Arc<dyn ProviderDeployer>,
}

impl Deployers {
    /// Builds the standard deployers for the given settings.
    ///
    /// Live mode only changes Azure; AWS and GCP always simulate.
    #[must_use]
    pub fn from_settings(settings: &OrchestratorSettings, env: EnvLookup) -> Self {
        let delay = settings.step_delay();
        let azure: Arc<dyn ProviderDeployer> = if settings.is_live() {
            Arc::new(AzureDeployer::live(settings.azure.clone(), env, delay))
        } else {
            Arc::new(AzureDeployer::simulated(delay))
        };
        Self {
            azure,
            aws: Arc::new(AwsDeployer::simulated(delay)),
            gcp: Arc::new(GcpDeployer::simulated(delay)),
        }
    }

    /// Returns the deployer for a provider.
    #[must_use]
    pub fn for_provider(&self, provider: Provider) -> &Arc<dyn ProviderDeployer> {
        match provider {
            Provider::Azure => &self.azure,
            Provider::Aws => &self.aws,
            Provider::Gcp => &self.gcp,
        }
    }

    /// Replaces the deployer for the provider it reports.
    pub fn replace(&mut self, deployer: Arc<dyn ProviderDeployer>) {
        match deployer.provider() {
            Provider::Azure => self.azure = deployer,
            Provider::Aws => self.aws = deployer,
            Provider::Gcp => self.gcp = deployer,
        }
    }
}

/// Region table for a provider.
#[must_use]
pub fn region_table(provider: Provider) -> &'static RegionTable {
    match provider {
        Provider::Azure => AzureProfile::regions(),
        Provider::Aws => AwsProfile::regions(),
        Provider::Gcp => GcpProfile::regions(),
    }
}
