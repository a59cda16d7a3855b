//! Provisioning backends.
//!
//! A backend performs one plan step. The simulated backend only waits; the
//! Resource Manager backend creates the Azure resource group for real and
//! simulates everything after it.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

use crate::clients::AzureClient;
use crate::error::Result;

use super::plan::{ProvisioningContext, ProvisioningStep, StepKind};

/// Performs plan steps against some provider surface.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProvisioningBackend: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Applies one step.
    ///
    /// # Errors
    ///
    /// Returns an error if the step cannot be completed.
    async fn apply(&self, context: &ProvisioningContext, step: &ProvisioningStep) -> Result<()>;
}

/// Backend that sleeps for a fixed delay per step and always succeeds.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedBackend {
    step_delay: Duration,
}

impl SimulatedBackend {
    /// Creates a simulated backend.
    #[must_use]
    pub const fn new(step_delay: Duration) -> Self {
        Self { step_delay }
    }
}

#[async_trait]
impl ProvisioningBackend for SimulatedBackend {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn apply(&self, context: &ProvisioningContext, step: &ProvisioningStep) -> Result<()> {
        debug!(
            "[{}] simulating step {} ({})",
            context.deployment_id, step.index, step.kind
        );
        if !self.step_delay.is_zero() {
            tokio::time::sleep(self.step_delay).await;
        }
        Ok(())
    }
}

/// Backend that talks to Azure Resource Manager.
#[derive(Debug)]
pub struct AzureResourceManagerBackend {
    client: AzureClient,
    fallback: SimulatedBackend,
}

impl AzureResourceManagerBackend {
    /// Creates a backend over a connected client.
    #[must_use]
    pub const fn new(client: AzureClient, step_delay: Duration) -> Self {
        Self {
            client,
            fallback: SimulatedBackend::new(step_delay),
        }
    }
}

#[async_trait]
impl ProvisioningBackend for AzureResourceManagerBackend {
    fn name(&self) -> &'static str {
        "azure-resource-manager"
    }

    async fn apply(&self, context: &ProvisioningContext, step: &ProvisioningStep) -> Result<()> {
        match step.kind {
            StepKind::AuthContext => {
                self.client.access_token().await?;
                debug!("Azure token acquired for {}", self.client.subscription_id());
                Ok(())
            }
            StepKind::ResourceGroup => {
                let group = self
                    .client
                    .create_or_update_resource_group(
                        &context.resource_group,
                        &context.location,
                        &context.tags,
                    )
                    .await?;
                info!(
                    "Resource group {} ready in {} ({})",
                    group.name,
                    group.location,
                    group
                        .properties
                        .as_ref()
                        .and_then(|p| p.provisioning_state.as_deref())
                        .unwrap_or("unknown")
                );
                Ok(())
            }
            _ => self.fallback.apply(context, step).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::AzureAuthHandle;
    use crate::config::{AzureSettings, DeploymentConfig, EnvLookup, WorkloadType};
    use crate::credentials::AzureCredentials;
    use crate::deploy::{AzureProfile, ProvisioningPlan};
    use std::sync::Arc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn plan() -> ProvisioningPlan {
        let config = DeploymentConfig {
            os: String::from("Ubuntu 22.04 LTS"),
            cpu: String::from("2 cores"),
            ram: String::from("4GB"),
            storage: String::from("32GB SSD"),
            region: String::from("eu-west-1"),
            workload: WorkloadType::Database,
        };
        ProvisioningPlan::build::<AzureProfile>(&config, "azure-7")
    }

    fn backend(server: &MockServer) -> AzureResourceManagerBackend {
        let settings = AzureSettings {
            management_endpoint: server.uri(),
            login_endpoint: server.uri(),
            ..AzureSettings::default()
        };
        let env: EnvLookup = Arc::new(|_| None);
        let credentials = AzureCredentials::service_principal("sub-1", "tenant-1", "app", "secret");
        let handle = AzureAuthHandle::from_credentials(&credentials, &env).unwrap();
        let client = AzureClient::new(&settings, "sub-1", handle)
            .unwrap()
            .with_retry_delay(Duration::from_millis(1));
        AzureResourceManagerBackend::new(client, Duration::ZERO)
    }

    #[tokio::test]
    async fn test_simulated_backend_succeeds() {
        let plan = plan();
        let backend = SimulatedBackend::new(Duration::ZERO);
        for step in &plan.steps {
            backend.apply(&plan.context, step).await.unwrap();
        }
        assert_eq!(backend.name(), "simulated");
    }

    #[tokio::test]
    async fn test_resource_group_step_creates_group() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/v2.0/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "tok",
                "expires_in": 3600
            })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/subscriptions/sub-1/resourcegroups/instant8-azure-7"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "id": "/subscriptions/sub-1/resourceGroups/instant8-azure-7",
                "name": "instant8-azure-7",
                "location": "westeurope",
                "properties": { "provisioningState": "Succeeded" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let plan = plan();
        let backend = backend(&server);
        for step in &plan.steps {
            backend.apply(&plan.context, step).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_rejected_sign_in_fails_auth_step() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/v2.0/token"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": "invalid_client",
                "error_description": "bad secret"
            })))
            .mount(&server)
            .await;

        let plan = plan();
        let backend = backend(&server);
        let err = backend.apply(&plan.context, &plan.steps[0]).await.unwrap_err();
        assert!(err.to_string().contains("bad secret"));
    }
}
