//! Azure credential checks.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::clients::{AzureAuthHandle, AzureClient};
use crate::config::{AzureSettings, EnvLookup};
use crate::credentials::CredentialSet;
use crate::error::Result;
use crate::provider::Provider;

use super::{ProviderAuthenticator, rejected};

/// Checks the Azure bundle and optionally lists one resource group.
pub struct AzureAuthenticator {
    settings: AzureSettings,
    smoke_test: bool,
    env: EnvLookup,
}

impl AzureAuthenticator {
    /// Creates an authenticator; `smoke_test` enables the live listing.
    #[must_use]
    pub fn new(settings: AzureSettings, smoke_test: bool, env: EnvLookup) -> Self {
        Self {
            settings,
            smoke_test,
            env,
        }
    }
}

impl std::fmt::Debug for AzureAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureAuthenticator")
            .field("settings", &self.settings)
            .field("smoke_test", &self.smoke_test)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ProviderAuthenticator for AzureAuthenticator {
    fn provider(&self) -> Provider {
        Provider::Azure
    }

    async fn validate(&self, credentials: &CredentialSet) -> Result<bool> {
        let Some(azure) = credentials.azure.as_ref() else {
            debug!("No Azure credentials configured");
            return Ok(false);
        };

        if !azure.is_well_formed() {
            debug!("Azure credentials are incomplete");
            return Ok(false);
        }

        if !self.smoke_test {
            return Ok(true);
        }

        let handle = AzureAuthHandle::from_credentials(azure, &self.env)?;
        let client = AzureClient::new(&self.settings, azure.subscription_id.clone(), handle)?;
        match client.list_resource_groups_first_page().await {
            Ok(groups) => {
                debug!("Azure smoke test listed {} resource groups", groups.len());
                Ok(true)
            }
            Err(e) => {
                warn!("Azure smoke test failed: {e}");
                Err(rejected(Provider::Azure, e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{AzureCredentials, CredentialBundle};
    use crate::error::{AuthError, Instant8Error};
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn no_env() -> EnvLookup {
        Arc::new(|_| None)
    }

    fn set(azure: AzureCredentials) -> CredentialSet {
        CredentialSet::from_bundles([CredentialBundle::Azure(azure)])
    }

    #[tokio::test]
    async fn test_field_rules() {
        let auth = AzureAuthenticator::new(AzureSettings::default(), false, no_env());
        assert!(!auth.validate(&CredentialSet::new()).await.unwrap());
        assert!(auth
            .validate(&set(AzureCredentials::default_credential("sub-123")))
            .await
            .unwrap());

        let partial = AzureCredentials::service_principal("sub", "tenant", "app", "");
        assert!(!auth.validate(&set(partial)).await.unwrap());
    }

    #[tokio::test]
    async fn test_smoke_test_failure_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tenant/oauth2/v2.0/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "tok", "expires_in": 3600
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/subscriptions/sub/resourcegroups"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": {
                    "code": "AuthorizationFailed",
                    "message": "The client 'app' does not have authorization to list resource groups"
                }
            })))
            .mount(&server)
            .await;

        let settings = AzureSettings {
            management_endpoint: server.uri(),
            login_endpoint: server.uri(),
            ..AzureSettings::default()
        };
        let auth = AzureAuthenticator::new(settings, true, no_env());
        let creds = set(AzureCredentials::service_principal("sub", "tenant", "app", "pw"));
        let err = auth.validate(&creds).await.unwrap_err();
        match err {
            Instant8Error::Auth(AuthError::Rejected { provider, message }) => {
                assert_eq!(provider, Provider::Azure);
                assert!(message.contains("does not have authorization"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_smoke_test_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tenant/oauth2/v2.0/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "tok", "expires_in": 3600
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/subscriptions/sub/resourcegroups"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
            .expect(1)
            .mount(&server)
            .await;

        let settings = AzureSettings {
            management_endpoint: server.uri(),
            login_endpoint: server.uri(),
            ..AzureSettings::default()
        };
        let auth = AzureAuthenticator::new(settings, true, no_env());
        let creds = set(AzureCredentials::service_principal("sub", "tenant", "app", "pw"));
        assert!(auth.validate(&creds).await.unwrap());
    }

    #[tokio::test]
    async fn test_handle_construction_failure_is_an_error() {
        let auth = AzureAuthenticator::new(AzureSettings::default(), true, no_env());
        let err = auth
            .validate(&set(AzureCredentials::default_credential("sub")))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Instant8Error::Auth(AuthError::HandleConstruction { .. })
        ));
    }
}
