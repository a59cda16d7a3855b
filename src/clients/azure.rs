//! Azure Resource Manager client.
//!
//! A small REST client covering what deployments need: an OAuth2
//! client-credentials token, resource group creation and a one-item resource
//! group listing used as a credential smoke test.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::{header, Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::config::{AzureSettings, EnvLookup};
use crate::credentials::{AZURE_CLIENT_ID, AZURE_CLIENT_SECRET, AZURE_TENANT_ID, AzureCredentials};
use crate::error::{AuthError, Instant8Error, ProviderApiError, Result};
use crate::provider::Provider;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum number of attempts for transient failures.
const MAX_RETRIES: u32 = 3;

/// Base delay between retries in milliseconds.
const RETRY_DELAY_MS: u64 = 1000;

/// Tokens this close to expiry are refreshed.
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// Service principal secret used to sign in.
#[derive(Clone)]
pub struct AzureAuthHandle {
    tenant_id: String,
    client_id: String,
    client_secret: String,
}

/// Azure Resource Manager client.
#[derive(Debug)]
pub struct AzureClient {
    client: Client,
    management_endpoint: String,
    login_endpoint: String,
    api_version: String,
    subscription_id: String,
    auth: AzureAuthHandle,
    retry_delay: Duration,
    token: Mutex<Option<CachedToken>>,
}

/// A resource group as returned by Resource Manager.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroup {
    /// Fully qualified resource id.
    #[serde(default)]
    pub id: String,
    /// Resource group name.
    pub name: String,
    /// Azure location.
    pub location: String,
    /// Resource tags.
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    /// Provisioning properties.
    #[serde(default)]
    pub properties: Option<ResourceGroupProperties>,
}

/// Resource group properties.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroupProperties {
    /// Provisioning state, e.g. "Succeeded".
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ResourceGroupList {
    #[serde(default)]
    value: Vec<ResourceGroup>,
}

#[derive(Debug, Serialize)]
struct ResourceGroupBody<'a> {
    location: &'a str,
    tags: &'a BTreeMap<String, String>,
}

impl AzureAuthHandle {
    /// Builds a handle from an Azure bundle.
    ///
    /// A service principal bundle is used as-is. The default credential is
    /// resolved from `AZURE_CLIENT_ID`, `AZURE_CLIENT_SECRET` and
    /// `AZURE_TENANT_ID`, with the bundle's tenant taking precedence.
    ///
    /// # Errors
    ///
    /// Returns an error if no complete service principal can be assembled.
    pub fn from_credentials(credentials: &AzureCredentials, env: &EnvLookup) -> Result<Self> {
        let pick = |explicit: &Option<String>, var: &str| {
            explicit
                .clone()
                .filter(|v| !v.trim().is_empty())
                .or_else(|| {
                    credentials
                        .use_default_credential
                        .then(|| env(var))
                        .flatten()
                        .filter(|v| !v.trim().is_empty())
                })
        };

        match (
            pick(&credentials.tenant_id, AZURE_TENANT_ID),
            pick(&credentials.client_id, AZURE_CLIENT_ID),
            pick(&credentials.client_secret, AZURE_CLIENT_SECRET),
        ) {
            (Some(tenant_id), Some(client_id), Some(client_secret)) => Ok(Self {
                tenant_id,
                client_id,
                client_secret,
            }),
            _ => Err(AuthError::HandleConstruction {
                provider: Provider::Azure,
                message: format!(
                    "no service principal available; set {AZURE_CLIENT_ID}, \
                     {AZURE_CLIENT_SECRET} and {AZURE_TENANT_ID}"
                ),
            }
            .into()),
        }
    }

    /// Tenant the handle signs in to.
    #[must_use]
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }
}

impl std::fmt::Debug for AzureAuthHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureAuthHandle")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

impl AzureClient {
    /// Creates a new Resource Manager client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(
        settings: &AzureSettings,
        subscription_id: impl Into<String>,
        auth: AzureAuthHandle,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                ProviderApiError::network(
                    Provider::Azure,
                    format!("Failed to create HTTP client: {e}"),
                )
            })?;

        Ok(Self {
            client,
            management_endpoint: settings.management_endpoint.trim_end_matches('/').to_string(),
            login_endpoint: settings.login_endpoint.trim_end_matches('/').to_string(),
            api_version: settings.api_version.clone(),
            subscription_id: subscription_id.into(),
            auth,
            retry_delay: Duration::from_millis(RETRY_DELAY_MS),
            token: Mutex::new(None),
        })
    }

    /// Overrides the base retry delay.
    #[must_use]
    pub const fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Subscription this client operates on.
    #[must_use]
    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    /// Returns a bearer token for Resource Manager, signing in if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity platform rejects the service principal.
    pub async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at - ChronoDuration::seconds(TOKEN_REFRESH_MARGIN_SECS) > Utc::now() {
                trace!("Using cached Azure token");
                return Ok(token.value.clone());
            }
        }

        debug!("Requesting Azure token for tenant {}", self.auth.tenant_id);
        let url = format!(
            "{}/{}/oauth2/v2.0/token",
            self.login_endpoint, self.auth.tenant_id
        );
        let scope = format!("{}/.default", self.management_endpoint);
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.auth.client_id.as_str()),
            ("client_secret", self.auth.client_secret.as_str()),
            ("scope", scope.as_str()),
        ];

        let response: TokenResponse = self
            .execute(|| self.client.post(&url).form(&form), true)
            .await?;

        let expires_in = response.expires_in.unwrap_or(3600);
        *cached = Some(CachedToken {
            value: response.access_token.clone(),
            expires_at: Utc::now() + ChronoDuration::seconds(expires_in),
        });
        Ok(response.access_token)
    }

    /// Creates or updates a resource group.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails.
    pub async fn create_or_update_resource_group(
        &self,
        name: &str,
        location: &str,
        tags: &BTreeMap<String, String>,
    ) -> Result<ResourceGroup> {
        let token = self.access_token().await?;
        let url = self.resource_groups_url(Some(name));
        let body = ResourceGroupBody { location, tags };
        debug!("Creating resource group {name} in {location}");

        self.execute(
            || {
                self.authorized(Method::PUT, &url, &token)
                    .query(&[("api-version", self.api_version.as_str())])
                    .json(&body)
            },
            false,
        )
        .await
    }

    /// Lists the first page of resource groups, one item long.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails.
    pub async fn list_resource_groups_first_page(&self) -> Result<Vec<ResourceGroup>> {
        let token = self.access_token().await?;
        let url = self.resource_groups_url(None);

        let list: ResourceGroupList = self
            .execute(
                || {
                    self.authorized(Method::GET, &url, &token).query(&[
                        ("api-version", self.api_version.as_str()),
                        ("$top", "1"),
                    ])
                },
                false,
            )
            .await?;
        Ok(list.value)
    }

    fn resource_groups_url(&self, name: Option<&str>) -> String {
        let base = format!(
            "{}/subscriptions/{}/resourcegroups",
            self.management_endpoint, self.subscription_id
        );
        match name {
            Some(name) => format!("{base}/{name}"),
            None => base,
        }
    }

    fn authorized(&self, method: Method, url: &str, token: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header("x-ms-client-request-id", uuid::Uuid::new_v4().to_string())
    }

    /// Sends a request, retrying rate limits and network failures.
    async fn execute<T, F>(&self, build: F, sign_in: bool) -> Result<T>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                debug!("Retry attempt {attempt} of {MAX_RETRIES}");
                tokio::time::sleep(self.retry_delay * attempt).await;
            }

            match self.execute_once::<T>(build(), sign_in).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() => last_error = Some(e),
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            Instant8Error::Api(ProviderApiError::network(
                Provider::Azure,
                "Max retries exceeded",
            ))
        }))
    }

    async fn execute_once<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        sign_in: bool,
    ) -> Result<T> {
        let response = request.send().await.map_err(|e| {
            ProviderApiError::network(Provider::Azure, format!("Request failed: {e}"))
        })?;

        let status = response.status().as_u16();

        if status == 429 {
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return Err(ProviderApiError::RateLimited {
                provider: Provider::Azure,
                retry_after_secs: retry_after,
            }
            .into());
        }

        // The identity platform reports bad secrets as 400 or 401
        let unauthorized = matches!(status, 401 | 403) || (sign_in && status == 400);
        if unauthorized {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderApiError::Unauthorized {
                provider: Provider::Azure,
                message: error_message(&body).unwrap_or_else(|| format!("HTTP {status}")),
            }
            .into());
        }

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body).unwrap_or(body);
            return Err(ProviderApiError::request_failed(Provider::Azure, status, message).into());
        }

        response.json::<T>().await.map_err(|e| {
            ProviderApiError::InvalidResponse {
                provider: Provider::Azure,
                message: format!("Failed to parse response: {e}"),
            }
            .into()
        })
    }
}

/// Pulls the message out of a Resource Manager or identity platform error body.
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .pointer("/error/message")
        .or_else(|| value.get("error_description"))
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;
    use wiremock::matchers::{body_string_contains, header as header_eq, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(server: &MockServer) -> AzureSettings {
        AzureSettings {
            smoke_test: true,
            management_endpoint: server.uri(),
            login_endpoint: server.uri(),
            ..AzureSettings::default()
        }
    }

    fn handle() -> AzureAuthHandle {
        let creds = AzureCredentials::service_principal("sub-1", "tenant-1", "app-1", "secret-1");
        let env: EnvLookup = Arc::new(|_| None);
        AzureAuthHandle::from_credentials(&creds, &env).unwrap()
    }

    async fn mount_token(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/v2.0/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token_type": "Bearer",
                "expires_in": 3599,
                "access_token": "tok-1"
            })))
            .expect(1)
            .mount(server)
            .await;
    }

    #[test]
    fn test_default_credential_reads_environment() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (AZURE_TENANT_ID, "t"),
            (AZURE_CLIENT_ID, "c"),
            (AZURE_CLIENT_SECRET, "s"),
        ]);
        let env: EnvLookup = Arc::new(move |k| vars.get(k).map(|v| (*v).to_string()));
        let handle =
            AzureAuthHandle::from_credentials(&AzureCredentials::default_credential("sub"), &env)
                .unwrap();
        assert_eq!(handle.tenant_id(), "t");
    }

    #[test]
    fn test_default_credential_without_environment_fails() {
        let env: EnvLookup = Arc::new(|_| None);
        let err =
            AzureAuthHandle::from_credentials(&AzureCredentials::default_credential("sub"), &env)
                .unwrap_err();
        assert!(matches!(
            err,
            Instant8Error::Auth(AuthError::HandleConstruction { .. })
        ));
    }

    #[test]
    fn test_debug_hides_secret() {
        assert!(!format!("{:?}", handle()).contains("secret-1"));
    }

    #[tokio::test]
    async fn test_create_resource_group() {
        let server = MockServer::start().await;
        mount_token(&server).await;

        Mock::given(method("PUT"))
            .and(path("/subscriptions/sub-1/resourcegroups/instant8-azure-1"))
            .and(query_param("api-version", "2021-04-01"))
            .and(header_eq("authorization", "Bearer tok-1"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "/subscriptions/sub-1/resourceGroups/instant8-azure-1",
                "name": "instant8-azure-1",
                "location": "eastus",
                "tags": {"created-by": "instant8"},
                "properties": {"provisioningState": "Succeeded"}
            })))
            .mount(&server)
            .await;

        let client = AzureClient::new(&settings(&server), "sub-1", handle()).unwrap();
        let tags = BTreeMap::from([(String::from("created-by"), String::from("instant8"))]);
        let group = client
            .create_or_update_resource_group("instant8-azure-1", "eastus", &tags)
            .await
            .unwrap();

        assert_eq!(group.location, "eastus");
        assert_eq!(group.tags.get("created-by").map(String::as_str), Some("instant8"));
        assert_eq!(
            group.properties.and_then(|p| p.provisioning_state).as_deref(),
            Some("Succeeded")
        );
    }

    #[tokio::test]
    async fn test_token_is_cached() {
        let server = MockServer::start().await;
        mount_token(&server).await;

        Mock::given(method("GET"))
            .and(path("/subscriptions/sub-1/resourcegroups"))
            .and(query_param("$top", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
            .expect(2)
            .mount(&server)
            .await;

        let client = AzureClient::new(&settings(&server), "sub-1", handle()).unwrap();
        assert!(client.list_resource_groups_first_page().await.unwrap().is_empty());
        assert!(client.list_resource_groups_first_page().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_secret_is_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/v2.0/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_client",
                "error_description": "AADSTS7000215: Invalid client secret provided."
            })))
            .mount(&server)
            .await;

        let client = AzureClient::new(&settings(&server), "sub-1", handle()).unwrap();
        let err = client.list_resource_groups_first_page().await.unwrap_err();
        match err {
            Instant8Error::Api(ProviderApiError::Unauthorized { message, .. }) => {
                assert!(message.contains("AADSTS7000215"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_rate_limit_is_retried() {
        let server = MockServer::start().await;
        mount_token(&server).await;

        Mock::given(method("GET"))
            .and(path("/subscriptions/sub-1/resourcegroups"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "1"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/subscriptions/sub-1/resourcegroups"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [{"name": "rg-1", "location": "westeurope"}]
            })))
            .mount(&server)
            .await;

        let client = AzureClient::new(&settings(&server), "sub-1", handle())
            .unwrap()
            .with_retry_delay(Duration::from_millis(5));
        let groups = client.list_resource_groups_first_page().await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "rg-1");
    }

    #[tokio::test]
    async fn test_server_error_message_is_extracted() {
        let server = MockServer::start().await;
        mount_token(&server).await;

        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "error": {"code": "ResourceGroupBeingDeleted", "message": "group is being deleted"}
            })))
            .mount(&server)
            .await;

        let client = AzureClient::new(&settings(&server), "sub-1", handle()).unwrap();
        let err = client
            .create_or_update_resource_group("rg", "eastus", &BTreeMap::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("409"));
        assert!(err.to_string().contains("group is being deleted"));
    }
}
