//! Provider credential bundles.
//!
//! Each provider has its own bundle type; a [`CredentialSet`] holds at most one
//! bundle per provider. Secrets are redacted from `Debug` output.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::provider::Provider;

/// Placeholder printed instead of secret values.
const REDACTED: &str = "<redacted>";

/// Azure credentials.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AzureCredentials {
    /// Subscription that receives the resource groups.
    pub subscription_id: String,
    /// Directory (tenant) id for service principal sign-in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    /// Resolve the identity from the environment instead of a service principal.
    #[serde(default)]
    pub use_default_credential: bool,
    /// Service principal application id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Service principal secret.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}

/// AWS credentials.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AwsCredentials {
    /// Access key id.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
    /// Region used for SDK calls.
    #[serde(default = "default_aws_region")]
    pub region: String,
}

/// GCP credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GcpCredentials {
    /// Project that receives the resources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Path to a service account key file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_file: Option<String>,
    /// Marker that GCP credentials were supplied.
    #[serde(default)]
    pub configured: bool,
}

/// A single provider's credentials.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum CredentialBundle {
    /// Azure bundle.
    Azure(AzureCredentials),
    /// AWS bundle.
    Aws(AwsCredentials),
    /// GCP bundle.
    Gcp(GcpCredentials),
}

/// Credentials for every provider the caller has configured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialSet {
    /// Azure bundle, if configured.
    pub azure: Option<AzureCredentials>,
    /// AWS bundle, if configured.
    pub aws: Option<AwsCredentials>,
    /// GCP bundle, if configured.
    pub gcp: Option<GcpCredentials>,
}

fn default_aws_region() -> String {
    String::from("us-east-1")
}

impl AzureCredentials {
    /// Creates a bundle that resolves its identity from the environment.
    #[must_use]
    pub fn default_credential(subscription_id: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            use_default_credential: true,
            ..Self::default()
        }
    }

    /// Creates a service principal bundle.
    #[must_use]
    pub fn service_principal(
        subscription_id: impl Into<String>,
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            tenant_id: Some(tenant_id.into()),
            use_default_credential: false,
            client_id: Some(client_id.into()),
            client_secret: Some(client_secret.into()),
        }
    }

    /// Checks the field rules: a subscription, and either the default
    /// credential or a complete service principal.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        if self.subscription_id.trim().is_empty() {
            return false;
        }
        self.use_default_credential
            || [&self.client_id, &self.client_secret, &self.tenant_id]
                .iter()
                .all(|field| field.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }
}

impl AwsCredentials {
    /// Creates an AWS bundle.
    #[must_use]
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
        }
    }

    /// Both keys must be non-empty.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        !self.access_key_id.trim().is_empty() && !self.secret_access_key.trim().is_empty()
    }
}

impl GcpCredentials {
    /// Creates a bundle marked as configured.
    #[must_use]
    pub fn configured(project_id: Option<String>, key_file: Option<String>) -> Self {
        Self {
            project_id,
            key_file,
            configured: true,
        }
    }
}

impl CredentialBundle {
    /// Returns the provider this bundle belongs to.
    #[must_use]
    pub const fn provider(&self) -> Provider {
        match self {
            Self::Azure(_) => Provider::Azure,
            Self::Aws(_) => Provider::Aws,
            Self::Gcp(_) => Provider::Gcp,
        }
    }
}

impl CredentialSet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            azure: None,
            aws: None,
            gcp: None,
        }
    }

    /// Builds a set from bundles; a later bundle for the same provider wins.
    #[must_use]
    pub fn from_bundles(bundles: impl IntoIterator<Item = CredentialBundle>) -> Self {
        bundles.into_iter().fold(Self::new(), Self::with)
    }

    /// Returns the set with `bundle` stored for its provider.
    #[must_use]
    pub fn with(mut self, bundle: CredentialBundle) -> Self {
        match bundle {
            CredentialBundle::Azure(azure) => self.azure = Some(azure),
            CredentialBundle::Aws(aws) => self.aws = Some(aws),
            CredentialBundle::Gcp(gcp) => self.gcp = Some(gcp),
        }
        self
    }

    /// Returns the bundle for a provider.
    #[must_use]
    pub fn bundle(&self, provider: Provider) -> Option<CredentialBundle> {
        match provider {
            Provider::Azure => self.azure.clone().map(CredentialBundle::Azure),
            Provider::Aws => self.aws.clone().map(CredentialBundle::Aws),
            Provider::Gcp => self.gcp.clone().map(CredentialBundle::Gcp),
        }
    }

    /// Providers with a bundle in this set.
    #[must_use]
    pub fn providers(&self) -> Vec<Provider> {
        Provider::ALL
            .into_iter()
            .filter(|p| match p {
                Provider::Azure => self.azure.is_some(),
                Provider::Aws => self.aws.is_some(),
                Provider::Gcp => self.gcp.is_some(),
            })
            .collect()
    }

    /// Returns true when no provider has a bundle.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.azure.is_none() && self.aws.is_none() && self.gcp.is_none()
    }
}

impl fmt::Debug for AzureCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureCredentials")
            .field("subscription_id", &self.subscription_id)
            .field("tenant_id", &self.tenant_id)
            .field("use_default_credential", &self.use_default_credential)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| REDACTED))
            .finish()
    }
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &REDACTED)
            .field("region", &self.region)
            .finish()
    }
}
