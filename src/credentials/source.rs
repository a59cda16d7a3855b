//! Persisted credential sources.
//!
//! A source is consulted at most once per store, when nothing has been set
//! explicitly. Two sources ship with the crate: the JSON export of the
//! environment-variable panel and the process environment.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::EnvLookup;
use crate::error::{CredentialError, Result};
use crate::provider::Provider;

use super::bundle::{AwsCredentials, AzureCredentials, CredentialSet, GcpCredentials};

/// Azure subscription variable.
pub const AZURE_SUBSCRIPTION_ID: &str = "AZURE_SUBSCRIPTION_ID";
/// Azure tenant variable.
pub const AZURE_TENANT_ID: &str = "AZURE_TENANT_ID";
/// Azure client id variable.
pub const AZURE_CLIENT_ID: &str = "AZURE_CLIENT_ID";
/// Azure client secret variable.
pub const AZURE_CLIENT_SECRET: &str = "AZURE_CLIENT_SECRET";
/// AWS access key variable.
pub const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
/// AWS secret key variable.
pub const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
/// AWS region variable.
pub const AWS_REGION: &str = "AWS_REGION";
/// GCP key file variable.
pub const GOOGLE_APPLICATION_CREDENTIALS: &str = "GOOGLE_APPLICATION_CREDENTIALS";
/// GCP project variable.
pub const GCP_PROJECT_ID: &str = "GCP_PROJECT_ID";

/// A read-only origin of persisted credentials.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Loads credentials, or `None` if the source holds nothing.
    async fn load(&self) -> Result<Option<CredentialSet>>;

    /// Name used in logs and errors.
    fn name(&self) -> &'static str;
}

/// One record of the environment-variable panel export.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct EnvVarRecord {
    /// Variable name.
    pub key: String,
    /// Variable value.
    pub value: String,
    /// Provider the record was entered under.
    #[serde(default)]
    pub provider: Option<String>,
}

impl EnvVarRecord {
    /// Returns true if the record was entered under `provider` or under no
    /// provider at all.
    #[must_use]
    pub fn applies_to(&self, provider: Provider) -> bool {
        self.provider
            .as_deref()
            .is_none_or(|name| Provider::parse_normalized(name) == Some(provider))
    }
}

/// Reads a JSON array of [`EnvVarRecord`]s from disk.
///
/// Each provider's bundle is built only from records entered under that
/// provider, plus untagged ones.
#[derive(Debug, Clone)]
pub struct EnvVarFileSource {
    path: PathBuf,
}

/// Reads the standard provider variables through an [`EnvLookup`].
pub struct ProcessEnvSource {
    lookup: EnvLookup,
}

/// Builds a credential set from variable lookups.
///
/// Azure needs a subscription; with a complete client id, secret and tenant it
/// becomes a service principal, otherwise it uses the default credential. AWS
/// needs both keys. GCP needs a key file or a project id.
#[must_use]
pub fn credentials_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CredentialSet {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    let mut set = CredentialSet::new();

    if let Some(subscription_id) = get(AZURE_SUBSCRIPTION_ID) {
        set.azure = Some(
            match (get(AZURE_CLIENT_ID), get(AZURE_CLIENT_SECRET), get(AZURE_TENANT_ID)) {
                (Some(client_id), Some(secret), Some(tenant_id)) => {
                    AzureCredentials::service_principal(subscription_id, tenant_id, client_id, secret)
                }
                (_, _, tenant_id) => AzureCredentials {
                    tenant_id,
                    ..AzureCredentials::default_credential(subscription_id)
                },
            },
        );
    }

    if let (Some(access_key), Some(secret_key)) = (get(AWS_ACCESS_KEY_ID), get(AWS_SECRET_ACCESS_KEY))
    {
        let region = get(AWS_REGION).unwrap_or_else(|| String::from("us-east-1"));
        set.aws = Some(AwsCredentials::new(access_key, secret_key, region));
    }

    let key_file = get(GOOGLE_APPLICATION_CREDENTIALS);
    let project_id = get(GCP_PROJECT_ID);
    if key_file.is_some() || project_id.is_some() {
        set.gcp = Some(GcpCredentials::configured(project_id, key_file));
    }

    set
}

impl EnvVarFileSource {
    /// Creates a source reading from `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CredentialSource for EnvVarFileSource {
    async fn load(&self) -> Result<Option<CredentialSet>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No persisted variables at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let records: Vec<EnvVarRecord> =
            serde_json::from_str(&content).map_err(|e| CredentialError::Malformed {
                source_name: self.path.display().to_string(),
                message: e.to_string(),
            })?;

        info!(
            "Loaded {} persisted variables from {}",
            records.len(),
            self.path.display()
        );

        let mut set = CredentialSet::new();
        for provider in Provider::ALL {
            // Later records win, matching the panel's overwrite-on-save behaviour
            let values: HashMap<&str, &str> = records
                .iter()
                .filter(|r| r.applies_to(provider))
                .map(|r| (r.key.as_str(), r.value.as_str()))
                .collect();
            let scoped = credentials_from_lookup(|key| values.get(key).map(|v| (*v).to_string()));
            match provider {
                Provider::Azure => set.azure = scoped.azure,
                Provider::Aws => set.aws = scoped.aws,
                Provider::Gcp => set.gcp = scoped.gcp,
            }
        }
        Ok((!set.is_empty()).then_some(set))
    }

    fn name(&self) -> &'static str {
        "env-var-file"
    }
}

impl ProcessEnvSource {
    /// Creates a source over the given lookup.
    #[must_use]
    pub fn new(lookup: EnvLookup) -> Self {
        Self { lookup }
    }
}

impl std::fmt::Debug for ProcessEnvSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessEnvSource").finish_non_exhaustive()
    }
}

#[async_trait]
impl CredentialSource for ProcessEnvSource {
    async fn load(&self) -> Result<Option<CredentialSet>> {
        let set = credentials_from_lookup(|key| (self.lookup)(key));
        debug!("Process environment provides {:?}", set.providers());
        Ok((!set.is_empty()).then_some(set))
    }

    fn name(&self) -> &'static str {
        "process-env"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    #[test]
    fn test_azure_without_principal_uses_default_credential() {
        let set = credentials_from_lookup(|key| {
            (key == AZURE_SUBSCRIPTION_ID).then(|| String::from("sub-123"))
        });
        let azure = set.azure.unwrap();
        assert!(azure.use_default_credential);
        assert_eq!(azure.subscription_id, "sub-123");
        assert!(set.aws.is_none());
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let set = credentials_from_lookup(|key| match key {
            AWS_ACCESS_KEY_ID => Some(String::from("  ")),
            AWS_SECRET_ACCESS_KEY => Some(String::from("secret")),
            _ => None,
        });
        assert!(set.is_empty());
    }

    #[tokio::test]
    async fn test_file_source_reads_records() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"key":"AZURE_SUBSCRIPTION_ID","value":"sub-1","provider":"azure"}},
                {{"key":"AZURE_CLIENT_ID","value":"app","provider":"azure"}},
                {{"key":"AZURE_CLIENT_SECRET","value":"pw","provider":"azure"}},
                {{"key":"AZURE_TENANT_ID","value":"tenant","provider":"azure"}},
                {{"key":"GCP_PROJECT_ID","value":"my-project"}}
            ]"#
        )
        .unwrap();

        let source = EnvVarFileSource::new(file.path());
        let set = source.load().await.unwrap().unwrap();
        assert_eq!(set.providers(), vec![Provider::Azure, Provider::Gcp]);
        let azure = set.azure.unwrap();
        assert!(!azure.use_default_credential);
        assert_eq!(azure.client_id.as_deref(), Some("app"));
    }

    #[tokio::test]
    async fn test_file_source_scopes_records_by_provider() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"key":"AWS_ACCESS_KEY_ID","value":"AKIA","provider":"aws"}},
                {{"key":"AWS_SECRET_ACCESS_KEY","value":"secret","provider":"aws"}},
                {{"key":"AZURE_SUBSCRIPTION_ID","value":"sub-1","provider":"aws"}},
                {{"key":"AWS_REGION","value":"eu-west-1","provider":"gcp"}},
                {{"key":"GCP_PROJECT_ID","value":"p","provider":"oracle"}}
            ]"#
        )
        .unwrap();

        let set = EnvVarFileSource::new(file.path()).load().await.unwrap().unwrap();
        assert_eq!(set.providers(), vec![Provider::Aws]);
        assert_eq!(set.aws.unwrap().region, "us-east-1");
    }

    #[test]
    fn test_record_applies_to() {
        let record = |provider: Option<&str>| EnvVarRecord {
            key: String::from("AZURE_TENANT_ID"),
            value: String::from("t"),
            provider: provider.map(str::to_string),
        };
        assert!(record(None).applies_to(Provider::Aws));
        assert!(record(Some("Azure")).applies_to(Provider::Azure));
        assert!(!record(Some("azure")).applies_to(Provider::Gcp));
    }

    #[tokio::test]
    async fn test_file_source_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let source = EnvVarFileSource::new(dir.path().join("vars.json"));
        assert!(source.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_source_malformed_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        let err = EnvVarFileSource::new(file.path()).load().await.unwrap_err();
        assert!(err.to_string().contains("Malformed"));
    }

    #[tokio::test]
    async fn test_process_env_source() {
        let lookup: EnvLookup = Arc::new(|key| match key {
            AWS_ACCESS_KEY_ID => Some(String::from("AKIA")),
            AWS_SECRET_ACCESS_KEY => Some(String::from("secret")),
            AWS_REGION => Some(String::from("eu-west-1")),
            _ => None,
        });
        let set = ProcessEnvSource::new(lookup).load().await.unwrap().unwrap();
        assert_eq!(set.aws.unwrap().region, "eu-west-1");
    }
}
