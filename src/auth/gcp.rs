//! GCP credential checks.

use async_trait::async_trait;

use crate::credentials::CredentialSet;
use crate::error::Result;
use crate::provider::Provider;

use super::ProviderAuthenticator;

/// Accepts any GCP bundle marked as configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct GcpAuthenticator;

#[async_trait]
impl ProviderAuthenticator for GcpAuthenticator {
    fn provider(&self) -> Provider {
        Provider::Gcp
    }

    async fn validate(&self, credentials: &CredentialSet) -> Result<bool> {
        Ok(credentials.gcp.as_ref().is_some_and(|gcp| gcp.configured))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{CredentialBundle, GcpCredentials};

    #[tokio::test]
    async fn test_marker_required() {
        let auth = GcpAuthenticator;
        assert!(!auth.validate(&CredentialSet::new()).await.unwrap());

        let unmarked = CredentialSet::from_bundles([CredentialBundle::Gcp(GcpCredentials::default())]);
        assert!(!auth.validate(&unmarked).await.unwrap());

        let marked = CredentialSet::from_bundles([CredentialBundle::Gcp(
            GcpCredentials::configured(Some(String::from("proj")), None),
        )]);
        assert!(auth.validate(&marked).await.unwrap());
    }
}
