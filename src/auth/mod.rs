//! Provider credential validation.
//!
//! Each provider has a [`ProviderAuthenticator`] that checks the provider's
//! bundle in a [`CredentialSet`]. Validation is re-evaluated on every call;
//! nothing is cached between deployments.

mod aws;
mod azure;
mod gcp;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{EnvLookup, OrchestratorSettings};
use crate::credentials::CredentialSet;
use crate::error::{AuthError, Instant8Error, ProviderApiError, Result};
use crate::provider::Provider;

pub use aws::AwsAuthenticator;
pub use azure::AzureAuthenticator;
pub use gcp::GcpAuthenticator;

/// Validates one provider's credentials.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProviderAuthenticator: Send + Sync {
    /// Provider this authenticator checks.
    fn provider(&self) -> Provider;

    /// Returns whether the provider's bundle is usable.
    ///
    /// Missing or empty fields give `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Rejected`] when a smoke test against the provider
    /// fails, and other errors for unexpected failures such as an
    /// authentication handle that cannot be built.
    async fn validate(&self, credentials: &CredentialSet) -> Result<bool>;
}

/// One authenticator per provider.
#[derive(Clone)]
pub struct Authenticators {
    azure: Arc<dyn ProviderAuthenticator>,
    aws: Arc<dyn ProviderAuthenticator>,
    gcp: Arc<dyn ProviderAuthenticator>,
}

impl Authenticators {
    /// Builds the standard authenticators for the given settings.
    #[must_use]
    pub fn from_settings(settings: &OrchestratorSettings, env: EnvLookup) -> Self {
        let live = settings.is_live();
        Self {
            azure: Arc::new(AzureAuthenticator::new(
                settings.azure.clone(),
                live && settings.azure.smoke_test,
                env,
            )),
            aws: Arc::new(AwsAuthenticator::new(live && settings.aws.smoke_test)),
            gcp: Arc::new(GcpAuthenticator),
        }
    }

    /// Returns the authenticator for a provider.
    #[must_use]
    pub fn for_provider(&self, provider: Provider) -> &Arc<dyn ProviderAuthenticator> {
        match provider {
            Provider::Azure => &self.azure,
            Provider::Aws => &self.aws,
            Provider::Gcp => &self.gcp,
        }
    }

    /// Replaces the authenticator for the provider it reports.
    pub fn replace(&mut self, authenticator: Arc<dyn ProviderAuthenticator>) {
        match authenticator.provider() {
            Provider::Azure => self.azure = authenticator,
            Provider::Aws => self.aws = authenticator,
            Provider::Gcp => self.gcp = authenticator,
        }
    }
}

/// Turns a failed smoke-test call into a rejection carrying the provider's
/// own message.
fn rejected(provider: Provider, error: Instant8Error) -> Instant8Error {
    let message = match error {
        Instant8Error::Api(ProviderApiError::Unauthorized { message, .. }) => message,
        other => other.to_string(),
    };
    AuthError::Rejected { provider, message }.into()
}

impl std::fmt::Debug for Authenticators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticators").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::process_env;

    #[test]
    fn test_for_provider_is_exhaustive() {
        let auth = Authenticators::from_settings(&OrchestratorSettings::default(), process_env());
        for provider in Provider::ALL {
            assert_eq!(auth.for_provider(provider).provider(), provider);
        }
    }

    #[tokio::test]
    async fn test_replace_routes_by_provider() {
        let mut auth =
            Authenticators::from_settings(&OrchestratorSettings::default(), process_env());
        let mut mock = MockProviderAuthenticator::new();
        mock.expect_provider().return_const(Provider::Gcp);
        mock.expect_validate().returning(|_| Ok(false));
        auth.replace(Arc::new(mock));

        let creds = CredentialSet::new();
        assert!(!auth.for_provider(Provider::Gcp).validate(&creds).await.unwrap());
    }

    #[test]
    fn test_smoke_failures_become_rejections() {
        let unauthorized = Instant8Error::Api(ProviderApiError::Unauthorized {
            provider: Provider::Aws,
            message: String::from("InvalidAccessKeyId: key does not exist"),
        });
        let err = rejected(Provider::Aws, unauthorized);
        assert_eq!(
            err.to_string(),
            "Authentication error: AWS rejected the supplied credentials: InvalidAccessKeyId: key does not exist"
        );
        assert_eq!(err.category(), crate::error::ErrorCategory::Authentication);

        let network = Instant8Error::Api(ProviderApiError::network(Provider::Aws, "dispatch failure"));
        assert!(rejected(Provider::Aws, network).to_string().contains("dispatch failure"));
    }
}
