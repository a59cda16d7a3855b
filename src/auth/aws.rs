//! AWS credential checks.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::clients::AwsProbe;
use crate::credentials::CredentialSet;
use crate::error::Result;
use crate::provider::Provider;

use super::{ProviderAuthenticator, rejected};

/// Checks both AWS keys and optionally lists S3 buckets.
#[derive(Debug, Clone, Copy, Default)]
pub struct AwsAuthenticator {
    smoke_test: bool,
}

impl AwsAuthenticator {
    /// Creates an authenticator; `smoke_test` enables the S3 listing.
    #[must_use]
    pub const fn new(smoke_test: bool) -> Self {
        Self { smoke_test }
    }
}

#[async_trait]
impl ProviderAuthenticator for AwsAuthenticator {
    fn provider(&self) -> Provider {
        Provider::Aws
    }

    async fn validate(&self, credentials: &CredentialSet) -> Result<bool> {
        let Some(aws) = credentials.aws.as_ref().filter(|aws| aws.is_well_formed()) else {
            debug!("AWS credentials are missing or incomplete");
            return Ok(false);
        };

        if !self.smoke_test {
            return Ok(true);
        }

        match AwsProbe::from_credentials(aws).await.list_buckets().await {
            Ok(_) => Ok(true),
            Err(e) => {
                warn!("AWS smoke test failed: {e}");
                Err(rejected(Provider::Aws, e))
            }
        }
    }
}
