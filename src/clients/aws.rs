//! AWS credential probe over the S3 SDK.

use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::Client;
use tracing::debug;

use crate::credentials::AwsCredentials;
use crate::error::{ProviderApiError, Result};
use crate::provider::Provider;

/// Error codes S3 uses for bad keys or signatures.
const AUTH_ERROR_CODES: &[&str] = &[
    "InvalidAccessKeyId",
    "SignatureDoesNotMatch",
    "AccessDenied",
    "ExpiredToken",
    "InvalidToken",
];

/// Runs read-only S3 calls with an explicit credential bundle.
#[derive(Debug, Clone)]
pub struct AwsProbe {
    client: Client,
}

impl AwsProbe {
    /// Builds an S3 client from the bundle, ignoring ambient AWS configuration.
    pub async fn from_credentials(credentials: &AwsCredentials) -> Self {
        let static_credentials = Credentials::new(
            credentials.access_key_id.clone(),
            credentials.secret_access_key.clone(),
            None,
            None,
            "instant8",
        );

        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(credentials.region.clone()))
            .credentials_provider(static_credentials)
            .load()
            .await;

        Self {
            client: Client::new(&config),
        }
    }

    /// Lists buckets and returns how many the credentials can see.
    ///
    /// # Errors
    ///
    /// Returns an error if AWS rejects the keys or cannot be reached.
    pub async fn list_buckets(&self) -> Result<usize> {
        match self.client.list_buckets().send().await {
            Ok(output) => {
                let count = output.buckets().len();
                debug!("S3 probe listed {count} buckets");
                Ok(count)
            }
            Err(e) => {
                let status = e.raw_response().map(|r| r.status().as_u16());
                let code = e.as_service_error().and_then(ProvideErrorMetadata::code);
                Err(classify(code, status, DisplayErrorContext(&e).to_string()).into())
            }
        }
    }
}

/// Maps an S3 failure onto the provider API error taxonomy.
fn classify(code: Option<&str>, status: Option<u16>, message: String) -> ProviderApiError {
    match (code, status) {
        (Some(code), _) if AUTH_ERROR_CODES.contains(&code) => ProviderApiError::Unauthorized {
            provider: Provider::Aws,
            message,
        },
        (_, Some(401 | 403)) => ProviderApiError::Unauthorized {
            provider: Provider::Aws,
            message,
        },
        (_, Some(status)) => ProviderApiError::request_failed(Provider::Aws, status, message),
        (_, None) => ProviderApiError::network(Provider::Aws, message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_auth_codes() {
        let err = classify(Some("InvalidAccessKeyId"), Some(400), String::from("bad key"));
        assert!(matches!(err, ProviderApiError::Unauthorized { .. }));

        let err = classify(None, Some(403), String::from("forbidden"));
        assert!(matches!(err, ProviderApiError::Unauthorized { .. }));
    }

    #[test]
    fn test_classify_other_failures() {
        let err = classify(Some("SlowDown"), Some(503), String::from("slow down"));
        assert!(matches!(err, ProviderApiError::RequestFailed { status: 503, .. }));

        let err = classify(None, None, String::from("dispatch failure"));
        assert!(matches!(err, ProviderApiError::Network { .. }));
    }
}
