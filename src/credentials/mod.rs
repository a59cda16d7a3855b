//! Credential bundles, persisted sources and the session credential store.

mod bundle;
mod source;
mod store;

pub use bundle::{AwsCredentials, AzureCredentials, CredentialBundle, CredentialSet, GcpCredentials};
pub use source::{
    AWS_ACCESS_KEY_ID, AWS_REGION, AWS_SECRET_ACCESS_KEY, AZURE_CLIENT_ID, AZURE_CLIENT_SECRET,
    AZURE_SUBSCRIPTION_ID, AZURE_TENANT_ID, CredentialSource, EnvVarFileSource, EnvVarRecord,
    GCP_PROJECT_ID, GOOGLE_APPLICATION_CREDENTIALS, ProcessEnvSource, credentials_from_lookup,
};
pub use store::CredentialStore;
