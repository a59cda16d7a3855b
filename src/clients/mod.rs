//! Provider API clients.
//!
//! - [`AzureClient`]: Resource Manager REST calls over `reqwest`
//! - [`AwsProbe`]: read-only S3 calls through the AWS SDK

mod aws;
mod azure;

pub use aws::AwsProbe;
pub use azure::{AzureAuthHandle, AzureClient, ResourceGroup, ResourceGroupProperties};
