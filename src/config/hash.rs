//! Deployment request fingerprinting.
//!
//! The fingerprint is attached to provisioned resources as the `config-hash`
//! tag so that a resource group can be traced back to the request that made it.

use sha2::{Digest, Sha256};

use super::spec::DeploymentConfig;

/// Hasher for computing deployment request fingerprints.
#[derive(Debug, Default)]
pub struct ConfigHasher;

impl ConfigHasher {
    /// Creates a new configuration hasher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Computes the SHA-256 fingerprint of a deployment request.
    ///
    /// Descriptors are trimmed and lowercased first, so cosmetic differences
    /// ("8GB" and "8gb ") produce the same fingerprint.
    #[must_use]
    pub fn hash_config(&self, config: &DeploymentConfig) -> String {
        let mut hasher = Sha256::new();

        for field in [
            config.os.as_str(),
            config.cpu.as_str(),
            config.ram.as_str(),
            config.storage.as_str(),
            config.region.as_str(),
            config.workload.as_str(),
        ] {
            hasher.update(field.trim().to_ascii_lowercase().as_bytes());
            // Separator so adjacent fields cannot run together
            hasher.update([0u8]);
        }

        hex::encode(hasher.finalize())
    }

    /// Computes a short hash (first 8 characters) for tags and display.
    #[must_use]
    pub fn short_hash(&self, hash: &str) -> String {
        hash.chars().take(8).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::spec::WorkloadType;

    fn request(ram: &str) -> DeploymentConfig {
        DeploymentConfig {
            os: String::from("Ubuntu 22.04 LTS"),
            cpu: String::from("2 cores"),
            ram: ram.to_string(),
            storage: String::from("30GB SSD"),
            region: String::from("eu-west-1"),
            workload: WorkloadType::Database,
        }
    }

    #[test]
    fn test_hash_ignores_case_and_padding() {
        let hasher = ConfigHasher::new();
        assert_eq!(
            hasher.hash_config(&request("8GB")),
            hasher.hash_config(&request(" 8gb "))
        );
    }

    #[test]
    fn test_different_requests_differ() {
        let hasher = ConfigHasher::new();
        assert_ne!(
            hasher.hash_config(&request("8GB")),
            hasher.hash_config(&request("16GB"))
        );
    }

    #[test]
    fn test_short_hash() {
        let hasher = ConfigHasher::new();
        let full = hasher.hash_config(&request("8GB"));
        assert_eq!(full.len(), 64);
        assert_eq!(hasher.short_hash(&full), &full[..8]);
    }
}
