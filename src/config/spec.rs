//! Deployment configuration types.
//!
//! A [`DeploymentConfig`] is the declarative request handed to the orchestrator
//! by an upstream producer (a chat front end, a YAML file, a JSON payload). The
//! sizing types in this module interpret its free-form descriptors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default core count when the CPU descriptor carries no number.
pub const DEFAULT_CORES: u32 = 2;

/// Default memory in GB when the RAM descriptor carries no number.
pub const DEFAULT_MEMORY_GB: u32 = 4;

/// Default disk size in GB when the storage descriptor carries no number.
pub const DEFAULT_STORAGE_GB: u32 = 30;

/// A declarative deployment request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeploymentConfig {
    /// Operating system, e.g. "Ubuntu 22.04 LTS".
    pub os: String,
    /// Compute descriptor, e.g. "4 cores".
    pub cpu: String,
    /// Memory descriptor, e.g. "8GB".
    pub ram: String,
    /// Storage descriptor, e.g. "50GB SSD".
    pub storage: String,
    /// Logical region identifier, e.g. "us-east-1".
    pub region: String,
    /// Workload type controlling the type-specific provisioning steps.
    #[serde(rename = "type")]
    pub workload: WorkloadType,
}

/// Workload type. Unknown values are kept verbatim and get generic steps only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WorkloadType {
    /// Web application behind a load balancer.
    WebApplication,
    /// GPU-backed machine learning workload.
    MachineLearning,
    /// Managed database host.
    Database,
    /// API backend behind a gateway.
    ApiBackend,
    /// Any other value.
    Other(String),
}

/// Storage medium requested by the storage descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMedium {
    /// Solid-state storage.
    Ssd,
    /// Spinning-disk storage.
    Hdd,
}

/// Compute size parsed from the CPU and RAM descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComputeRequest {
    /// Number of virtual cores.
    pub cores: u32,
    /// Memory in GB.
    pub memory_gb: u32,
}

/// Storage request parsed from the storage descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageRequest {
    /// Disk size in GB.
    pub size_gb: u32,
    /// Disk medium.
    pub medium: StorageMedium,
}

impl WorkloadType {
    /// Returns the wire identifier of this workload type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::WebApplication => "web-application",
            Self::MachineLearning => "machine-learning",
            Self::Database => "database",
            Self::ApiBackend => "api-backend",
            Self::Other(other) => other,
        }
    }

    /// Returns true for the four workload types with dedicated steps.
    #[must_use]
    pub const fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// DNS-safe slug used as the first label of the endpoint URL.
    ///
    /// Known types drop their hyphen ("web-application" becomes
    /// "webapplication"); unknown types keep only ASCII alphanumerics.
    #[must_use]
    pub fn url_slug(&self) -> String {
        let slug: String = self
            .as_str()
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_lowercase())
            .collect();
        if slug.is_empty() {
            String::from("app")
        } else {
            slug
        }
    }
}

impl From<String> for WorkloadType {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "web-application" => Self::WebApplication,
            "machine-learning" => Self::MachineLearning,
            "database" => Self::Database,
            "api-backend" => Self::ApiBackend,
            _ => Self::Other(value),
        }
    }
}

impl From<WorkloadType> for String {
    fn from(workload: WorkloadType) -> Self {
        match workload {
            WorkloadType::Other(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for WorkloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for StorageMedium {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ssd => f.write_str("SSD"),
            Self::Hdd => f.write_str("HDD"),
        }
    }
}

impl DeploymentConfig {
    /// Parses the CPU and RAM descriptors into a compute request.
    #[must_use]
    pub fn compute(&self) -> ComputeRequest {
        ComputeRequest {
            cores: parse_cores(&self.cpu).unwrap_or(DEFAULT_CORES),
            memory_gb: parse_size_gb(&self.ram).unwrap_or(DEFAULT_MEMORY_GB),
        }
    }

    /// Parses the storage descriptor into a storage request.
    #[must_use]
    pub fn storage_request(&self) -> StorageRequest {
        let lowered = self.storage.to_ascii_lowercase();
        let medium = if lowered.contains("hdd") || lowered.contains("standard") {
            StorageMedium::Hdd
        } else {
            StorageMedium::Ssd
        };

        StorageRequest {
            size_gb: parse_size_gb(&self.storage).unwrap_or(DEFAULT_STORAGE_GB),
            medium,
        }
    }
}

/// Extracts the first number in a descriptor ("4 cores", "2.5GB", "vCPU: 8").
fn leading_number(descriptor: &str) -> Option<f64> {
    let start = descriptor.find(|c: char| c.is_ascii_digit())?;
    let rest = &descriptor[start..];
    let end = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(rest.len());
    rest[..end].trim_end_matches('.').parse().ok()
}

/// Parses a core count, rounding fractional cores up.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_cores(descriptor: &str) -> Option<u32> {
    leading_number(descriptor)
        .filter(|n| *n > 0.0)
        .map(|n| n.ceil().min(f64::from(u32::MAX)) as u32)
}

/// Parses a size descriptor into whole GB, honouring MB/TB suffixes.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_size_gb(descriptor: &str) -> Option<u32> {
    let value = leading_number(descriptor).filter(|n| *n > 0.0)?;
    let lowered = descriptor.to_ascii_lowercase();

    let gb = if lowered.contains("tb") || lowered.contains("tib") {
        value * 1024.0
    } else if lowered.contains("mb") || lowered.contains("mib") {
        value / 1024.0
    } else {
        value
    };

    Some(gb.ceil().clamp(1.0, f64::from(u32::MAX)) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(cpu: &str, ram: &str, storage: &str) -> DeploymentConfig {
        DeploymentConfig {
            os: String::from("Ubuntu 22.04 LTS"),
            cpu: cpu.to_string(),
            ram: ram.to_string(),
            storage: storage.to_string(),
            region: String::from("us-east-1"),
            workload: WorkloadType::WebApplication,
        }
    }

    #[test]
    fn test_compute_parsing() {
        let compute = config("4 cores", "8GB", "50GB SSD").compute();
        assert_eq!(compute, ComputeRequest { cores: 4, memory_gb: 8 });

        let compute = config("vCPU: 2.5", "512 MB", "").compute();
        assert_eq!(compute, ComputeRequest { cores: 3, memory_gb: 1 });
    }

    #[test]
    fn test_compute_defaults_when_unparseable() {
        let compute = config("lots", "plenty", "").compute();
        assert_eq!(compute.cores, DEFAULT_CORES);
        assert_eq!(compute.memory_gb, DEFAULT_MEMORY_GB);
    }

    #[test]
    fn test_storage_parsing() {
        let storage = config("2", "4GB", "50GB SSD").storage_request();
        assert_eq!(storage.size_gb, 50);
        assert_eq!(storage.medium, StorageMedium::Ssd);

        let storage = config("2", "4GB", "1 TB HDD").storage_request();
        assert_eq!(storage.size_gb, 1024);
        assert_eq!(storage.medium, StorageMedium::Hdd);
    }

    #[test]
    fn test_workload_type_round_trip_keeps_unknown_values() {
        let parsed: DeploymentConfig = serde_json::from_str(
            r#"{"os":"Debian 12","cpu":"2","ram":"4GB","storage":"20GB","region":"eu-west-1","type":"batch-jobs"}"#,
        )
        .unwrap();
        assert_eq!(parsed.workload, WorkloadType::Other(String::from("batch-jobs")));
        assert!(!parsed.workload.is_known());

        let json = serde_json::to_value(&parsed).unwrap();
        assert_eq!(json["type"], "batch-jobs");
    }

    #[test]
    fn test_url_slug() {
        assert_eq!(WorkloadType::WebApplication.url_slug(), "webapplication");
        assert_eq!(WorkloadType::ApiBackend.url_slug(), "apibackend");
        assert_eq!(WorkloadType::Other(String::from("My_Service!")).url_slug(), "myservice");
        assert_eq!(WorkloadType::Other(String::from("---")).url_slug(), "app");
    }
}
