//! GCP profile: regions, machine types and log wording.

use crate::config::{DeploymentConfig, StorageMedium, WorkloadType};
use crate::provider::Provider;

use super::plan::{CloudProfile, InstanceSize, ProvisioningContext, RegionTable, StepKind};

/// GCP provider profile.
#[derive(Debug, Clone, Copy, Default)]
pub struct GcpProfile;

static REGIONS: RegionTable = RegionTable::new(
    &[
        ("us-east-1", "us-east4"),
        ("us-east-2", "us-east5"),
        ("us-west-1", "us-west2"),
        ("us-west-2", "us-west1"),
        ("us-central-1", "us-central1"),
        ("eu-west-1", "europe-west1"),
        ("eu-central-1", "europe-west3"),
        ("ap-south-1", "asia-south1"),
        ("ap-southeast-1", "asia-southeast1"),
        ("ap-northeast-1", "asia-northeast1"),
    ],
    "us-central1",
);

static SIZES: &[InstanceSize] = &[
    InstanceSize { name: "e2-small", cores: 2, memory_gb: 2 },
    InstanceSize { name: "e2-medium", cores: 2, memory_gb: 4 },
    InstanceSize { name: "e2-standard-2", cores: 2, memory_gb: 8 },
    InstanceSize { name: "e2-standard-4", cores: 4, memory_gb: 16 },
    InstanceSize { name: "e2-standard-8", cores: 8, memory_gb: 32 },
    InstanceSize { name: "e2-standard-16", cores: 16, memory_gb: 64 },
    InstanceSize { name: "e2-standard-32", cores: 32, memory_gb: 128 },
];

impl CloudProfile for GcpProfile {
    const PROVIDER: Provider = Provider::Gcp;

    fn regions() -> &'static RegionTable {
        &REGIONS
    }

    fn sizes() -> &'static [InstanceSize] {
        SIZES
    }

    fn disk_sku(medium: StorageMedium) -> &'static str {
        match medium {
            StorageMedium::Ssd => "pd-ssd",
            StorageMedium::Hdd => "pd-standard",
        }
    }

    fn gpu_size() -> &'static str {
        "n1-standard-4 + nvidia-tesla-t4"
    }

    fn load_balancer() -> &'static str {
        "Cloud Load Balancer"
    }

    fn describe(kind: StepKind, config: &DeploymentConfig, context: &ProvisioningContext) -> String {
        match kind {
            StepKind::AuthContext => String::from("🔴 Connecting to Google Cloud APIs..."),
            StepKind::ResourceGroup => format!(
                "🏗️ Creating GCP project resources: {} in {}",
                context.resource_group, context.location
            ),
            StepKind::Compute => format!(
                "💻 Creating Compute Engine instance {}: {} CPU, {} RAM",
                context.instance_size, config.cpu, config.ram
            ),
            StepKind::OperatingSystem => format!("🖥️ Installing {} operating system", config.os),
            StepKind::Storage => format!(
                "💾 Attaching {} persistent disk ({}, {}GB)",
                config.storage, context.disk_sku, context.disk_size_gb
            ),
            StepKind::Network => String::from("🌐 Setting up VPC and firewall rules..."),
            StepKind::Workload(step) => step.line::<Self>(),
        }
    }

    fn url(workload: &WorkloadType, deployment_id: &str, _context: &ProvisioningContext) -> String {
        format!("https://{}-{deployment_id}.run.app", workload.url_slug())
    }
}
