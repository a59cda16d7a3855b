//! Azure profile: locations, VM sizes and log wording.

use crate::config::{DeploymentConfig, StorageMedium, WorkloadType};
use crate::provider::Provider;

use super::plan::{CloudProfile, InstanceSize, ProvisioningContext, RegionTable, StepKind};

/// Azure provider profile.
#[derive(Debug, Clone, Copy, Default)]
pub struct AzureProfile;

static REGIONS: RegionTable = RegionTable::new(
    &[
        ("us-east-1", "eastus"),
        ("us-east-2", "eastus2"),
        ("us-west-1", "westus"),
        ("us-west-2", "westus2"),
        ("eu-west-1", "westeurope"),
        ("eu-central-1", "germanywestcentral"),
        ("ap-south-1", "southindia"),
        ("ap-southeast-1", "southeastasia"),
        ("ap-northeast-1", "japaneast"),
    ],
    "eastus",
);

static SIZES: &[InstanceSize] = &[
    InstanceSize { name: "Standard_B1ms", cores: 1, memory_gb: 2 },
    InstanceSize { name: "Standard_B2s", cores: 2, memory_gb: 4 },
    InstanceSize { name: "Standard_D2s_v5", cores: 2, memory_gb: 8 },
    InstanceSize { name: "Standard_D4s_v5", cores: 4, memory_gb: 16 },
    InstanceSize { name: "Standard_D8s_v5", cores: 8, memory_gb: 32 },
    InstanceSize { name: "Standard_D16s_v5", cores: 16, memory_gb: 64 },
    InstanceSize { name: "Standard_D32s_v5", cores: 32, memory_gb: 128 },
    InstanceSize { name: "Standard_D64s_v5", cores: 64, memory_gb: 256 },
];

impl CloudProfile for AzureProfile {
    const PROVIDER: Provider = Provider::Azure;

    fn regions() -> &'static RegionTable {
        &REGIONS
    }

    fn sizes() -> &'static [InstanceSize] {
        SIZES
    }

    fn disk_sku(medium: StorageMedium) -> &'static str {
        match medium {
            StorageMedium::Ssd => "Premium_LRS",
            StorageMedium::Hdd => "Standard_LRS",
        }
    }

    fn gpu_size() -> &'static str {
        "Standard_NC4as_T4_v3"
    }

    fn load_balancer() -> &'static str {
        "Azure Application Gateway with WAF"
    }

    fn describe(kind: StepKind, config: &DeploymentConfig, context: &ProvisioningContext) -> String {
        match kind {
            StepKind::AuthContext => {
                String::from("🔷 Azure authentication context established (least-privilege token)")
            }
            StepKind::ResourceGroup => format!(
                "🏗️ Creating resource group: {} in {}",
                context.resource_group, context.location
            ),
            StepKind::Compute => format!(
                "💻 Provisioning {} CPU, {} RAM virtual machine ({})",
                config.cpu, config.ram, context.instance_size
            ),
            StepKind::OperatingSystem => format!("🖥️ Installing {} operating system", config.os),
            StepKind::Storage => format!(
                "💾 Configuring {} storage with managed disks ({}, {}GB)",
                config.storage, context.disk_sku, context.disk_size_gb
            ),
            StepKind::Network => {
                String::from("🌐 Setting up Azure VNet and NSG with security best practices...")
            }
            StepKind::Workload(step) => step.line::<Self>(),
        }
    }

    fn url(workload: &WorkloadType, deployment_id: &str, _context: &ProvisioningContext) -> String {
        format!("https://{}-{deployment_id}.azurewebsites.net", workload.url_slug())
    }
}
