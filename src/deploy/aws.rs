//! AWS profile: regions, EC2 instance types and log wording.

use crate::config::{DeploymentConfig, StorageMedium, WorkloadType};
use crate::provider::Provider;

use super::plan::{CloudProfile, InstanceSize, ProvisioningContext, RegionTable, StepKind};

/// AWS provider profile.
#[derive(Debug, Clone, Copy, Default)]
pub struct AwsProfile;

// Logical ids are AWS region names already
static REGIONS: RegionTable = RegionTable::new(
    &[
        ("us-east-1", "us-east-1"),
        ("us-east-2", "us-east-2"),
        ("us-west-1", "us-west-1"),
        ("us-west-2", "us-west-2"),
        ("eu-west-1", "eu-west-1"),
        ("eu-central-1", "eu-central-1"),
        ("ap-south-1", "ap-south-1"),
        ("ap-southeast-1", "ap-southeast-1"),
        ("ap-northeast-1", "ap-northeast-1"),
    ],
    "us-east-1",
);

static SIZES: &[InstanceSize] = &[
    InstanceSize { name: "t3.small", cores: 2, memory_gb: 2 },
    InstanceSize { name: "t3.medium", cores: 2, memory_gb: 4 },
    InstanceSize { name: "m5.large", cores: 2, memory_gb: 8 },
    InstanceSize { name: "m5.xlarge", cores: 4, memory_gb: 16 },
    InstanceSize { name: "m5.2xlarge", cores: 8, memory_gb: 32 },
    InstanceSize { name: "m5.4xlarge", cores: 16, memory_gb: 64 },
    InstanceSize { name: "m5.8xlarge", cores: 32, memory_gb: 128 },
    InstanceSize { name: "m5.16xlarge", cores: 64, memory_gb: 256 },
];

impl CloudProfile for AwsProfile {
    const PROVIDER: Provider = Provider::Aws;

    fn regions() -> &'static RegionTable {
        &REGIONS
    }

    fn sizes() -> &'static [InstanceSize] {
        SIZES
    }

    fn disk_sku(medium: StorageMedium) -> &'static str {
        match medium {
            StorageMedium::Ssd => "gp3",
            StorageMedium::Hdd => "st1",
        }
    }

    fn gpu_size() -> &'static str {
        "g4dn.xlarge"
    }

    fn load_balancer() -> &'static str {
        "Application Load Balancer"
    }

    fn describe(kind: StepKind, config: &DeploymentConfig, context: &ProvisioningContext) -> String {
        match kind {
            StepKind::AuthContext => String::from("🟠 AWS authentication context established (IAM access key)"),
            StepKind::ResourceGroup => format!(
                "🏗️ Creating CloudFormation stack: {} in {}",
                context.resource_group, context.location
            ),
            StepKind::Compute => format!(
                "💻 Launching EC2 instance {}: {} CPU, {} RAM",
                context.instance_size, config.cpu, config.ram
            ),
            StepKind::OperatingSystem => format!("🖥️ Installing {} operating system", config.os),
            StepKind::Storage => format!(
                "💾 Attaching {} EBS volume ({}, {}GB)",
                config.storage, context.disk_sku, context.disk_size_gb
            ),
            StepKind::Network => String::from("🌐 Setting up VPC, subnets and security groups..."),
            StepKind::Workload(step) => step.line::<Self>(),
        }
    }

    fn url(workload: &WorkloadType, deployment_id: &str, context: &ProvisioningContext) -> String {
        format!(
            "https://{}-{deployment_id}.{}.elb.amazonaws.com",
            workload.url_slug(),
            context.location
        )
    }
}
