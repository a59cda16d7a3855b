//! Provisioning plans.
//!
//! A plan is the ordered list of steps a deployer runs, each with the exact log
//! line it emits, plus the naming and sizing context those steps share. Plans
//! are pure functions of the request, the deployment id and the provider.

use std::collections::BTreeMap;
use std::fmt;

use crate::config::{ComputeRequest, ConfigHasher, DeploymentConfig, StorageMedium, WorkloadType};
use crate::progress::DeploymentStage;
use crate::provider::Provider;

/// Prefix of every resource group and stack name.
pub const RESOURCE_GROUP_PREFIX: &str = "instant8";

/// A generic provisioning step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    /// Confirm the authentication context.
    AuthContext,
    /// Create the resource group or stack.
    ResourceGroup,
    /// Provision compute.
    Compute,
    /// Install the operating system.
    OperatingSystem,
    /// Attach storage.
    Storage,
    /// Set up network and security.
    Network,
    /// A workload-specific step.
    Workload(WorkloadStep),
}

/// A workload-specific step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkloadStep {
    /// GPU drivers.
    GpuDrivers,
    /// ML frameworks.
    MlFramework,
    /// Notebook environment.
    Notebook,
    /// Web server.
    WebServer,
    /// SSL certificates.
    Ssl,
    /// Load balancer.
    LoadBalancer,
    /// Database engine.
    DatabaseEngine,
    /// Automated backups.
    Backups,
    /// Monitoring and alerts.
    Monitoring,
    /// API gateway.
    ApiGateway,
    /// Rate limiting.
    RateLimiting,
    /// Health checks.
    HealthChecks,
}

/// One step of a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningStep {
    /// One-based position in the plan.
    pub index: usize,
    /// What the step does.
    pub kind: StepKind,
    /// Log line emitted when the step starts.
    pub line: String,
}

/// Names, location and sizing shared by every step of a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningContext {
    /// Target provider.
    pub provider: Provider,
    /// Deployment identifier.
    pub deployment_id: String,
    /// Resource group or stack name.
    pub resource_group: String,
    /// Provider-native location.
    pub location: String,
    /// Parsed compute request.
    pub compute: ComputeRequest,
    /// Provider instance size.
    pub instance_size: String,
    /// Provider disk SKU.
    pub disk_sku: String,
    /// Disk size in GB.
    pub disk_size_gb: u32,
    /// Tags applied to created resources.
    pub tags: BTreeMap<String, String>,
}

/// An ordered provisioning plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningPlan {
    /// Shared context.
    pub context: ProvisioningContext,
    /// Steps in execution order.
    pub steps: Vec<ProvisioningStep>,
    /// Endpoint reported on success.
    pub url: String,
}

/// Fixed mapping from logical region ids to provider locations.
#[derive(Debug)]
pub struct RegionTable {
    entries: &'static [(&'static str, &'static str)],
    default_location: &'static str,
}

/// An instance size in a provider catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceSize {
    /// Provider name of the size.
    pub name: &'static str,
    /// Virtual cores.
    pub cores: u32,
    /// Memory in GB.
    pub memory_gb: u32,
}

/// Provider-specific naming, catalogue and log wording.
pub trait CloudProfile: Send + Sync + 'static {
    /// Provider this profile describes.
    const PROVIDER: Provider;

    /// Region table.
    fn regions() -> &'static RegionTable;

    /// Instance sizes, smallest first.
    fn sizes() -> &'static [InstanceSize];

    /// Disk SKU for a storage medium.
    fn disk_sku(medium: StorageMedium) -> &'static str;

    /// GPU instance size used for machine learning workloads.
    fn gpu_size() -> &'static str;

    /// Load balancer product name.
    fn load_balancer() -> &'static str;

    /// Log line for a step.
    fn describe(kind: StepKind, config: &DeploymentConfig, context: &ProvisioningContext) -> String;

    /// Endpoint URL.
    fn url(workload: &WorkloadType, deployment_id: &str, context: &ProvisioningContext) -> String;
}

impl StepKind {
    /// Board stage this step belongs to.
    #[must_use]
    pub const fn stage(self) -> DeploymentStage {
        match self {
            Self::AuthContext => DeploymentStage::Authentication,
            Self::ResourceGroup => DeploymentStage::Provisioning,
            Self::Compute | Self::OperatingSystem | Self::Storage => DeploymentStage::Compute,
            Self::Network => DeploymentStage::Network,
            Self::Workload(WorkloadStep::HealthChecks) => DeploymentStage::HealthCheck,
            Self::Workload(_) => DeploymentStage::Workload,
        }
    }

    /// Returns true if the step's line reports a result and is logged only
    /// once the step succeeds.
    #[must_use]
    pub const fn logs_on_success(self) -> bool {
        matches!(self, Self::AuthContext)
    }

    /// Short title used in error messages.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::AuthContext => "authentication context",
            Self::ResourceGroup => "resource group",
            Self::Compute => "compute",
            Self::OperatingSystem => "operating system",
            Self::Storage => "storage",
            Self::Network => "network",
            Self::Workload(step) => step.title(),
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl WorkloadStep {
    /// Workload steps for a workload type; empty for unknown types.
    #[must_use]
    pub fn for_workload(workload: &WorkloadType) -> &'static [Self] {
        match workload {
            WorkloadType::MachineLearning => &[Self::GpuDrivers, Self::MlFramework, Self::Notebook],
            WorkloadType::WebApplication => &[Self::WebServer, Self::Ssl, Self::LoadBalancer],
            WorkloadType::Database => &[Self::DatabaseEngine, Self::Backups, Self::Monitoring],
            WorkloadType::ApiBackend => &[Self::ApiGateway, Self::RateLimiting, Self::HealthChecks],
            WorkloadType::Other(_) => &[],
        }
    }

    /// Short title used in error messages.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::GpuDrivers => "GPU drivers",
            Self::MlFramework => "ML frameworks",
            Self::Notebook => "notebook environment",
            Self::WebServer => "web server",
            Self::Ssl => "SSL certificates",
            Self::LoadBalancer => "load balancer",
            Self::DatabaseEngine => "database engine",
            Self::Backups => "backups",
            Self::Monitoring => "monitoring",
            Self::ApiGateway => "API gateway",
            Self::RateLimiting => "rate limiting",
            Self::HealthChecks => "health checks",
        }
    }

    /// Standard log line for this step on the given profile.
    #[must_use]
    pub fn line<P: CloudProfile>(self) -> String {
        match self {
            Self::GpuDrivers => format!("🤖 Installing CUDA drivers on {} GPU instance...", P::gpu_size()),
            Self::MlFramework => String::from("🧠 Installing ML frameworks (PyTorch, TensorFlow)..."),
            Self::Notebook => String::from("📊 Setting up Jupyter notebook environment..."),
            Self::WebServer => String::from("🌐 Installing Nginx web server..."),
            Self::Ssl => String::from("🔒 Configuring SSL certificates..."),
            Self::LoadBalancer => format!("📡 Setting up load balancer ({})...", P::load_balancer()),
            Self::DatabaseEngine => String::from("🗄️ Installing PostgreSQL database..."),
            Self::Backups => String::from("🔄 Configuring automated backups..."),
            Self::Monitoring => String::from("📊 Setting up monitoring and alerts..."),
            Self::ApiGateway => String::from("🚪 Configuring API gateway..."),
            Self::RateLimiting => String::from("⏱️ Setting up rate limiting..."),
            Self::HealthChecks => String::from("❤️ Configuring health checks..."),
        }
    }
}

impl RegionTable {
    /// Creates a table.
    #[must_use]
    pub const fn new(
        entries: &'static [(&'static str, &'static str)],
        default_location: &'static str,
    ) -> Self {
        Self {
            entries,
            default_location,
        }
    }

    /// Looks up a logical region id or a native location name.
    #[must_use]
    pub fn lookup(&self, region: &str) -> Option<&'static str> {
        let region = region.trim();
        self.entries
            .iter()
            .find(|(logical, native)| {
                logical.eq_ignore_ascii_case(region) || native.eq_ignore_ascii_case(region)
            })
            .map(|(_, native)| *native)
    }

    /// Maps a region, falling back to the default location.
    #[must_use]
    pub fn resolve(&self, region: &str) -> &'static str {
        self.lookup(region).unwrap_or(self.default_location)
    }

    /// Location used for unmapped regions.
    #[must_use]
    pub const fn default_location(&self) -> &'static str {
        self.default_location
    }

    /// All mapped regions.
    #[must_use]
    pub const fn entries(&self) -> &'static [(&'static str, &'static str)] {
        self.entries
    }
}

/// Picks the smallest size that satisfies the request, or the largest size.
#[must_use]
pub fn pick_size(sizes: &'static [InstanceSize], request: ComputeRequest) -> Option<&'static InstanceSize> {
    sizes
        .iter()
        .find(|s| s.cores >= request.cores && s.memory_gb >= request.memory_gb)
        .or_else(|| sizes.last())
}

/// Resource group or stack name for a deployment.
#[must_use]
pub fn resource_group_name(deployment_id: &str) -> String {
    format!("{RESOURCE_GROUP_PREFIX}-{deployment_id}")
}

impl ProvisioningPlan {
    /// Builds the plan for a request on the profile's provider.
    #[must_use]
    pub fn build<P: CloudProfile>(config: &DeploymentConfig, deployment_id: &str) -> Self {
        let compute = config.compute();
        let storage = config.storage_request();
        let hasher = ConfigHasher::new();
        let fingerprint = hasher.hash_config(config);

        let tags = BTreeMap::from([
            (String::from("created-by"), String::from(RESOURCE_GROUP_PREFIX)),
            (String::from("deployment-id"), deployment_id.to_string()),
            (String::from("environment"), String::from("production")),
            (String::from("config-hash"), hasher.short_hash(&fingerprint)),
            (String::from("workload"), config.workload.to_string()),
        ]);

        let context = ProvisioningContext {
            provider: P::PROVIDER,
            deployment_id: deployment_id.to_string(),
            resource_group: resource_group_name(deployment_id),
            location: P::regions().resolve(&config.region).to_string(),
            compute,
            instance_size: pick_size(P::sizes(), compute)
                .map_or_else(|| String::from("custom"), |s| s.name.to_string()),
            disk_sku: P::disk_sku(storage.medium).to_string(),
            disk_size_gb: storage.size_gb,
            tags,
        };

        let generic = [
            StepKind::AuthContext,
            StepKind::ResourceGroup,
            StepKind::Compute,
            StepKind::OperatingSystem,
            StepKind::Storage,
            StepKind::Network,
        ];
        let workload = WorkloadStep::for_workload(&config.workload)
            .iter()
            .copied()
            .map(StepKind::Workload);

        let steps = generic
            .into_iter()
            .chain(workload)
            .enumerate()
            .map(|(i, kind)| ProvisioningStep {
                index: i + 1,
                kind,
                line: P::describe(kind, config, &context),
            })
            .collect();

        let url = P::url(&config.workload, deployment_id, &context);

        Self {
            context,
            steps,
            url,
        }
    }

    /// Number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if the plan has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::{AwsProfile, AzureProfile, GcpProfile};

    fn request(workload: WorkloadType, region: &str) -> DeploymentConfig {
        DeploymentConfig {
            os: String::from("Ubuntu 22.04 LTS"),
            cpu: String::from("4 cores"),
            ram: String::from("8GB"),
            storage: String::from("50GB SSD"),
            region: region.to_string(),
            workload,
        }
    }

    #[test]
    fn test_plan_is_pure() {
        let config = request(WorkloadType::Database, "eu-west-1");
        let first = ProvisioningPlan::build::<AzureProfile>(&config, "azure-1700000000000");
        let second = ProvisioningPlan::build::<AzureProfile>(&config, "azure-1700000000000");
        assert_eq!(first, second);
        assert_eq!(first.context.resource_group, "instant8-azure-1700000000000");
        assert_eq!(first.context.location, "westeurope");
    }

    #[test]
    fn test_step_order_and_workload_lines() {
        let plan = ProvisioningPlan::build::<AzureProfile>(
            &request(WorkloadType::WebApplication, "us-east-1"),
            "azure-1",
        );
        let kinds: Vec<StepKind> = plan.steps.iter().map(|s| s.kind).collect();
        assert_eq!(kinds[..6], [
            StepKind::AuthContext,
            StepKind::ResourceGroup,
            StepKind::Compute,
            StepKind::OperatingSystem,
            StepKind::Storage,
            StepKind::Network,
        ]);
        assert_eq!(plan.len(), 9);
        assert!(plan.steps.iter().enumerate().all(|(i, s)| s.index == i + 1));

        let lines: Vec<&str> = plan.steps.iter().map(|s| s.line.as_str()).collect();
        assert!(lines.iter().any(|l| l.contains("Nginx")));
        assert!(lines.iter().any(|l| l.contains("SSL")));
        assert!(lines.iter().any(|l| l.contains("load balancer")));
    }

    #[test]
    fn test_workload_lines_use_profile_products() {
        let plan = ProvisioningPlan::build::<AzureProfile>(
            &request(WorkloadType::WebApplication, "us-east-1"),
            "azure-1",
        );
        let balancer = plan
            .steps
            .iter()
            .find(|s| s.kind == StepKind::Workload(WorkloadStep::LoadBalancer))
            .unwrap();
        assert_eq!(
            balancer.line,
            "📡 Setting up load balancer (Azure Application Gateway with WAF)..."
        );

        let ml = ProvisioningPlan::build::<AwsProfile>(
            &request(WorkloadType::MachineLearning, "us-east-1"),
            "aws-1",
        );
        assert!(ml.steps.iter().any(|s| s.line.contains("g4dn.xlarge")));
    }

    #[test]
    fn test_unknown_workload_has_generic_steps_only() {
        let plan = ProvisioningPlan::build::<GcpProfile>(
            &request(WorkloadType::Other(String::from("batch")), "us-east-1"),
            "gcp-1",
        );
        assert_eq!(plan.len(), 6);
        assert_eq!(plan.url, "https://batch-gcp-1.run.app");
    }

    #[test]
    fn test_unmapped_region_uses_default() {
        let config = request(WorkloadType::ApiBackend, "mars-north-1");
        let azure = ProvisioningPlan::build::<AzureProfile>(&config, "azure-1");
        let aws = ProvisioningPlan::build::<AwsProfile>(&config, "aws-1");
        let gcp = ProvisioningPlan::build::<GcpProfile>(&config, "gcp-1");
        assert_eq!(azure.context.location, "eastus");
        assert_eq!(aws.context.location, "us-east-1");
        assert_eq!(gcp.context.location, "us-central1");
    }

    #[test]
    fn test_sizing_and_tags() {
        let plan = ProvisioningPlan::build::<AwsProfile>(
            &request(WorkloadType::MachineLearning, "us-west-2"),
            "aws-42",
        );
        assert_eq!(plan.context.instance_size, "m5.xlarge");
        assert_eq!(plan.context.disk_sku, "gp3");
        assert_eq!(plan.context.disk_size_gb, 50);
        assert_eq!(plan.context.tags["created-by"], "instant8");
        assert_eq!(plan.context.tags["deployment-id"], "aws-42");
        assert_eq!(plan.context.tags["config-hash"].len(), 8);
        assert!(plan.steps.iter().any(|s| s.line.contains("g4dn.xlarge")));
    }

    #[test]
    fn test_pick_size_falls_back_to_largest() {
        let huge = ComputeRequest {
            cores: 512,
            memory_gb: 4096,
        };
        let picked = pick_size(AzureProfile::sizes(), huge).unwrap();
        assert_eq!(Some(picked), AzureProfile::sizes().last());
    }

    #[test]
    fn test_region_lookup_accepts_native_names() {
        let regions = AzureProfile::regions();
        assert_eq!(regions.lookup("WestEurope"), Some("westeurope"));
        assert_eq!(regions.lookup(" us-west-1 "), Some("westus"));
        assert_eq!(regions.lookup("atlantis"), None);
    }

    #[test]
    fn test_stage_mapping() {
        assert_eq!(StepKind::AuthContext.stage(), DeploymentStage::Authentication);
        assert_eq!(StepKind::Storage.stage(), DeploymentStage::Compute);
        assert_eq!(
            StepKind::Workload(WorkloadStep::HealthChecks).stage(),
            DeploymentStage::HealthCheck
        );
    }
}
