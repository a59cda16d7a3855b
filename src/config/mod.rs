//! Configuration module for the Instant8 orchestrator.
//!
//! This module handles all configuration-related functionality:
//! - Deployment request types and sizing descriptors
//! - Orchestrator settings from `instant8.yaml` and the environment
//! - Advisory validation of deployment requests
//! - Request fingerprints for resource tagging

mod hash;
mod parser;
mod settings;
mod spec;
mod validator;

pub use hash::ConfigHasher;
pub use parser::{
    ConfigFormat, ConfigParser, DEFAULT_SETTINGS_FILES, EnvLookup, find_settings_file,
    process_env,
};
pub use settings::{
    AZURE_LOGIN_ENDPOINT, AZURE_MANAGEMENT_ENDPOINT, AZURE_RESOURCES_API_VERSION, AwsSettings,
    AzureSettings, ExecutionMode, OrchestratorSettings, ProgressSettings,
};
pub use spec::{
    ComputeRequest, DEFAULT_CORES, DEFAULT_MEMORY_GB, DEFAULT_STORAGE_GB, DeploymentConfig,
    StorageMedium, StorageRequest, WorkloadType,
};
pub use validator::{ConfigValidator, Severity, ValidationIssue, ValidationReport};
