// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Instant8 Deploy
//!
//! A multi-cloud deployment orchestrator for Azure, AWS and GCP.
//!
//! ## Overview
//!
//! Instant8 takes one declarative request (OS, compute, memory, storage,
//! region, workload type) and a provider name, and:
//!
//! - Validates the provider's credentials from the session credential store
//! - Runs an ordered provisioning plan, one log line per step
//! - Returns a structured result with the endpoint or the error, never a panic
//! - Tracks every attempt by id so callers can poll its status
//!
//! ## Architecture
//!
//! ```text
//! DeploymentConfig + provider name
//!         │
//!         ▼
//! DeploymentOrchestrator ──► CredentialStore ──► ProviderAuthenticator
//!         │
//!         ▼
//! ProviderDeployer ──► ProvisioningPlan ──► ProvisioningBackend
//!         │
//!         ▼
//! DeploymentResult { success, deploymentId, url?, error?, logs }
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Request and settings parsing, validation, fingerprints
//! - [`credentials`]: Credential bundles, persisted sources and the store
//! - [`auth`]: Per-provider credential validation
//! - [`clients`]: Azure Resource Manager and AWS S3 clients
//! - [`deploy`]: Provisioning plans, backends and provider deployers
//! - [`orchestrator`]: The deployment facade and status registry
//! - [`progress`]: Step board and timer-driven progress tracker
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! os: Ubuntu 22.04 LTS
//! cpu: 4 cores
//! ram: 16GB
//! storage: 100GB SSD
//! region: us-east-1
//! type: web-application
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod auth;
pub mod cli;
pub mod clients;
pub mod config;
pub mod credentials;
pub mod deploy;
pub mod error;
pub mod orchestrator;
pub mod progress;
pub mod provider;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{ConfigParser, ConfigValidator, DeploymentConfig, OrchestratorSettings};
pub use credentials::{CredentialBundle, CredentialSet, CredentialStore};
pub use deploy::{DeploymentLog, DeploymentResult, ProviderDeployer};
pub use error::{Instant8Error, Result};
pub use orchestrator::{DeploymentOrchestrator, DeploymentStatusReport};
pub use progress::{ProgressTracker, StepBoard};
pub use provider::Provider;
