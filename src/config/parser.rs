//! Configuration parser for deployment requests and orchestrator settings.
//!
//! Deployment requests are read from YAML or JSON files; orchestrator settings
//! from `instant8.yaml` with `INSTANT8_*` environment overrides applied on top.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{ConfigError, Instant8Error, Result};
use crate::provider::Provider;

use super::settings::{ExecutionMode, OrchestratorSettings};
use super::spec::DeploymentConfig;

/// Looks up a variable by name; the process environment in production.
pub type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Returns an [`EnvLookup`] backed by the process environment.
#[must_use]
pub fn process_env() -> EnvLookup {
    Arc::new(|name| std::env::var(name).ok())
}

/// Default settings file names to search for.
pub const DEFAULT_SETTINGS_FILES: &[&str] = &["instant8.yaml", "instant8.yml"];

/// Configuration parser.
#[derive(Debug, Default)]
pub struct ConfigParser {
    /// Base path for resolving the `.env` file.
    base_path: Option<PathBuf>,
}

/// Serialization format of a deployment request file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML document.
    Yaml,
    /// JSON document.
    Json,
}

impl ConfigFormat {
    /// Picks the format from a file extension; anything but `.json` is YAML.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

impl ConfigParser {
    /// Creates a new configuration parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path used to locate `.env`.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads a deployment request from a YAML or JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_deployment(&self, path: impl AsRef<Path>) -> Result<DeploymentConfig> {
        let path = path.as_ref();
        info!("Loading deployment request from: {}", path.display());

        let content = read_file(path)?;
        self.parse_deployment(&content, ConfigFormat::from_path(path), Some(path))
    }

    /// Parses a deployment request from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is invalid.
    pub fn parse_deployment(
        &self,
        content: &str,
        format: ConfigFormat,
        source: Option<&Path>,
    ) -> Result<DeploymentConfig> {
        debug!("Parsing deployment request as {format:?}");

        let location = source.map(|p| p.display().to_string());
        let config: DeploymentConfig = match format {
            ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| {
                Instant8Error::Config(ConfigError::ParseError {
                    message: format!("YAML parse error: {e}"),
                    location,
                })
            })?,
            ConfigFormat::Json => serde_json::from_str(content).map_err(|e| {
                Instant8Error::Config(ConfigError::ParseError {
                    message: format!("JSON parse error: {e}"),
                    location,
                })
            })?,
        };

        debug!(
            "Parsed {} deployment for region {}",
            config.workload, config.region
        );
        Ok(config)
    }

    /// Loads orchestrator settings and applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if an
    /// override holds an invalid value.
    pub fn load_settings(
        &self,
        path: impl AsRef<Path>,
        env: &EnvLookup,
    ) -> Result<OrchestratorSettings> {
        let path = path.as_ref();
        info!("Loading orchestrator settings from: {}", path.display());

        let content = read_file(path)?;
        let mut settings = Self::parse_settings(&content, Some(path))?;
        Self::apply_env_overrides(&mut settings, env)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parses orchestrator settings from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_settings(content: &str, source: Option<&Path>) -> Result<OrchestratorSettings> {
        serde_yaml::from_str(content).map_err(|e| {
            Instant8Error::Config(ConfigError::ParseError {
                message: format!("YAML parse error: {e}"),
                location: source.map(|p| p.display().to_string()),
            })
        })
    }

    /// Applies `INSTANT8_*` overrides to the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if an override cannot be parsed.
    pub fn apply_env_overrides(settings: &mut OrchestratorSettings, env: &EnvLookup) -> Result<()> {
        if let Some(mode) = env("INSTANT8_MODE") {
            debug!("Overriding mode from environment");
            settings.mode = match mode.trim().to_ascii_lowercase().as_str() {
                "simulated" => ExecutionMode::Simulated,
                "live" => ExecutionMode::Live,
                other => {
                    return Err(ConfigError::invalid_setting(
                        "INSTANT8_MODE",
                        format!("expected 'simulated' or 'live', got '{other}'"),
                    )
                    .into());
                }
            };
        }

        if let Some(fallback) = env("INSTANT8_FALLBACK_PROVIDER") {
            debug!("Overriding fallback_provider from environment");
            settings.fallback_provider = if fallback.trim().is_empty() {
                None
            } else {
                Some(fallback.parse::<Provider>()?)
            };
        }

        if let Some(delay) = env("INSTANT8_STEP_DELAY_MS") {
            debug!("Overriding step_delay_ms from environment");
            settings.step_delay_ms = parse_number("INSTANT8_STEP_DELAY_MS", &delay)?;
        }

        if let Some(timeout) = env("INSTANT8_DEPLOY_TIMEOUT_SECS") {
            debug!("Overriding deploy_timeout_secs from environment");
            settings.deploy_timeout_secs = parse_number("INSTANT8_DEPLOY_TIMEOUT_SECS", &timeout)?;
        }

        if let Some(endpoint) = env("INSTANT8_AZURE_MANAGEMENT_ENDPOINT") {
            debug!("Overriding azure.management_endpoint from environment");
            settings.azure.management_endpoint = endpoint;
        }

        Ok(())
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                Instant8Error::Config(ConfigError::ParseError {
                    message: format!("Failed to load .env file: {e}"),
                    location: Some(env_path.display().to_string()),
                })
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }
}

/// Finds the settings file in the given directory or its parents.
///
/// Returns `None` when no settings file exists; callers fall back to defaults.
#[must_use]
pub fn find_settings_file(start_dir: impl AsRef<Path>) -> Option<PathBuf> {
    let mut current = absolute_start(start_dir.as_ref());

    loop {
        for filename in DEFAULT_SETTINGS_FILES {
            let candidate = current.join(filename);
            if candidate.exists() {
                info!("Found settings file: {}", candidate.display());
                return Some(candidate);
            }
        }

        if !current.pop() {
            warn!("No settings file found, using defaults");
            return None;
        }
    }
}

/// Relative paths such as `.` have no parent to walk up to.
fn absolute_start(dir: &Path) -> PathBuf {
    dir.canonicalize().unwrap_or_else(|e| {
        debug!("Cannot canonicalize {}: {e}", dir.display());
        dir.to_path_buf()
    })
}

fn read_file(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(Instant8Error::Config(ConfigError::FileNotFound {
            path: path.to_path_buf(),
        }));
    }

    std::fs::read_to_string(path).map_err(|e| {
        Instant8Error::Config(ConfigError::ParseError {
            message: format!("Failed to read file: {e}"),
            location: Some(path.display().to_string()),
        })
    })
}

fn parse_number(field: &str, value: &str) -> Result<u64> {
    value.trim().parse().map_err(|_| {
        ConfigError::invalid_setting(field, format!("expected a whole number, got '{value}'"))
            .into()
    })
}
