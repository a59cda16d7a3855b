//! Instant8 CLI entrypoint.
//!
//! This is the main entrypoint for the instant8 command-line tool.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use instant8_deploy::auth::Authenticators;
use instant8_deploy::cli::{Cli, Commands, CredentialCheck, LogFormat, OutputFormatter};
use instant8_deploy::config::{
    ConfigParser, ConfigValidator, EnvLookup, OrchestratorSettings, find_settings_file, process_env,
};
use instant8_deploy::credentials::{CredentialStore, EnvVarFileSource, ProcessEnvSource};
use instant8_deploy::error::Result;
use instant8_deploy::orchestrator::DeploymentOrchestrator;
use instant8_deploy::progress::ProgressTracker;
use instant8_deploy::provider::{Provider, ProviderSelection};

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.log_format);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<ExitCode> {
    let formatter = OutputFormatter::new(cli.output);
    let env = process_env();
    let settings = load_settings(cli.settings.as_deref(), &env)?;

    match cli.command {
        Commands::Deploy {
            config,
            provider,
            credentials,
            progress,
        } => {
            cmd_deploy(
                settings,
                env,
                &config,
                &provider,
                credentials,
                progress,
                &formatter,
            )
            .await
        }
        Commands::Validate { config, provider } => {
            cmd_validate(&settings, &config, &provider, &formatter)
        }
        Commands::Credentials { credentials } => {
            Ok(cmd_credentials(&settings, env, credentials, &formatter).await)
        }
        Commands::Regions { provider } => cmd_regions(provider.as_deref(), &formatter),
    }
}

/// Loads `.env`, then the settings file or defaults with environment overrides.
fn load_settings(path: Option<&Path>, env: &EnvLookup) -> Result<OrchestratorSettings> {
    let parser = ConfigParser::new();
    parser.load_dotenv()?;

    match path.map(Path::to_path_buf).or_else(|| find_settings_file(".")) {
        Some(path) => parser.load_settings(path, env),
        None => {
            debug!("No settings file found, using defaults");
            let mut settings = OrchestratorSettings::default();
            ConfigParser::apply_env_overrides(&mut settings, env)?;
            settings.validate()?;
            Ok(settings)
        }
    }
}

/// Builds the credential store, falling back to a records file or the
/// process environment.
fn credential_store(records: Option<PathBuf>, env: EnvLookup) -> CredentialStore {
    match records {
        Some(path) => {
            info!("Reading credentials from {}", path.display());
            CredentialStore::with_source(Arc::new(EnvVarFileSource::new(path)))
        }
        None => CredentialStore::with_source(Arc::new(ProcessEnvSource::new(env))),
    }
}

/// Deploy a request.
async fn cmd_deploy(
    settings: OrchestratorSettings,
    env: EnvLookup,
    config_path: &Path,
    provider: &str,
    records: Option<PathBuf>,
    show_progress: bool,
    formatter: &OutputFormatter,
) -> Result<ExitCode> {
    let config = ConfigParser::new().load_deployment(config_path)?;
    let store = Arc::new(credential_store(records, Arc::clone(&env)));
    let progress = settings.progress.clone();
    let orchestrator = DeploymentOrchestrator::new(settings, store).with_env(env);

    let result = if show_progress {
        let mut tracker = ProgressTracker::new(progress);
        let result = orchestrator
            .deploy_tracked(&config, provider, &mut tracker)
            .await;
        eprintln!("{}", formatter.format_board(&tracker.snapshot()));
        result
    } else {
        orchestrator.deploy_to_provider(&config, provider).await
    };

    eprintln!("{}", formatter.format_result(&result));
    Ok(exit_code(result.success))
}

/// Validate a request against a provider.
fn cmd_validate(
    settings: &OrchestratorSettings,
    config_path: &Path,
    provider: &str,
    formatter: &OutputFormatter,
) -> Result<ExitCode> {
    let config = ConfigParser::new().load_deployment(config_path)?;
    let provider = ProviderSelection::resolve(provider, settings.fallback_provider)?.provider();

    let report = ConfigValidator::new().validate(&config, provider);
    eprintln!("{}", formatter.format_validation(provider, &report));
    Ok(exit_code(report.is_clean()))
}

/// Check every provider's credentials.
async fn cmd_credentials(
    settings: &OrchestratorSettings,
    env: EnvLookup,
    records: Option<PathBuf>,
    formatter: &OutputFormatter,
) -> ExitCode {
    let store = credential_store(records, Arc::clone(&env));
    let credentials = store.get_credentials().await;
    let authenticators = Authenticators::from_settings(settings, env);

    let mut checks = Vec::with_capacity(Provider::ALL.len());
    for provider in Provider::ALL {
        let authenticator = authenticators.for_provider(provider).as_ref();
        checks.push(CredentialCheck::run(authenticator, &credentials).await);
    }

    eprintln!("{}", formatter.format_credentials(&checks));
    exit_code(checks.iter().any(|c| c.valid))
}

/// List region mappings.
fn cmd_regions(provider: Option<&str>, formatter: &OutputFormatter) -> Result<ExitCode> {
    let providers = match provider {
        Some(name) => vec![name.parse::<Provider>()?],
        None => Provider::ALL.to_vec(),
    };

    eprintln!("{}", formatter.format_regions(&providers));
    Ok(ExitCode::SUCCESS)
}

const fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
