use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use berth::{Host, Registry};
use berth_bootstrap::{AppConfig, CliArgs};

mod registered_modules;

/// Berth Server - module lifecycle host
#[derive(Parser)]
#[command(name = "berth-server")]
#[command(about = "Berth Server - module lifecycle host")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print effective configuration (YAML) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Validate configuration and exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        print_config: cli.print_config,
        verbose: cli.verbose,
    };

    // Layered config:
    // 1) defaults -> 2) YAML (if provided) -> 3) env (BERTH__*) -> 4) CLI overrides
    // Also normalizes + creates server.home_dir.
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.clone().unwrap_or_default();
    berth_bootstrap::logging::init_logging(&logging_config, Path::new(&config.server.home_dir));

    tracing::info!("Berth Server starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(config).await,
    }
}

async fn run_server(config: AppConfig) -> Result<()> {
    tracing::info!("Wiring modules…");

    // Bridge AppConfig into the registry's config provider, with the
    // module schemas the host knows about.
    let provider = Arc::new(registered_modules::config_provider(config));

    let registry = Arc::new(Registry::new(provider.clone()));
    registry.set_configs(provider.module_configs())?;
    registered_modules::bind_modules(&registry, provider.inner())?;

    let host = Host::new(registry);
    host.register_stop_signal(async {
        let _ = berth_bootstrap::signals::wait_for_shutdown().await;
    });

    host.init(registered_modules::START_ORDER).await?;
    // Blocks until a stop signal fires.
    host.start(registered_modules::START_ORDER).await?;
    host.shutdown(registered_modules::STOP_ORDER).await?;

    tracing::info!("Berth Server stopped");
    Ok(())
}

async fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration…");

    // Run every module config through the same schema checks the registry
    // would apply on startup.
    let provider = registered_modules::config_provider(config);
    for (key, value) in provider.module_configs() {
        berth::ConfigProvider::validate(&provider, &key, &value)?;
    }

    println!("Configuration is valid");
    println!("{}", provider.inner().to_yaml()?);
    Ok(())
}
