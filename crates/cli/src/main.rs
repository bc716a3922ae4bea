use anyhow::Result;
use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use quorum_core::config::{AppConfig, LoggingConfig, CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH};
use tracing::{debug, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
use commands::{handle_config_command, run_milestone, run_query, ConfigCommands, QueryArgs};

#[derive(Parser)]
#[command(name = "quorum-cli")]
#[command(about = "Quorum CLI - query several ledger nodes and return the answer they agree on")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file
    #[arg(short, long, global = true, env = CONFIG_PATH_ENV, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Print Prometheus metrics after the command finishes
    #[arg(long, global = true)]
    metrics: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration Management
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Execute one command against the configured nodes
    Query(QueryArgs),

    /// Latest solid subtangle milestone all nodes can vouch for
    Milestone,
}

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,quorum_core={level},quorum_cli={level}",
            level = config.level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);

    if config.format.as_str() == "json" {
        let fmt_layer = tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr);
        registry.with(fmt_layer).init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_file(true)
            .with_line_number(true)
            .with_target(false)
            .with_writer(std::io::stderr);
        registry.with(fmt_layer).init();
    }
}

fn install_metrics(enabled: bool) -> Option<PrometheusHandle> {
    if !enabled {
        return None;
    }
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!(error = %e, "failed to install metrics recorder");
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::from_file(&cli.config)
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {e}"))?;
    init_logging(&config.logging);
    debug!(
        config = %cli.config,
        nodes = config.quorum.nodes.len(),
        threshold = config.quorum.threshold,
        "configuration loaded"
    );

    let metrics_handle = install_metrics(cli.metrics);

    match cli.command {
        Commands::Config(config_command) => handle_config_command(config_command)?,
        Commands::Query(args) => run_query(&config, args).await?,
        Commands::Milestone => run_milestone(&config).await?,
    }

    if let Some(handle) = metrics_handle {
        print!("{}", handle.render());
    }

    Ok(())
}
