use clap::Subcommand;
use quorum_core::config::{AppConfig, DEFAULT_CONFIG_PATH};
use std::path::Path;

use super::utils::{print_error, print_info, print_success, CliError, CliResult};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate a configuration file
    Validate {
        /// Path to config file
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        file: String,
    },

    /// Show the effective configuration (file plus environment overrides)
    Show {
        /// Path to config file
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        file: String,

        /// Print as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Generate a sample configuration file
    Generate {
        /// Output path for the config file
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        output: String,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn handle_config_command(command: ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Validate { file } => validate_config(&file),
        ConfigCommands::Show { file, json } => show_config(&file, json),
        ConfigCommands::Generate { output, force } => generate_config(&output, force),
    }
}

fn validate_config(file: &str) -> CliResult<()> {
    if !Path::new(file).exists() {
        print_error(&format!("Configuration file not found: {file}"));
        return Err(CliError::Config(format!("File not found: {file}")));
    }

    print_info(&format!("Loading configuration from {file}..."));
    let config = AppConfig::from_file(file).map_err(|e| CliError::Config(e.to_string()))?;

    print_info("Validating configuration...");
    config.validate().map_err(CliError::Config)?;

    print_success("Configuration is valid!");

    println!("Configuration Summary:");
    println!("  Nodes: {}", config.quorum.nodes.len());
    println!("  Threshold: {:.2}", config.quorum.threshold);
    println!("  No-response tolerance: {:.2}", config.quorum.no_response_tolerance);
    println!("  Max freshness delta: {}", config.quorum.max_freshness_delta);
    println!(
        "  Primary node: {}",
        config.quorum.primary_node.as_deref().unwrap_or("none (random selection)")
    );

    Ok(())
}

fn show_config(file: &str, json: bool) -> CliResult<()> {
    let config = AppConfig::from_file(file).map_err(|e| CliError::Config(e.to_string()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    println!("Configuration from {file}:");

    println!("\n[Quorum]");
    println!("  Threshold: {}", config.quorum.threshold);
    println!("  No-response tolerance: {}", config.quorum.no_response_tolerance);
    println!("  Max freshness delta: {}", config.quorum.max_freshness_delta);
    if let Some(timeout) = config.quorum.node_timeout_seconds {
        println!("  Node timeout: {timeout}s");
    }
    println!("  Nodes ({}):", config.quorum.nodes.len());
    for node in &config.quorum.nodes {
        println!("    {node}");
    }
    if let Some(primary) = &config.quorum.primary_node {
        println!("  Primary node: {primary}");
    }
    if !config.quorum.forced_quorum_kinds.is_empty() {
        let mut kinds: Vec<_> =
            config.quorum.forced_quorum_kinds.iter().map(ToString::to_string).collect();
        kinds.sort();
        println!("  Forced quorum kinds: {}", kinds.join(", "));
    }

    let defaults = &config.quorum.defaults;
    if !defaults.is_empty() {
        println!("\n[Quorum Defaults]");
        if let Some(state) = defaults.were_addresses_spent_from {
            println!("  wereAddressesSpentFrom: {state}");
        }
        if let Some(state) = defaults.get_inclusion_states {
            println!("  getInclusionStates: {state}");
        }
        if let Some(balance) = defaults.get_balances {
            println!("  getBalances: {balance}");
        }
    }

    println!("\n[HTTP]");
    println!("  Concurrent limit: {}", config.http.concurrent_limit);
    println!("  Connect timeout: {}s", config.http.connect_timeout_seconds);
    println!("  Request timeout: {}s", config.http.request_timeout_seconds);
    println!("  API version: {}", config.http.api_version);

    println!("\n[Logging]");
    println!("  Level: {}", config.logging.level);
    println!("  Format: {}", config.logging.format);

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# Quorum client configuration

[quorum]
# At least two distinct nodes take part in every vote.
nodes = [
    "https://node-a.example.com:14265",
    "https://node-b.example.com:14265",
    "https://node-c.example.com:14265",
]
# Optional node answering commands that are not voted on.
# primary_node = "https://node-a.example.com:14265"

# Fraction of responding nodes that must agree, in (0.5, 1].
threshold = 0.95
# Fraction of nodes allowed to fail before a call is aborted, in [0, 1].
no_response_tolerance = 0.0
# Max. milestone index spread between nodes for the milestone query.
max_freshness_delta = 1
# Exempt command kinds that should still be voted on.
forced_quorum_kinds = []
# node_timeout_seconds = 20

[quorum.defaults]
# Used only when no quorum is reached.
# were_addresses_spent_from = true
# get_inclusion_states = false
# get_balances = 0

[http]
concurrent_limit = 256
connect_timeout_seconds = 5
request_timeout_seconds = 45

[logging]
level = "info"
format = "pretty"
"#;

fn generate_config(output: &str, force: bool) -> CliResult<()> {
    let path = Path::new(output);
    if path.exists() && !force {
        print_error(&format!("Configuration file already exists: {output}"));
        return Err(CliError::Config(format!("{output} exists, use --force to overwrite")));
    }

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, SAMPLE_CONFIG)?;

    print_success(&format!("Sample configuration written to {output}"));
    Ok(())
}
