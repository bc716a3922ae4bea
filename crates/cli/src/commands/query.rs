use clap::Args;
use quorum_core::{
    config::AppConfig,
    quorum::{QuorumExecutor, QuorumMetadata},
    Command, CommandKind,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use super::utils::{CliError, CliResult};

#[derive(Args)]
pub struct QueryArgs {
    /// Command name, e.g. getBalances or wereAddressesSpentFrom
    pub command: String,

    /// Command parameters as a JSON object
    #[arg(short, long, default_value = "{}")]
    pub params: String,

    /// Print only the result without execution metadata
    #[arg(long)]
    pub raw: bool,
}

#[derive(Serialize)]
struct QueryOutput<'a> {
    command: &'a str,
    result: Value,
    metadata: &'a QuorumMetadata,
}

pub fn build_executor(config: &AppConfig) -> CliResult<QuorumExecutor> {
    config.validate().map_err(CliError::Config)?;
    let executor = QuorumExecutor::with_http_config(config.quorum.clone(), config.http.clone())?;
    Ok(executor)
}

pub fn parse_command(name: &str, params: &str) -> CliResult<Command> {
    let params: Value = serde_json::from_str(params)?;
    if !params.is_object() {
        return Err(CliError::InvalidInput("params must be a JSON object".to_string()));
    }
    Ok(Command::with_params(CommandKind::from(name), &params)?)
}

pub async fn run_query(config: &AppConfig, args: QueryArgs) -> CliResult<()> {
    let command = parse_command(&args.command, &args.params)?;
    let executor = build_executor(config)?;

    debug!(command = %command.kind(), strategy = executor.strategy_for(command.kind()).as_str(), "running query");

    let result = executor.execute_detailed(&command).await?;
    info!(
        command = %command.kind(),
        duration_ms = result.metadata.duration_ms,
        votes = result.metadata.votes,
        "query completed"
    );

    let value: Value = result.decode()?;
    if args.raw {
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        let output =
            QueryOutput { command: command.kind().as_str(), result: value, metadata: &result.metadata };
        println!("{}", serde_json::to_string_pretty(&output)?);
    }
    Ok(())
}

pub async fn run_milestone(config: &AppConfig) -> CliResult<()> {
    let executor = build_executor(config)?;
    let milestone = executor.latest_solid_subtangle_milestone().await?;
    println!("{}", serde_json::to_string_pretty(&milestone)?);
    Ok(())
}
