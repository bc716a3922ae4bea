pub mod config;
pub mod query;
pub mod utils;

pub use config::{handle_config_command, ConfigCommands};
pub use query::{run_milestone, run_query, QueryArgs};
