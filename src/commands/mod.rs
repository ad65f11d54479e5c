pub mod check_config;

use crate::Config;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Print which integrations are configured, without secrets, and exit
    CheckConfig {
        #[arg(long, help = "Print the report as JSON")]
        json: bool,
    },
}

pub async fn handle_command(
    command: Commands,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::CheckConfig { json } => check_config::handle_check_config(config, json),
    }
}
