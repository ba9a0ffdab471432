mod cli;
mod state_file;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{
    Cli, Commands, check_genesis::run_check_genesis, dev_genesis::run_dev_genesis,
    genesis::run_genesis, upgrade::run_upgrade,
};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG takes precedence over --verbosity
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.verbosity.directive()));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Commands::Genesis(config) => run_genesis(config),
        Commands::DevGenesis(config) => run_dev_genesis(config),
        Commands::Upgrade(config) => run_upgrade(config),
        Commands::CheckGenesis(config) => run_check_genesis(config),
    }
}
