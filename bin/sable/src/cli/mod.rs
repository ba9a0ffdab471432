pub mod check_genesis;
pub mod constants;
pub mod dev_genesis;
pub mod genesis;
pub mod upgrade;
pub mod verbosity;

use check_genesis::CheckGenesisConfig;
use clap::{Parser, Subcommand};
use constants::DEFAULT_VERBOSITY;
use dev_genesis::DevGenesisConfig;
use genesis::GenesisConfig;
use upgrade::UpgradeConfig;
use verbosity::{Verbosity, verbosity_parser};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (1=error, 2=warn, 3=info, 4=debug, 5=trace)
    #[arg(short, long, global = true, default_value = DEFAULT_VERBOSITY, value_parser = verbosity_parser)]
    pub verbosity: Verbosity,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build a genesis state from an eth1 block and a deposit file
    #[command(name = "genesis")]
    Genesis(GenesisConfig),

    /// Build a genesis state from deterministic dev validators
    #[command(name = "dev-genesis")]
    DevGenesis(DevGenesisConfig),

    /// Upgrade a state file to the next fork
    #[command(name = "upgrade")]
    Upgrade(UpgradeConfig),

    /// Check whether a state file is a valid genesis state
    #[command(name = "check-genesis")]
    CheckGenesis(CheckGenesisConfig),
}
