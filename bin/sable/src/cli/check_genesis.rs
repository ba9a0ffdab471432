use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use sable_consensus_beacon::versioned_state::ForkName;
use sable_network_spec::{cli::beacon_network_parser, networks::BeaconNetworkSpec};
use tracing::info;

use crate::{cli::constants::DEFAULT_NETWORK, state_file::read_state};

#[derive(Debug, Parser)]
pub struct CheckGenesisConfig {
    #[arg(
        long,
        help = "Choose mainnet, dev or provide a path to a YAML config file",
        default_value = DEFAULT_NETWORK,
        value_parser = beacon_network_parser
    )]
    pub network: Arc<BeaconNetworkSpec>,

    #[arg(long, short, help = "State file to check (.ssz or .ssz_snappy)")]
    pub input: PathBuf,

    #[arg(long, help = "Fork of the input state", default_value = "phase0")]
    pub fork: ForkName,
}

pub fn check_genesis(config: &CheckGenesisConfig) -> anyhow::Result<bool> {
    let state = read_state(&config.input, config.fork)?;
    let is_valid = state.is_valid_genesis_state(&config.network);
    info!(
        fork = %state.fork_name(),
        network = ?config.network.network,
        is_valid,
        "Checked genesis state"
    );
    Ok(is_valid)
}

pub fn run_check_genesis(config: CheckGenesisConfig) -> anyhow::Result<()> {
    println!("{}", check_genesis(&config)?);
    Ok(())
}
