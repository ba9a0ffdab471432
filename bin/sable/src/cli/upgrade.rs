use std::{path::PathBuf, sync::Arc};

use anyhow::anyhow;
use clap::Parser;
use sable_consensus_beacon::versioned_state::ForkName;
use sable_network_spec::{cli::beacon_network_parser, networks::BeaconNetworkSpec};
use tracing::info;

use crate::{
    cli::constants::DEFAULT_NETWORK,
    state_file::{read_state, write_state},
};

#[derive(Debug, Parser)]
pub struct UpgradeConfig {
    #[arg(
        long,
        help = "Choose mainnet, dev or provide a path to a YAML config file",
        default_value = DEFAULT_NETWORK,
        value_parser = beacon_network_parser
    )]
    pub network: Arc<BeaconNetworkSpec>,

    #[arg(long, short, help = "State file to upgrade (.ssz or .ssz_snappy)")]
    pub input: PathBuf,

    #[arg(long, help = "Fork of the input state: phase0 or altair")]
    pub fork: ForkName,

    #[arg(long, short, help = "Where to write the upgraded state")]
    pub output: PathBuf,
}

pub fn run_upgrade(config: UpgradeConfig) -> anyhow::Result<()> {
    let target = config
        .fork
        .next()
        .ok_or_else(|| anyhow!("{} is the latest supported fork", config.fork))?;
    let state = read_state(&config.input, config.fork)?;
    let epochs_context = state.epochs_context()?;
    let state = state.upgrade(&epochs_context, &config.network)?;
    write_state(&config.output, &state)?;

    info!(
        from = %config.fork,
        to = %target,
        slot = state.slot(),
        state_root = ?state.tree_hash_root(),
        "Upgraded state"
    );
    Ok(())
}
