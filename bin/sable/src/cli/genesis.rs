use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use alloy_primitives::B256;
use anyhow::anyhow;
use clap::Parser;
use sable_consensus_beacon::{
    genesis::genesis_from_eth1, phase0::beacon_state::BeaconState,
    versioned_state::VersionedBeaconState,
};
use sable_consensus_misc::{constants::GENESIS_EPOCH, deposit::Deposit};
use sable_network_spec::{cli::beacon_network_parser, networks::BeaconNetworkSpec};
use tracing::{info, warn};

use crate::{cli::constants::DEFAULT_NETWORK, state_file::write_state};

#[derive(Debug, Parser)]
pub struct GenesisConfig {
    #[arg(
        long,
        help = "Choose mainnet, dev or provide a path to a YAML config file",
        default_value = DEFAULT_NETWORK,
        value_parser = beacon_network_parser
    )]
    pub network: Arc<BeaconNetworkSpec>,

    #[arg(long, help = "Hash of the eth1 block that triggers genesis")]
    pub eth1_block_hash: B256,

    #[arg(long, help = "Timestamp of the eth1 block that triggers genesis")]
    pub eth1_timestamp: u64,

    #[arg(long, help = "YAML file listing the deposits in contract order")]
    pub deposits: PathBuf,

    #[arg(long, help = "Skip deposit Merkle proof and signature checks")]
    pub ignore_signatures_and_proofs: bool,

    #[arg(long, short, help = "Where to write the state (.ssz or .ssz_snappy)")]
    pub output: PathBuf,
}

pub fn read_deposits(path: &Path) -> anyhow::Result<Vec<Deposit>> {
    let contents = fs::read_to_string(path)
        .map_err(|err| anyhow!("Failed to read deposits {}: {err}", path.display()))?;
    serde_yaml::from_str(&contents).map_err(|err| anyhow!("Failed to parse deposits: {err}"))
}

/// Apply every fork active at genesis to ``state`` and write it to ``output``.
pub fn write_genesis_state(
    state: BeaconState,
    network_spec: &BeaconNetworkSpec,
    output: &Path,
) -> anyhow::Result<VersionedBeaconState> {
    let state = VersionedBeaconState::Phase0(state)
        .upgrade_through_epoch(GENESIS_EPOCH, network_spec)?;
    if !state.is_valid_genesis_state(network_spec) {
        warn!(
            network = ?network_spec.network,
            "Genesis state does not meet the genesis trigger"
        );
    }

    write_state(output, &state)?;
    info!(
        fork = %state.fork_name(),
        state_root = ?state.tree_hash_root(),
        output = %output.display(),
        "Wrote genesis state"
    );
    Ok(state)
}

pub fn run_genesis(config: GenesisConfig) -> anyhow::Result<()> {
    let deposits = read_deposits(&config.deposits)?;
    info!(deposit_count = deposits.len(), "Building genesis state");
    let (state, _) = genesis_from_eth1(
        &config.network,
        config.eth1_block_hash,
        config.eth1_timestamp,
        &deposits,
        config.ignore_signatures_and_proofs,
    )?;
    write_genesis_state(state, &config.network, &config.output)?;
    Ok(())
}
