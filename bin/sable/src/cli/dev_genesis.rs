use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use sable_consensus_beacon::{
    dev_deposits::{DEV_ETH1_BLOCK_HASH, dev_deposits},
    genesis::genesis_from_eth1,
};
use sable_network_spec::{cli::beacon_network_parser, networks::BeaconNetworkSpec};
use tracing::info;

use crate::cli::{
    constants::{DEFAULT_DEV_NETWORK, DEFAULT_DEV_VALIDATOR_COUNT},
    genesis::write_genesis_state,
};

#[derive(Debug, Parser)]
pub struct DevGenesisConfig {
    #[arg(
        long,
        help = "Choose mainnet, dev or provide a path to a YAML config file",
        default_value = DEFAULT_DEV_NETWORK,
        value_parser = beacon_network_parser
    )]
    pub network: Arc<BeaconNetworkSpec>,

    #[arg(long, help = "Number of deterministic validators", default_value_t = DEFAULT_DEV_VALIDATOR_COUNT)]
    pub validators: u64,

    #[arg(long, help = "Eth1 timestamp, defaults to MIN_GENESIS_TIME of the network")]
    pub eth1_timestamp: Option<u64>,

    #[arg(long, short, help = "Where to write the state (.ssz or .ssz_snappy)")]
    pub output: PathBuf,
}

pub fn run_dev_genesis(config: DevGenesisConfig) -> anyhow::Result<()> {
    info!(validators = config.validators, "Generating dev deposits");
    let deposits = dev_deposits(config.validators, &config.network)?;
    let (state, _) = genesis_from_eth1(
        &config.network,
        DEV_ETH1_BLOCK_HASH,
        config
            .eth1_timestamp
            .unwrap_or(config.network.min_genesis_time),
        &deposits,
        false,
    )?;
    write_genesis_state(state, &config.network, &config.output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use sable_consensus_beacon::{
        dev_deposits::dev_genesis_state,
        versioned_state::{ForkName, VersionedBeaconState},
    };
    use sable_network_spec::networks::DEV;
    use tempfile::tempdir;

    use super::*;
    use crate::state_file::read_state;

    #[test]
    fn test_dev_genesis_matches_library_state() {
        let directory = tempdir().expect("temp dir");
        let output = directory.path().join("dev.ssz_snappy");
        run_dev_genesis(DevGenesisConfig {
            network: DEV.clone(),
            validators: 64,
            eth1_timestamp: None,
            output: output.clone(),
        })
        .expect("dev genesis");

        let state = read_state(&output, ForkName::Bellatrix).expect("read");
        assert!(state.is_valid_genesis_state(&DEV));

        let (expected, _) = dev_genesis_state(64).expect("genesis");
        let expected = VersionedBeaconState::Phase0(expected)
            .upgrade_through_epoch(0, &DEV)
            .expect("upgrade");
        assert_eq!(state.tree_hash_root(), expected.tree_hash_root());
    }
}
