use std::{fs, sync::Arc};

use crate::networks::{BeaconNetworkSpec, DEV, MAINNET};

/// Resolves ``--network``: a built-in network name or the path to a config YAML file.
pub fn beacon_network_parser(network_string: &str) -> Result<Arc<BeaconNetworkSpec>, String> {
    match network_string {
        "mainnet" => Ok(MAINNET.clone()),
        "dev" => Ok(DEV.clone()),
        path => read_network_spec(path),
    }
}

fn read_network_spec(path: &str) -> Result<Arc<BeaconNetworkSpec>, String> {
    let contents = fs::read_to_string(path).map_err(|err| format!("Failed to read file: {err}"))?;
    Ok(Arc::new(serde_yaml::from_str(&contents).map_err(
        |err| format!("Failed to parse YAML from: {err}"),
    )?))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use alloy_primitives::fixed_bytes;

    use super::*;
    use crate::networks::Network;

    #[test]
    fn test_builtin_networks() {
        assert_eq!(
            beacon_network_parser("mainnet").expect("mainnet"),
            MAINNET.clone()
        );
        assert_eq!(beacon_network_parser("dev").expect("dev").network, Network::Dev);
    }

    #[test]
    fn test_network_from_yaml_file_ignores_unknown_keys() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            r#"PRESET_BASE: 'mainnet'
CONFIG_NAME: 'kurtosis'
MIN_GENESIS_ACTIVE_VALIDATOR_COUNT: 64
MIN_GENESIS_TIME: 1700000000
GENESIS_FORK_VERSION: 0x10000038
GENESIS_DELAY: 60
ALTAIR_FORK_VERSION: 0x20000038
ALTAIR_FORK_EPOCH: 0
BELLATRIX_FORK_VERSION: 0x30000038
BELLATRIX_FORK_EPOCH: 0
SECONDS_PER_SLOT: 6
DEPOSIT_CHAIN_ID: 3151908
TERMINAL_TOTAL_DIFFICULTY: 0"#
        )
        .expect("write config");

        let network_spec =
            beacon_network_parser(file.path().to_str().expect("utf-8 path")).expect("parse");
        assert_eq!(
            network_spec.network,
            Network::Custom("kurtosis".to_string())
        );
        assert_eq!(network_spec.min_genesis_active_validator_count, 64);
        assert_eq!(network_spec.genesis_fork_version, fixed_bytes!("0x10000038"));
        assert_eq!(network_spec.bellatrix_fork_version, fixed_bytes!("0x30000038"));
        assert_eq!(network_spec.seconds_per_slot, 6);
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = beacon_network_parser("/nonexistent/config.yaml").expect_err("missing file");
        assert!(err.starts_with("Failed to read file"));
    }
}
