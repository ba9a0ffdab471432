use std::{fmt, str::FromStr};

use alloy_primitives::B256;
use anyhow::bail;
use sable_network_spec::networks::BeaconNetworkSpec;
use serde::{Deserialize, Serialize};
use ssz::{Decode, Encode};
use tree_hash::TreeHash;

use crate::{
    altair, bellatrix, epochs_context::EpochsContext, genesis::is_valid_genesis_state, phase0,
    upgrade::{altair::upgrade_to_altair, bellatrix::upgrade_to_bellatrix},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForkName {
    Phase0,
    Altair,
    Bellatrix,
}

impl ForkName {
    pub fn next(self) -> Option<ForkName> {
        match self {
            ForkName::Phase0 => Some(ForkName::Altair),
            ForkName::Altair => Some(ForkName::Bellatrix),
            ForkName::Bellatrix => None,
        }
    }
}

impl fmt::Display for ForkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForkName::Phase0 => write!(f, "phase0"),
            ForkName::Altair => write!(f, "altair"),
            ForkName::Bellatrix => write!(f, "bellatrix"),
        }
    }
}

impl FromStr for ForkName {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "phase0" => Ok(ForkName::Phase0),
            "altair" => Ok(ForkName::Altair),
            "bellatrix" | "merge" => Ok(ForkName::Bellatrix),
            _ => bail!("Unknown fork: {s}"),
        }
    }
}

/// A beacon state of any supported fork.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionedBeaconState {
    Phase0(phase0::beacon_state::BeaconState),
    Altair(altair::beacon_state::BeaconState),
    Bellatrix(bellatrix::beacon_state::BeaconState),
}

impl VersionedBeaconState {
    pub fn from_ssz_bytes(fork_name: ForkName, bytes: &[u8]) -> anyhow::Result<Self> {
        let decode_error =
            |err: ssz::DecodeError| anyhow::anyhow!("Failed to decode {fork_name} state: {err:?}");
        Ok(match fork_name {
            ForkName::Phase0 => Self::Phase0(
                phase0::beacon_state::BeaconState::from_ssz_bytes(bytes).map_err(decode_error)?,
            ),
            ForkName::Altair => Self::Altair(
                altair::beacon_state::BeaconState::from_ssz_bytes(bytes).map_err(decode_error)?,
            ),
            ForkName::Bellatrix => Self::Bellatrix(
                bellatrix::beacon_state::BeaconState::from_ssz_bytes(bytes)
                    .map_err(decode_error)?,
            ),
        })
    }

    pub fn as_ssz_bytes(&self) -> Vec<u8> {
        match self {
            Self::Phase0(state) => state.as_ssz_bytes(),
            Self::Altair(state) => state.as_ssz_bytes(),
            Self::Bellatrix(state) => state.as_ssz_bytes(),
        }
    }

    pub fn tree_hash_root(&self) -> B256 {
        match self {
            Self::Phase0(state) => state.tree_hash_root(),
            Self::Altair(state) => state.tree_hash_root(),
            Self::Bellatrix(state) => state.tree_hash_root(),
        }
    }

    pub fn fork_name(&self) -> ForkName {
        match self {
            Self::Phase0(_) => ForkName::Phase0,
            Self::Altair(_) => ForkName::Altair,
            Self::Bellatrix(_) => ForkName::Bellatrix,
        }
    }

    pub fn slot(&self) -> u64 {
        match self {
            Self::Phase0(state) => state.slot,
            Self::Altair(state) => state.slot,
            Self::Bellatrix(state) => state.slot,
        }
    }

    /// Rebuild the epochs context of the wrapped state.
    pub fn epochs_context(&self) -> anyhow::Result<EpochsContext> {
        match self {
            Self::Phase0(state) => EpochsContext::load(state),
            Self::Altair(state) => EpochsContext::load(state),
            Self::Bellatrix(state) => EpochsContext::load(state),
        }
    }

    /// Upgrade the state to the next fork.
    pub fn upgrade(
        self,
        epochs_context: &EpochsContext,
        network_spec: &BeaconNetworkSpec,
    ) -> anyhow::Result<Self> {
        Ok(match self {
            Self::Phase0(state) => {
                Self::Altair(upgrade_to_altair(state, epochs_context, network_spec)?)
            }
            Self::Altair(state) => Self::Bellatrix(upgrade_to_bellatrix(state, network_spec)),
            Self::Bellatrix(_) => bail!("bellatrix is the latest supported fork"),
        })
    }

    /// Apply every fork upgrade scheduled at ``epoch`` or earlier.
    pub fn upgrade_through_epoch(
        mut self,
        epoch: u64,
        network_spec: &BeaconNetworkSpec,
    ) -> anyhow::Result<Self> {
        loop {
            let activation_epoch = match self.fork_name() {
                ForkName::Phase0 => network_spec.altair_fork_epoch,
                ForkName::Altair => network_spec.bellatrix_fork_epoch,
                ForkName::Bellatrix => return Ok(self),
            };
            if activation_epoch > epoch {
                return Ok(self);
            }
            let epochs_context = self.epochs_context()?;
            self = self.upgrade(&epochs_context, network_spec)?;
        }
    }

    pub fn is_valid_genesis_state(&self, network_spec: &BeaconNetworkSpec) -> bool {
        match self {
            Self::Phase0(state) => is_valid_genesis_state(state, network_spec),
            Self::Altair(state) => is_valid_genesis_state(state, network_spec),
            Self::Bellatrix(state) => is_valid_genesis_state(state, network_spec),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use sable_network_spec::networks::{DEV, MAINNET};

    use super::*;
    use crate::dev_deposits::dev_genesis_state;

    #[rstest]
    #[case("phase0", ForkName::Phase0)]
    #[case("Altair", ForkName::Altair)]
    #[case("bellatrix", ForkName::Bellatrix)]
    #[case("merge", ForkName::Bellatrix)]
    fn test_fork_name_from_str(#[case] input: &str, #[case] expected: ForkName) {
        assert_eq!(input.parse::<ForkName>().expect("fork name"), expected);
    }

    #[test]
    fn test_unknown_fork_name() {
        assert!("capella".parse::<ForkName>().is_err());
    }

    #[test]
    fn test_ssz_round_trip_per_fork() {
        let (state, _) = dev_genesis_state(32).expect("genesis");
        let phase0 = VersionedBeaconState::Phase0(state);
        let altair = phase0
            .clone()
            .upgrade(&phase0.epochs_context().expect("context"), &DEV)
            .expect("altair");

        for state in [phase0, altair] {
            let decoded =
                VersionedBeaconState::from_ssz_bytes(state.fork_name(), &state.as_ssz_bytes())
                    .expect("decode");
            assert_eq!(decoded.tree_hash_root(), state.tree_hash_root());
            assert_eq!(decoded, state);
        }
    }

    #[test]
    fn test_wrong_fork_fails_to_decode() {
        let (state, _) = dev_genesis_state(32).expect("genesis");
        let bytes = VersionedBeaconState::Phase0(state).as_ssz_bytes();
        assert!(VersionedBeaconState::from_ssz_bytes(ForkName::Bellatrix, &bytes).is_err());
    }

    #[test]
    fn test_upgrade_through_epoch_follows_schedule() {
        let (state, _) = dev_genesis_state(32).expect("genesis");

        // Dev activates both forks at genesis
        let upgraded = VersionedBeaconState::Phase0(state.clone())
            .upgrade_through_epoch(0, &DEV)
            .expect("upgrade");
        assert_eq!(upgraded.fork_name(), ForkName::Bellatrix);
        assert_eq!(upgraded.slot(), 0);

        // Mainnet forks are far in the future
        let untouched = VersionedBeaconState::Phase0(state)
            .upgrade_through_epoch(0, &MAINNET)
            .expect("upgrade");
        assert_eq!(untouched.fork_name(), ForkName::Phase0);

        let err = upgraded
            .upgrade(&EpochsContext::default(), &DEV)
            .expect_err("no fork after bellatrix");
        assert!(err.to_string().contains("latest supported fork"));
    }
}
