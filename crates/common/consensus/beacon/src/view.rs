use alloy_primitives::{B256, aliases::B32};
use anyhow::ensure;
use ethereum_hashing::hash;
use sable_bls::PubKey;
use sable_consensus_misc::{
    constants::{
        EPOCHS_PER_HISTORICAL_VECTOR, GENESIS_EPOCH, MAX_EFFECTIVE_BALANCE, MAX_RANDOM_BYTE,
        MIN_SEED_LOOKAHEAD, SLOTS_PER_HISTORICAL_ROOT,
    },
    fork::Fork,
    misc::{
        compute_domain, compute_epoch_at_slot, compute_shuffled_index,
        compute_start_slot_at_epoch,
    },
    validator::Validator,
};
use ssz_types::{
    FixedVector, VariableList,
    typenum::{U8192, U65536, U1099511627776},
};

use crate::{altair, bellatrix, phase0};

pub trait CoreView {
    fn genesis_time(&self) -> u64;
    fn genesis_validators_root(&self) -> B256;
    fn slot(&self) -> u64;
    fn fork(&self) -> &Fork;
}

pub trait ValidatorView: CoreView {
    fn validators(&self) -> &VariableList<Validator, U1099511627776>;
}

pub trait RandaoMixesView: CoreView {
    fn randao_mixes(&self) -> &FixedVector<B256, U65536>;
}

pub trait BlockRootsView: CoreView {
    fn block_roots(&self) -> &FixedVector<B256, U8192>;
}

macro_rules! impl_state_views {
    ($($state:ty),+ $(,)?) => {
        $(
            impl CoreView for $state {
                fn genesis_time(&self) -> u64 {
                    self.genesis_time
                }

                fn genesis_validators_root(&self) -> B256 {
                    self.genesis_validators_root
                }

                fn slot(&self) -> u64 {
                    self.slot
                }

                fn fork(&self) -> &Fork {
                    &self.fork
                }
            }

            impl ValidatorView for $state {
                fn validators(&self) -> &VariableList<Validator, U1099511627776> {
                    &self.validators
                }
            }

            impl RandaoMixesView for $state {
                fn randao_mixes(&self) -> &FixedVector<B256, U65536> {
                    &self.randao_mixes
                }
            }

            impl BlockRootsView for $state {
                fn block_roots(&self) -> &FixedVector<B256, U8192> {
                    &self.block_roots
                }
            }
        )+
    };
}

impl_state_views!(
    phase0::beacon_state::BeaconState,
    altair::beacon_state::BeaconState,
    bellatrix::beacon_state::BeaconState,
);

/// Read-only accessors shared by every state version.
pub trait BeaconStateAccessors: ValidatorView + RandaoMixesView + BlockRootsView {
    /// Return the current epoch.
    fn get_current_epoch(&self) -> u64 {
        compute_epoch_at_slot(self.slot())
    }

    /// Return the previous epoch (unless the current epoch is ``GENESIS_EPOCH``).
    fn get_previous_epoch(&self) -> u64 {
        let current_epoch = self.get_current_epoch();
        if current_epoch == GENESIS_EPOCH {
            GENESIS_EPOCH
        } else {
            current_epoch - 1
        }
    }

    /// Return the block root at the start of a recent ``epoch``.
    fn get_block_root(&self, epoch: u64) -> anyhow::Result<B256> {
        self.get_block_root_at_slot(compute_start_slot_at_epoch(epoch)?)
    }

    /// Return the block root at a recent ``slot``.
    fn get_block_root_at_slot(&self, slot: u64) -> anyhow::Result<B256> {
        ensure!(
            slot < self.slot() && self.slot() - slot <= SLOTS_PER_HISTORICAL_ROOT,
            "slot {slot} was outside of block_roots range at state slot {}",
            self.slot()
        );
        Ok(self.block_roots()[(slot % SLOTS_PER_HISTORICAL_ROOT) as usize])
    }

    /// Return the randao mix at a recent ``epoch``.
    fn get_randao_mix(&self, epoch: u64) -> B256 {
        self.randao_mixes()[(epoch % EPOCHS_PER_HISTORICAL_VECTOR) as usize]
    }

    /// Return the sequence of active validator indices at ``epoch``.
    fn get_active_validator_indices(&self, epoch: u64) -> Vec<u64> {
        self.validators()
            .iter()
            .enumerate()
            .filter(|(_, validator)| validator.is_active_validator(epoch))
            .map(|(index, _)| index as u64)
            .collect()
    }

    /// Return the seed at ``epoch``.
    fn get_seed(&self, epoch: u64, domain_type: B32) -> B256 {
        let mix =
            self.get_randao_mix(epoch + EPOCHS_PER_HISTORICAL_VECTOR - MIN_SEED_LOOKAHEAD - 1);
        B256::from_slice(&hash(
            &[domain_type.as_slice(), &epoch.to_le_bytes(), mix.as_slice()].concat(),
        ))
    }

    /// Return from ``indices`` a random index sampled by effective balance.
    fn compute_proposer_index(&self, indices: &[u64], seed: B256) -> anyhow::Result<u64> {
        ensure!(!indices.is_empty(), "Cannot sample a proposer from an empty set");

        let total = indices.len();
        let mut i = 0usize;
        loop {
            let candidate_index = indices[compute_shuffled_index(i % total, total, seed)?];
            let random_byte =
                hash(&[seed.as_slice(), &((i / 32) as u64).to_le_bytes()].concat())[i % 32];
            let effective_balance = self
                .validators()
                .get(candidate_index as usize)
                .map(|validator| validator.effective_balance)
                .ok_or_else(|| anyhow::anyhow!("Unknown validator index {candidate_index}"))?;

            if effective_balance * MAX_RANDOM_BYTE >= MAX_EFFECTIVE_BALANCE * random_byte as u64 {
                return Ok(candidate_index);
            }
            i += 1;
        }
    }

    /// Return the signature domain (fork version concatenated with domain type) of a message.
    fn get_domain(&self, domain_type: B32, epoch: Option<u64>) -> B256 {
        let epoch = epoch.unwrap_or_else(|| self.get_current_epoch());
        let fork = self.fork();
        let fork_version = if epoch < fork.epoch {
            fork.previous_version
        } else {
            fork.current_version
        };
        compute_domain(domain_type, fork_version, self.genesis_validators_root())
    }
}

impl<T: ValidatorView + RandaoMixesView + BlockRootsView> BeaconStateAccessors for T {}

/// The three reads the indexed attestation validator needs from a state.
pub trait AttestationValidator {
    /// Whether ``index`` addresses an entry of the validator registry.
    fn is_valid_index(&self, index: u64) -> bool;

    fn validator_pubkey(&self, index: u64) -> Option<&PubKey>;

    /// Signature domain for ``domain_type`` at ``epoch`` under the state's fork.
    fn signature_domain(&self, domain_type: B32, epoch: u64) -> B256;
}

impl<T: BeaconStateAccessors> AttestationValidator for T {
    fn is_valid_index(&self, index: u64) -> bool {
        index < self.validators().len() as u64
    }

    fn validator_pubkey(&self, index: u64) -> Option<&PubKey> {
        self.validators()
            .get(index as usize)
            .map(|validator| &validator.pubkey)
    }

    fn signature_domain(&self, domain_type: B32, epoch: u64) -> B256 {
        self.get_domain(domain_type, Some(epoch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dev_deposits::dev_genesis_state;

    #[test]
    fn test_block_roots_near_the_last_slot() {
        let (mut state, _) = dev_genesis_state(32).expect("genesis");
        state.slot = u64::MAX;
        state.block_roots[((u64::MAX - 1) % SLOTS_PER_HISTORICAL_ROOT) as usize] =
            B256::repeat_byte(0x42);

        assert_eq!(
            state.get_block_root_at_slot(u64::MAX - 1).expect("recent root"),
            B256::repeat_byte(0x42)
        );
        assert!(state.get_block_root_at_slot(u64::MAX).is_err());
        assert!(
            state
                .get_block_root_at_slot(u64::MAX - SLOTS_PER_HISTORICAL_ROOT - 1)
                .is_err()
        );
        assert!(state.get_block_root(u64::MAX).is_err());
    }
}
