use std::sync::Arc;

use alloy_primitives::B256;
use anyhow::{anyhow, ensure};
use ethereum_hashing::hash;
use sable_bls::{PubKey, traits::Aggregatable};
use sable_consensus_misc::{
    attestation_data::AttestationData,
    beacon_block_header::BeaconBlockHeader,
    checkpoint::Checkpoint,
    constants::{
        DOMAIN_SYNC_COMMITTEE, MAX_EFFECTIVE_BALANCE, MAX_RANDOM_BYTE,
        MIN_ATTESTATION_INCLUSION_DELAY, SLOTS_PER_EPOCH, SYNC_COMMITTEE_SIZE,
        TIMELY_HEAD_FLAG_INDEX, TIMELY_SOURCE_FLAG_INDEX, TIMELY_TARGET_FLAG_INDEX,
    },
    eth_1_data::Eth1Data,
    fork::Fork,
    misc::{compute_shuffled_index, integer_squareroot},
    sync_committee::SyncCommittee,
    validator::Validator,
};
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::{
    BitVector, FixedVector, VariableList,
    serde_utils::{quoted_u64_fixed_vec, quoted_u64_var_list},
    typenum::{U4, U2048, U8192, U65536, U16777216, U1099511627776},
};
use tree_hash_derive::TreeHash;

use crate::view::BeaconStateAccessors;

pub mod quoted_u8_var_list {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use ssz_types::{VariableList, typenum::U1099511627776};

    pub fn serialize<S>(
        value: &VariableList<u8, U1099511627776>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let string_vec: Vec<String> = value.iter().map(|v| v.to_string()).collect();
        string_vec.serialize(serializer)
    }

    pub fn deserialize<'de, D>(
        deserializer: D,
    ) -> Result<VariableList<u8, U1099511627776>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let string_vec: Vec<String> = Vec::deserialize(deserializer)?;
        let flags = string_vec
            .into_iter()
            .map(|s| s.parse::<u8>().map_err(serde::de::Error::custom))
            .collect::<Result<Vec<_>, _>>()?;
        VariableList::new(flags).map_err(|err| {
            serde::de::Error::custom(format!("Cannot create VariableList from flags: {err:?}"))
        })
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct BeaconState {
    // Versioning
    #[serde(with = "serde_utils::quoted_u64")]
    pub genesis_time: u64,
    pub genesis_validators_root: B256,
    #[serde(with = "serde_utils::quoted_u64")]
    pub slot: u64,
    pub fork: Fork,

    // History
    pub latest_block_header: BeaconBlockHeader,
    pub block_roots: FixedVector<B256, U8192>,
    pub state_roots: FixedVector<B256, U8192>,
    pub historical_roots: VariableList<B256, U16777216>,

    // Eth1
    pub eth1_data: Eth1Data,
    pub eth1_data_votes: VariableList<Eth1Data, U2048>,
    #[serde(with = "serde_utils::quoted_u64")]
    pub eth1_deposit_index: u64,

    // Registry
    pub validators: VariableList<Validator, U1099511627776>,
    #[serde(with = "quoted_u64_var_list")]
    pub balances: VariableList<u64, U1099511627776>,

    // Randomness
    pub randao_mixes: FixedVector<B256, U65536>,

    // Slashings
    #[serde(with = "quoted_u64_fixed_vec")]
    pub slashings: FixedVector<u64, U8192>,

    // Participation
    #[serde(with = "quoted_u8_var_list")]
    pub previous_epoch_participation: VariableList<u8, U1099511627776>,
    #[serde(with = "quoted_u8_var_list")]
    pub current_epoch_participation: VariableList<u8, U1099511627776>,

    // Finality
    pub justification_bits: BitVector<U4>,
    pub previous_justified_checkpoint: Checkpoint,
    pub current_justified_checkpoint: Checkpoint,
    pub finalized_checkpoint: Checkpoint,

    // Inactivity
    #[serde(with = "quoted_u64_var_list")]
    pub inactivity_scores: VariableList<u64, U1099511627776>,

    // Sync
    pub current_sync_committee: Arc<SyncCommittee>,
    pub next_sync_committee: Arc<SyncCommittee>,
}

/// Return a new ``ParticipationFlags`` adding ``flag_index`` to ``flags``.
pub fn add_flag(flags: u8, flag_index: u8) -> u8 {
    flags | (1 << flag_index)
}

/// Return whether ``flags`` has ``flag_index`` set.
pub fn has_flag(flags: u8, flag_index: u8) -> bool {
    let flag = 1 << flag_index;
    flags & flag == flag
}

/// Aggregate ``pubkeys`` the way the sync committee commits to them.
pub fn eth_aggregate_pubkeys(pubkeys: &[&PubKey]) -> anyhow::Result<PubKey> {
    ensure!(!pubkeys.is_empty(), "Public keys list cannot be empty");
    PubKey::aggregate(pubkeys)
}

impl BeaconState {
    /// Return the flag indices that are satisfied by an attestation.
    pub fn get_attestation_participation_flag_indices(
        &self,
        data: &AttestationData,
        inclusion_delay: u64,
    ) -> anyhow::Result<Vec<u8>> {
        let justified_checkpoint = if data.target.epoch == self.get_current_epoch() {
            self.current_justified_checkpoint
        } else {
            self.previous_justified_checkpoint
        };
        let is_matching_source = data.source == justified_checkpoint;
        ensure!(
            is_matching_source,
            "attestation source {:?} does not match the justified checkpoint",
            data.source
        );
        let is_matching_target = data.target.root == self.get_block_root(data.target.epoch)?;
        let is_matching_head = is_matching_target
            && data.beacon_block_root == self.get_block_root_at_slot(data.slot)?;

        let mut participation_flag_indices = vec![];
        if inclusion_delay <= integer_squareroot(SLOTS_PER_EPOCH) {
            participation_flag_indices.push(TIMELY_SOURCE_FLAG_INDEX);
        }
        if is_matching_target && inclusion_delay <= SLOTS_PER_EPOCH {
            participation_flag_indices.push(TIMELY_TARGET_FLAG_INDEX);
        }
        if is_matching_head && inclusion_delay == MIN_ATTESTATION_INCLUSION_DELAY {
            participation_flag_indices.push(TIMELY_HEAD_FLAG_INDEX);
        }

        Ok(participation_flag_indices)
    }

    /// Return the sync committee indices, with possible duplicates, for the next sync committee.
    pub fn get_next_sync_committee_indices(&self) -> anyhow::Result<Vec<u64>> {
        let epoch = self.get_current_epoch() + 1;
        let active_validator_indices = self.get_active_validator_indices(epoch);
        let active_validator_count = active_validator_indices.len();
        ensure!(
            active_validator_count > 0,
            "Cannot select a sync committee without active validators"
        );

        let seed = self.get_seed(epoch, DOMAIN_SYNC_COMMITTEE);
        let mut i = 0usize;
        let mut sync_committee_indices = Vec::with_capacity(SYNC_COMMITTEE_SIZE as usize);
        while sync_committee_indices.len() < SYNC_COMMITTEE_SIZE as usize {
            let shuffled_index =
                compute_shuffled_index(i % active_validator_count, active_validator_count, seed)?;
            let candidate_index = active_validator_indices[shuffled_index];
            let random_byte = hash(&[seed.as_slice(), &((i / 32) as u64).to_le_bytes()].concat())
                [i % 32];
            let effective_balance = self
                .validators
                .get(candidate_index as usize)
                .map(|validator| validator.effective_balance)
                .ok_or_else(|| anyhow!("Unknown validator index {candidate_index}"))?;
            if effective_balance * MAX_RANDOM_BYTE >= MAX_EFFECTIVE_BALANCE * random_byte as u64 {
                sync_committee_indices.push(candidate_index);
            }
            i += 1;
        }

        Ok(sync_committee_indices)
    }

    /// Return the next sync committee, with possible pubkey duplicates.
    pub fn get_next_sync_committee(&self) -> anyhow::Result<SyncCommittee> {
        let pubkeys = self
            .get_next_sync_committee_indices()?
            .into_iter()
            .map(|index| self.validators[index as usize].pubkey.clone())
            .collect::<Vec<_>>();
        let aggregate_pubkey = eth_aggregate_pubkeys(&pubkeys.iter().collect::<Vec<_>>())?;

        Ok(SyncCommittee {
            pubkeys: FixedVector::new(pubkeys)
                .map_err(|err| anyhow!("Sync committee has the wrong size: {err:?}"))?,
            aggregate_pubkey,
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0b000, TIMELY_SOURCE_FLAG_INDEX, 0b001)]
    #[case(0b001, TIMELY_TARGET_FLAG_INDEX, 0b011)]
    #[case(0b011, TIMELY_TARGET_FLAG_INDEX, 0b011)]
    #[case(0b011, TIMELY_HEAD_FLAG_INDEX, 0b111)]
    fn test_add_flag(#[case] flags: u8, #[case] flag_index: u8, #[case] expected: u8) {
        let updated = add_flag(flags, flag_index);
        assert_eq!(updated, expected);
        assert!(has_flag(updated, flag_index));
    }

    #[test]
    fn test_has_flag_only_reports_set_bits() {
        assert!(!has_flag(0b101, TIMELY_TARGET_FLAG_INDEX));
        assert!(has_flag(0b101, TIMELY_HEAD_FLAG_INDEX));
    }

    #[test]
    fn test_participation_flags_serialize_quoted() {
        #[derive(Serialize, Deserialize)]
        struct Flags {
            #[serde(with = "quoted_u8_var_list")]
            flags: VariableList<u8, U1099511627776>,
        }

        let json = serde_json::to_string(&Flags {
            flags: VariableList::from(vec![0, 7]),
        })
        .expect("serialize");
        assert_eq!(json, r#"{"flags":["0","7"]}"#);

        let decoded: Flags = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(decoded.flags.to_vec(), vec![0, 7]);
    }
}
