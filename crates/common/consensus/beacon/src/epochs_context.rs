use std::{collections::HashMap, sync::Arc};

use alloy_primitives::B256;
use anyhow::{anyhow, ensure};
use ethereum_hashing::hash;
use sable_bls::PubKey;
use sable_consensus_misc::{
    constants::{
        DOMAIN_BEACON_ATTESTER, DOMAIN_BEACON_PROPOSER, MAX_COMMITTEES_PER_SLOT, SLOTS_PER_EPOCH,
        TARGET_COMMITTEE_SIZE,
    },
    misc::{compute_epoch_at_slot, compute_start_slot_at_epoch, shuffle_list},
};
use tracing::debug;

use crate::view::BeaconStateAccessors;

/// Bidirectional map between validator pubkeys and registry indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PubkeyCache {
    pubkey_to_index: HashMap<PubKey, u64>,
    index_to_pubkey: Vec<PubKey>,
}

impl PubkeyCache {
    pub fn from_validators<'a>(pubkeys: impl IntoIterator<Item = &'a PubKey>) -> Self {
        let mut cache = Self::default();
        for pubkey in pubkeys {
            cache.push(pubkey.clone());
        }
        cache
    }

    /// Register ``pubkey`` as the next validator index, returning that index.
    ///
    /// A pubkey that is already cached keeps its first index.
    pub fn push(&mut self, pubkey: PubKey) -> u64 {
        let index = self.index_to_pubkey.len() as u64;
        self.pubkey_to_index.entry(pubkey.clone()).or_insert(index);
        self.index_to_pubkey.push(pubkey);
        index
    }

    pub fn get_index(&self, pubkey: &PubKey) -> Option<u64> {
        self.pubkey_to_index.get(pubkey).copied()
    }

    pub fn get_pubkey(&self, index: u64) -> Option<&PubKey> {
        self.index_to_pubkey.get(index as usize)
    }

    pub fn len(&self) -> usize {
        self.index_to_pubkey.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index_to_pubkey.is_empty()
    }
}

/// Committee assignments of one epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpochShuffling {
    pub epoch: u64,
    pub seed: B256,
    pub active_indices: Vec<u64>,
    /// ``active_indices`` in committee order, see [`shuffle_list`].
    pub shuffling: Vec<u64>,
    pub committees_per_slot: u64,
}

impl EpochShuffling {
    pub fn compute<S: BeaconStateAccessors>(state: &S, epoch: u64) -> anyhow::Result<Self> {
        let seed = state.get_seed(epoch, DOMAIN_BEACON_ATTESTER);
        let active_indices = state.get_active_validator_indices(epoch);
        let shuffling = shuffle_list(active_indices.clone(), seed, false);
        let committees_per_slot = (active_indices.len() as u64
            / SLOTS_PER_EPOCH
            / TARGET_COMMITTEE_SIZE)
            .clamp(1, MAX_COMMITTEES_PER_SLOT);

        Ok(Self {
            epoch,
            seed,
            active_indices,
            shuffling,
            committees_per_slot,
        })
    }

    /// Return the beacon committee at ``slot`` for ``index``.
    pub fn beacon_committee(&self, slot: u64, index: u64) -> anyhow::Result<&[u64]> {
        ensure!(
            compute_epoch_at_slot(slot) == self.epoch,
            "slot {slot} is not in shuffling epoch {}",
            self.epoch
        );
        ensure!(
            index < self.committees_per_slot,
            "committee index {index} out of range, {} committees per slot",
            self.committees_per_slot
        );

        let count = self.committees_per_slot * SLOTS_PER_EPOCH;
        let committee_index = (slot % SLOTS_PER_EPOCH) * self.committees_per_slot + index;
        let total = self.shuffling.len() as u64;
        let start = (total * committee_index / count) as usize;
        let end = (total * (committee_index + 1) / count) as usize;
        Ok(&self.shuffling[start..end])
    }
}

/// Derived caches kept alongside a beacon state.
///
/// Nothing here is invalidated automatically. After the registry changes, call
/// [`EpochsContext::load_shuffling`] and [`EpochsContext::load_proposers`] again.
#[derive(Debug, Clone, Default)]
pub struct EpochsContext {
    pub pubkey_cache: PubkeyCache,
    pub previous_shuffling: Option<Arc<EpochShuffling>>,
    pub current_shuffling: Option<Arc<EpochShuffling>>,
    pub next_shuffling: Option<Arc<EpochShuffling>>,
    /// Proposer index of every slot in the current epoch.
    pub proposers: Vec<u64>,
}

impl EpochsContext {
    /// Build a context with only the pubkey cache populated.
    pub fn new<S: BeaconStateAccessors>(state: &S) -> Self {
        Self {
            pubkey_cache: PubkeyCache::from_validators(
                state.validators().iter().map(|validator| &validator.pubkey),
            ),
            ..Default::default()
        }
    }

    /// Build a fully loaded context for ``state``.
    pub fn load<S: BeaconStateAccessors>(state: &S) -> anyhow::Result<Self> {
        let mut epochs_context = Self::new(state);
        epochs_context.load_shuffling(state)?;
        epochs_context.load_proposers(state)?;
        Ok(epochs_context)
    }

    pub fn load_shuffling<S: BeaconStateAccessors>(&mut self, state: &S) -> anyhow::Result<()> {
        let current_epoch = state.get_current_epoch();
        let previous_epoch = state.get_previous_epoch();

        let current = Arc::new(EpochShuffling::compute(state, current_epoch)?);
        self.previous_shuffling = Some(if previous_epoch == current_epoch {
            current.clone()
        } else {
            Arc::new(EpochShuffling::compute(state, previous_epoch)?)
        });
        self.next_shuffling = Some(Arc::new(EpochShuffling::compute(
            state,
            current_epoch + 1,
        )?));
        self.current_shuffling = Some(current);

        debug!(
            epoch = current_epoch,
            active_validators = self
                .current_shuffling
                .as_ref()
                .map_or(0, |shuffling| shuffling.active_indices.len()),
            "Loaded shuffling"
        );
        Ok(())
    }

    pub fn load_proposers<S: BeaconStateAccessors>(&mut self, state: &S) -> anyhow::Result<()> {
        let epoch = state.get_current_epoch();
        let shuffling = self.shuffling_at(epoch)?;
        if shuffling.active_indices.is_empty() {
            self.proposers = vec![];
            return Ok(());
        }

        let epoch_seed = state.get_seed(epoch, DOMAIN_BEACON_PROPOSER);
        let start_slot = compute_start_slot_at_epoch(epoch)?;
        let end_slot = start_slot
            .checked_add(SLOTS_PER_EPOCH - 1)
            .ok_or_else(|| anyhow!("last slot of epoch {epoch} overflows"))?;
        self.proposers = (start_slot..=end_slot)
            .map(|slot| {
                let seed = B256::from_slice(&hash(
                    &[epoch_seed.as_slice(), &slot.to_le_bytes()].concat(),
                ));
                state.compute_proposer_index(&shuffling.active_indices, seed)
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(())
    }

    /// Return the cached shuffling for ``epoch``, if it is one of the three loaded epochs.
    pub fn shuffling_at(&self, epoch: u64) -> anyhow::Result<Arc<EpochShuffling>> {
        [
            &self.current_shuffling,
            &self.previous_shuffling,
            &self.next_shuffling,
        ]
        .into_iter()
        .flatten()
        .find(|shuffling| shuffling.epoch == epoch)
        .cloned()
        .ok_or_else(|| anyhow!("no shuffling loaded for epoch {epoch}"))
    }

    pub fn get_beacon_committee(&self, slot: u64, index: u64) -> anyhow::Result<Vec<u64>> {
        let shuffling = self.shuffling_at(compute_epoch_at_slot(slot))?;
        Ok(shuffling.beacon_committee(slot, index)?.to_vec())
    }

    pub fn get_committee_count_per_slot(&self, epoch: u64) -> anyhow::Result<u64> {
        Ok(self.shuffling_at(epoch)?.committees_per_slot)
    }

    /// Return the proposer of ``slot``, which must be in the current epoch.
    pub fn get_beacon_proposer(&self, slot: u64) -> anyhow::Result<u64> {
        let current_epoch = self
            .current_shuffling
            .as_ref()
            .map(|shuffling| shuffling.epoch)
            .ok_or_else(|| anyhow!("shuffling has not been loaded"))?;
        ensure!(
            compute_epoch_at_slot(slot) == current_epoch,
            "slot {slot} is not in the current epoch {current_epoch}"
        );
        self.proposers
            .get((slot % SLOTS_PER_EPOCH) as usize)
            .copied()
            .ok_or_else(|| anyhow!("no proposer cached for slot {slot}"))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use sable_consensus_misc::misc::compute_shuffled_index;

    use super::*;
    use crate::dev_deposits::dev_genesis_state;

    #[test]
    fn test_pubkey_cache_keeps_first_index() {
        let first = PubKey::from_bytes(&[1u8; 48]).expect("pubkey");
        let second = PubKey::from_bytes(&[2u8; 48]).expect("pubkey");

        let mut cache = PubkeyCache::default();
        assert!(cache.is_empty());
        assert_eq!(cache.push(first.clone()), 0);
        assert_eq!(cache.push(second.clone()), 1);
        assert_eq!(cache.push(first.clone()), 2);

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get_index(&first), Some(0));
        assert_eq!(cache.get_index(&second), Some(1));
        assert_eq!(cache.get_pubkey(2), Some(&first));
        assert_eq!(cache.get_pubkey(3), None);
    }

    #[test]
    fn test_committees_partition_active_validators() {
        let (state, epochs_context) = dev_genesis_state(64).expect("dev genesis");
        let shuffling = epochs_context.shuffling_at(0).expect("shuffling");
        assert_eq!(shuffling.committees_per_slot, 1);
        assert_eq!(
            epochs_context
                .get_committee_count_per_slot(1)
                .expect("next epoch"),
            1
        );
        assert!(epochs_context.get_committee_count_per_slot(5).is_err());

        let mut seen = HashSet::new();
        for slot in 0..SLOTS_PER_EPOCH {
            let committee = epochs_context
                .get_beacon_committee(slot, 0)
                .expect("committee");
            assert_eq!(committee.len(), 2);
            seen.extend(committee);
        }
        assert_eq!(seen.len(), state.validators.len());
        assert!(epochs_context.get_beacon_committee(0, 1).is_err());
        assert!(epochs_context.get_beacon_committee(2 * SLOTS_PER_EPOCH, 0).is_err());
    }

    #[test]
    fn test_shuffling_follows_shuffled_index() {
        let (state, epochs_context) = dev_genesis_state(64).expect("dev genesis");
        let shuffling = epochs_context.shuffling_at(1).expect("next epoch");
        let seed = state.get_seed(1, DOMAIN_BEACON_ATTESTER);
        let total = shuffling.active_indices.len();
        for (position, index) in shuffling.shuffling.iter().enumerate() {
            let source = compute_shuffled_index(position, total, seed).expect("in range");
            assert_eq!(*index, shuffling.active_indices[source]);
        }
    }

    #[test]
    fn test_genesis_previous_shuffling_is_current() {
        let (_, epochs_context) = dev_genesis_state(32).expect("dev genesis");
        let previous = epochs_context.previous_shuffling.expect("previous");
        let current = epochs_context.current_shuffling.expect("current");
        assert!(Arc::ptr_eq(&previous, &current));
        assert_eq!(epochs_context.next_shuffling.expect("next").epoch, 1);
    }

    #[test]
    fn test_proposers_match_state_computation() {
        let (state, epochs_context) = dev_genesis_state(32).expect("dev genesis");
        assert_eq!(epochs_context.proposers.len(), SLOTS_PER_EPOCH as usize);

        let indices = state.get_active_validator_indices(0);
        let epoch_seed = state.get_seed(0, DOMAIN_BEACON_PROPOSER);
        for slot in [0u64, 5, 31] {
            let seed =
                B256::from_slice(&hash(&[epoch_seed.as_slice(), &slot.to_le_bytes()].concat()));
            let expected = state
                .compute_proposer_index(&indices, seed)
                .expect("proposer");
            assert_eq!(
                epochs_context.get_beacon_proposer(slot).expect("cached"),
                expected
            );
        }
        assert!(epochs_context.get_beacon_proposer(SLOTS_PER_EPOCH).is_err());
    }

    #[test]
    fn test_load_at_the_last_slot() {
        let (mut state, _) = dev_genesis_state(32).expect("dev genesis");
        state.slot = u64::MAX;
        let epochs_context = EpochsContext::load(&state).expect("epochs context");

        assert_eq!(epochs_context.proposers.len(), SLOTS_PER_EPOCH as usize);
        assert!(epochs_context.get_beacon_proposer(u64::MAX).is_ok());
        assert!(
            epochs_context
                .get_beacon_proposer(u64::MAX - SLOTS_PER_EPOCH)
                .is_err()
        );
    }
}
