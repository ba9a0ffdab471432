use std::sync::Arc;

use anyhow::anyhow;
use sable_consensus_misc::{
    attestation_data::AttestationData, fork::Fork, pending_attestation::PendingAttestation,
};
use sable_network_spec::networks::BeaconNetworkSpec;
use ssz_types::{
    BitList, VariableList,
    typenum::{U2048, Unsigned},
};
use tracing::info;

use crate::{
    altair::beacon_state::{BeaconState as AltairBeaconState, add_flag},
    epochs_context::EpochsContext,
    phase0::beacon_state::BeaconState as Phase0BeaconState,
    view::BeaconStateAccessors,
};

fn zeroed_list<T: Clone + Default, N: Unsigned>(
    length: usize,
) -> anyhow::Result<VariableList<T, N>> {
    VariableList::new(vec![T::default(); length])
        .map_err(|err| anyhow!("cannot allocate a list of {length} entries: {err:?}"))
}

/// Return the set of attesting indices corresponding to ``data`` and ``aggregation_bits``.
pub fn get_attesting_indices(
    epochs_context: &EpochsContext,
    data: &AttestationData,
    aggregation_bits: &BitList<U2048>,
) -> anyhow::Result<Vec<u64>> {
    let committee = epochs_context.get_beacon_committee(data.slot, data.index)?;
    anyhow::ensure!(
        aggregation_bits.len() == committee.len(),
        "aggregation bits length {} does not match committee size {}",
        aggregation_bits.len(),
        committee.len()
    );
    Ok(committee
        .into_iter()
        .enumerate()
        .filter(|(position, _)| aggregation_bits.get(*position).unwrap_or(false))
        .map(|(_, index)| index)
        .collect())
}

/// Replay phase0 pending attestations as altair participation flags of the previous epoch.
pub fn translate_participation(
    state: &mut AltairBeaconState,
    epochs_context: &EpochsContext,
    pending_attestations: &[PendingAttestation],
) -> anyhow::Result<()> {
    for attestation in pending_attestations {
        let data = &attestation.data;
        let participation_flag_indices =
            state.get_attestation_participation_flag_indices(data, attestation.inclusion_delay)?;

        // Apply flags to all attesting validators
        for index in get_attesting_indices(epochs_context, data, &attestation.aggregation_bits)? {
            let flags = state
                .previous_epoch_participation
                .get_mut(index as usize)
                .ok_or_else(|| anyhow!("no participation entry for validator {index}"))?;
            for &flag_index in &participation_flag_indices {
                *flags = add_flag(*flags, flag_index);
            }
        }
    }
    Ok(())
}

/// Upgrade a phase0 state to altair.
///
/// ``epochs_context`` must be loaded for ``pre``, since previous epoch attestations are
/// translated through its committees.
pub fn upgrade_to_altair(
    pre: Phase0BeaconState,
    epochs_context: &EpochsContext,
    network_spec: &BeaconNetworkSpec,
) -> anyhow::Result<AltairBeaconState> {
    let epoch = pre.get_current_epoch();
    let fork = Fork {
        previous_version: pre.fork.current_version,
        current_version: network_spec.altair_fork_version,
        epoch,
    };
    let validator_count = pre.validators.len();
    info!(epoch, slot = pre.slot, "Upgrading state to altair");

    let pending_attestations = pre.previous_epoch_attestations;
    let mut post = AltairBeaconState {
        // Versioning
        genesis_time: pre.genesis_time,
        genesis_validators_root: pre.genesis_validators_root,
        slot: pre.slot,
        fork,

        // History
        latest_block_header: pre.latest_block_header,
        block_roots: pre.block_roots,
        state_roots: pre.state_roots,
        historical_roots: pre.historical_roots,

        // Eth1
        eth1_data: pre.eth1_data,
        eth1_data_votes: pre.eth1_data_votes,
        eth1_deposit_index: pre.eth1_deposit_index,

        // Registry
        validators: pre.validators,
        balances: pre.balances,

        // Randomness
        randao_mixes: pre.randao_mixes,

        // Slashings
        slashings: pre.slashings,

        // Participation
        previous_epoch_participation: zeroed_list(validator_count)?,
        current_epoch_participation: zeroed_list(validator_count)?,

        // Finality
        justification_bits: pre.justification_bits,
        previous_justified_checkpoint: pre.previous_justified_checkpoint,
        current_justified_checkpoint: pre.current_justified_checkpoint,
        finalized_checkpoint: pre.finalized_checkpoint,

        // Inactivity
        inactivity_scores: zeroed_list(validator_count)?,

        // Sync, filled in below
        current_sync_committee: Arc::default(),
        next_sync_committee: Arc::default(),
    };

    // Fill in previous epoch participation from the pre state's pending attestations
    translate_participation(&mut post, epochs_context, &pending_attestations)?;

    // Fill in sync committees
    // Note: A duplicate committee is assigned for the current and next committee at the fork
    // boundary
    let sync_committee = Arc::new(post.get_next_sync_committee()?);
    post.current_sync_committee = sync_committee.clone();
    post.next_sync_committee = sync_committee;

    Ok(post)
}
