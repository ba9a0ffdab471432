use sable_consensus_misc::fork::Fork;
use sable_network_spec::networks::BeaconNetworkSpec;
use tracing::info;

use crate::{
    altair::beacon_state::BeaconState as AltairBeaconState,
    bellatrix::{
        beacon_state::BeaconState as BellatrixBeaconState,
        execution_payload_header::ExecutionPayloadHeader,
    },
    view::BeaconStateAccessors,
};

/// Upgrade an altair state to bellatrix, carrying every field over unchanged.
///
/// The execution payload header starts out empty, so the merge transition is not complete yet.
pub fn upgrade_to_bellatrix(
    pre: AltairBeaconState,
    network_spec: &BeaconNetworkSpec,
) -> BellatrixBeaconState {
    let epoch = pre.get_current_epoch();
    let fork = Fork {
        previous_version: pre.fork.current_version,
        current_version: network_spec.bellatrix_fork_version,
        epoch,
    };
    info!(epoch, slot = pre.slot, "Upgrading state to bellatrix");

    BellatrixBeaconState {
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
        previous_epoch_participation: pre.previous_epoch_participation,
        current_epoch_participation: pre.current_epoch_participation,

        // Finality
        justification_bits: pre.justification_bits,
        previous_justified_checkpoint: pre.previous_justified_checkpoint,
        current_justified_checkpoint: pre.current_justified_checkpoint,
        finalized_checkpoint: pre.finalized_checkpoint,

        // Inactivity
        inactivity_scores: pre.inactivity_scores,

        // Sync
        current_sync_committee: pre.current_sync_committee,
        next_sync_committee: pre.next_sync_committee,

        // Execution
        latest_execution_payload_header: ExecutionPayloadHeader::default(),
    }
}
