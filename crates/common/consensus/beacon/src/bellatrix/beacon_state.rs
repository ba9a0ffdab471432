use std::sync::Arc;

use alloy_primitives::B256;
use sable_consensus_misc::{
    beacon_block_header::BeaconBlockHeader,
    checkpoint::Checkpoint,
    constants::{GAS_LIMIT_DENOMINATOR, GENESIS_SLOT, MIN_GAS_LIMIT},
    eth_1_data::Eth1Data,
    fork::Fork,
    sync_committee::SyncCommittee,
    validator::Validator,
};
use sable_network_spec::networks::BeaconNetworkSpec;
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::{
    BitVector, FixedVector, VariableList,
    serde_utils::{quoted_u64_fixed_vec, quoted_u64_var_list},
    typenum::{U4, U2048, U8192, U65536, U16777216, U1099511627776},
};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tree_hash_derive::TreeHash;

use super::{
    execution_payload::ExecutionPayload, execution_payload_header::ExecutionPayloadHeader,
};
use crate::{
    altair::beacon_state::quoted_u8_var_list, execution_engine::engine_trait::ExecutionApi,
};

#[derive(Debug, Error)]
pub enum ExecutionPayloadError {
    #[error("execution payload processing was cancelled")]
    Cancelled,
    #[error("no execution engine available")]
    MissingExecutionEngine,
    #[error("expected parent hash {expected} in execution payload, but got {actual}")]
    ParentHashMismatch { expected: B256, actual: B256 },
    #[error("expected number {expected} in execution payload, but got {actual}")]
    BlockNumberMismatch { expected: u64, actual: u64 },
    #[error("gas used {gas_used} exceeds gas limit {gas_limit}")]
    GasUsedExceedsLimit { gas_used: u64, gas_limit: u64 },
    #[error("invalid gas limit: {gas_limit} (parent limit: {parent_gas_limit})")]
    InvalidGasLimit {
        gas_limit: u64,
        parent_gas_limit: u64,
    },
    #[error(
        "state at slot {slot}, genesis time {genesis_time}, expected execution payload time \
         {expected}, but got {actual}"
    )]
    TimestampMismatch {
        slot: u64,
        genesis_time: u64,
        expected: u64,
        actual: u64,
    },
    #[error("slot {slot} or genesis time {genesis_time} in state is corrupt, cannot compute time")]
    SlotTimeOverflow { slot: u64, genesis_time: u64 },
    #[error(
        "unexpected problem in execution engine when inserting block {block_hash} (height \
         {block_number}): {source}"
    )]
    Engine {
        block_hash: B256,
        block_number: u64,
        #[source]
        source: anyhow::Error,
    },
    #[error("execution engine rejected block {block_hash} (height {block_number})")]
    PayloadRejected { block_hash: B256, block_number: u64 },
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

    // Execution
    pub latest_execution_payload_header: ExecutionPayloadHeader,
}

/// Check the gas limit of a payload against the limit of its parent.
pub fn is_valid_gas_limit(gas_limit: u64, parent_gas_limit: u64) -> bool {
    let max_adjustment_delta = parent_gas_limit / GAS_LIMIT_DENOMINATOR;
    gas_limit < parent_gas_limit.saturating_add(max_adjustment_delta)
        && gas_limit > parent_gas_limit - max_adjustment_delta
        && gas_limit >= MIN_GAS_LIMIT
}

impl BeaconState {
    /// Whether an execution payload has been committed to the state yet.
    pub fn is_merge_transition_complete(&self) -> bool {
        self.latest_execution_payload_header != ExecutionPayloadHeader::default()
    }

    /// Return the unix time at the start of ``slot``, or ``None`` if it does not fit in 64 bits.
    pub fn compute_timestamp_at_slot(&self, slot: u64, seconds_per_slot: u64) -> Option<u64> {
        slot.checked_sub(GENESIS_SLOT)?
            .checked_mul(seconds_per_slot)?
            .checked_add(self.genesis_time)
    }

    /// Verify ``payload`` against the state and the execution engine, then commit its header.
    ///
    /// The state is untouched unless every check passes and the engine accepts the payload.
    pub async fn process_execution_payload(
        &mut self,
        network_spec: &BeaconNetworkSpec,
        payload: &ExecutionPayload,
        execution_engine: Option<&dyn ExecutionApi>,
        cancellation_token: &CancellationToken,
    ) -> Result<(), ExecutionPayloadError> {
        if cancellation_token.is_cancelled() {
            return Err(ExecutionPayloadError::Cancelled);
        }
        let execution_engine =
            execution_engine.ok_or(ExecutionPayloadError::MissingExecutionEngine)?;

        if self.is_merge_transition_complete() {
            let parent = &self.latest_execution_payload_header;
            // Verify consistency of the parent hash with respect to the previous execution
            // payload header
            if payload.parent_hash != parent.block_hash {
                return Err(ExecutionPayloadError::ParentHashMismatch {
                    expected: parent.block_hash,
                    actual: payload.parent_hash,
                });
            }
            let expected_block_number = parent.block_number.saturating_add(1);
            if payload.block_number != expected_block_number {
                return Err(ExecutionPayloadError::BlockNumberMismatch {
                    expected: expected_block_number,
                    actual: payload.block_number,
                });
            }
            // TODO: check prev_randao against get_randao_mix(current epoch) once payloads are
            // built with the beacon randao mix.
            if payload.gas_used > payload.gas_limit {
                return Err(ExecutionPayloadError::GasUsedExceedsLimit {
                    gas_used: payload.gas_used,
                    gas_limit: payload.gas_limit,
                });
            }
            if !is_valid_gas_limit(payload.gas_limit, parent.gas_limit) {
                return Err(ExecutionPayloadError::InvalidGasLimit {
                    gas_limit: payload.gas_limit,
                    parent_gas_limit: parent.gas_limit,
                });
            }
        }

        // Verify timestamp
        let expected_timestamp = self
            .compute_timestamp_at_slot(self.slot, network_spec.seconds_per_slot)
            .ok_or(ExecutionPayloadError::SlotTimeOverflow {
                slot: self.slot,
                genesis_time: self.genesis_time,
            })?;
        if payload.timestamp != expected_timestamp {
            return Err(ExecutionPayloadError::TimestampMismatch {
                slot: self.slot,
                genesis_time: self.genesis_time,
                expected: expected_timestamp,
                actual: payload.timestamp,
            });
        }

        // Verify the execution payload is valid
        let verdict = tokio::select! {
            biased;
            _ = cancellation_token.cancelled() => return Err(ExecutionPayloadError::Cancelled),
            verdict = execution_engine.verify_and_notify_new_payload(payload) => verdict,
        };
        match verdict {
            Ok(true) => {}
            Ok(false) => {
                warn!(
                    block_hash = ?payload.block_hash,
                    block_number = payload.block_number,
                    "Execution engine rejected payload"
                );
                return Err(ExecutionPayloadError::PayloadRejected {
                    block_hash: payload.block_hash,
                    block_number: payload.block_number,
                });
            }
            Err(source) => {
                return Err(ExecutionPayloadError::Engine {
                    block_hash: payload.block_hash,
                    block_number: payload.block_number,
                    source,
                });
            }
        }

        // Cache execution payload header
        self.latest_execution_payload_header = payload.to_execution_payload_header();
        debug!(
            block_hash = ?payload.block_hash,
            block_number = payload.block_number,
            "Committed execution payload header"
        );

        Ok(())
    }
}
