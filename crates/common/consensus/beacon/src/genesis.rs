use alloy_primitives::B256;
use sable_consensus_misc::{
    beacon_block_header::BeaconBlockHeader,
    constants::{GENESIS_EPOCH, MAX_EFFECTIVE_BALANCE, SLOTS_PER_EPOCH},
    deposit::Deposit,
    eth_1_data::Eth1Data,
    fork::Fork,
};
use sable_merkle::DepositTree;
use sable_network_spec::networks::BeaconNetworkSpec;
use ssz_types::{BitVector, FixedVector, VariableList};
use thiserror::Error;
use tracing::info;
use tree_hash::TreeHash;

use crate::{
    epochs_context::EpochsContext,
    phase0::{
        beacon_block_body::BeaconBlockBody,
        beacon_state::{BeaconState, DepositError},
    },
    view::BeaconStateAccessors,
};

#[derive(Debug, Error)]
pub enum GenesisError {
    #[error("GENESIS_DELAY must be non-zero")]
    ZeroGenesisDelay,
    #[error("genesis time overflows for eth1 timestamp {eth1_timestamp}")]
    GenesisTimeOverflow { eth1_timestamp: u64 },
    #[error("deposit {index} rejected: {source}")]
    InvalidDeposit {
        index: usize,
        #[source]
        source: DepositError,
    },
    #[error("deposit tree: {0}")]
    DepositTree(#[source] anyhow::Error),
    #[error("genesis needs at least {required} validators, got {validator_count}")]
    InsufficientValidators { validator_count: usize, required: u64 },
    #[error("epochs context: {0}")]
    EpochsContext(#[source] anyhow::Error),
}

/// Compute the genesis time from the timestamp of the eth1 anchor block.
pub fn compute_genesis_time(eth1_timestamp: u64, genesis_delay: u64) -> Result<u64, GenesisError> {
    if genesis_delay == 0 {
        return Err(GenesisError::ZeroGenesisDelay);
    }
    genesis_delay
        .checked_mul(2)
        .and_then(|delay| (eth1_timestamp - eth1_timestamp % genesis_delay).checked_add(delay))
        .ok_or(GenesisError::GenesisTimeOverflow { eth1_timestamp })
}

/// Build the genesis state and its epochs context from an eth1 anchor and ordered deposits.
///
/// With ``ignore_signatures_and_proofs`` set, deposit Merkle proofs and proofs of possession are
/// not checked.
pub fn genesis_from_eth1(
    network_spec: &BeaconNetworkSpec,
    eth1_block_hash: B256,
    eth1_timestamp: u64,
    deposits: &[Deposit],
    ignore_signatures_and_proofs: bool,
) -> Result<(BeaconState, EpochsContext), GenesisError> {
    let fork = Fork {
        previous_version: network_spec.genesis_fork_version,
        current_version: network_spec.genesis_fork_version,
        epoch: GENESIS_EPOCH,
    };
    let mut state = BeaconState {
        genesis_time: compute_genesis_time(eth1_timestamp, network_spec.genesis_delay)?,
        genesis_validators_root: B256::ZERO,
        slot: 0,
        fork,
        latest_block_header: BeaconBlockHeader {
            body_root: BeaconBlockBody::default().tree_hash_root(),
            ..Default::default()
        },
        block_roots: FixedVector::default(),
        state_roots: FixedVector::default(),
        historical_roots: VariableList::default(),
        // deposit_root is rewritten as deposits are appended
        eth1_data: Eth1Data {
            deposit_root: B256::ZERO,
            deposit_count: deposits.len() as u64,
            block_hash: eth1_block_hash,
        },
        eth1_data_votes: VariableList::default(),
        eth1_deposit_index: 0,
        validators: VariableList::default(),
        balances: VariableList::default(),
        // Seed RANDAO with Eth1 entropy
        randao_mixes: FixedVector::from_elem(eth1_block_hash),
        slashings: FixedVector::default(),
        previous_epoch_attestations: VariableList::default(),
        current_epoch_attestations: VariableList::default(),
        justification_bits: BitVector::new(),
        previous_justified_checkpoint: Default::default(),
        current_justified_checkpoint: Default::default(),
        finalized_checkpoint: Default::default(),
    };

    let mut epochs_context = EpochsContext::new(&state);

    let mut deposit_tree = DepositTree::new();
    for (index, deposit) in deposits.iter().enumerate() {
        deposit_tree
            .push_leaf(deposit.data.tree_hash_root())
            .map_err(GenesisError::DepositTree)?;
        state.eth1_data.deposit_root = deposit_tree.root();
        state
            .process_deposit(
                &mut epochs_context.pubkey_cache,
                deposit,
                network_spec,
                ignore_signatures_and_proofs,
            )
            .map_err(|source| GenesisError::InvalidDeposit { index, source })?;
    }
    state.eth1_data.deposit_root = deposit_tree.root();

    if (state.validators.len() as u64) < SLOTS_PER_EPOCH {
        return Err(GenesisError::InsufficientValidators {
            validator_count: state.validators.len(),
            required: SLOTS_PER_EPOCH,
        });
    }

    // Process activations
    for validator in state.validators.iter_mut() {
        if validator.effective_balance == MAX_EFFECTIVE_BALANCE {
            validator.activation_eligibility_epoch = GENESIS_EPOCH;
            validator.activation_epoch = GENESIS_EPOCH;
        }
    }

    state.genesis_validators_root = state.validators.tree_hash_root();

    epochs_context
        .load_shuffling(&state)
        .map_err(GenesisError::EpochsContext)?;
    epochs_context
        .load_proposers(&state)
        .map_err(GenesisError::EpochsContext)?;

    info!(
        genesis_time = state.genesis_time,
        validators = state.validators.len(),
        genesis_validators_root = ?state.genesis_validators_root,
        "Built genesis state"
    );

    Ok((state, epochs_context))
}

/// Whether ``state`` meets the genesis trigger of ``network_spec``.
pub fn is_valid_genesis_state<S: BeaconStateAccessors>(
    state: &S,
    network_spec: &BeaconNetworkSpec,
) -> bool {
    if state.genesis_time() < network_spec.min_genesis_time {
        return false;
    }
    state.get_active_validator_indices(GENESIS_EPOCH).len() as u64
        >= network_spec.min_genesis_active_validator_count
}
