use alloy_primitives::B256;
use sable_bls::traits::Verifiable;
use sable_consensus_misc::{
    beacon_block_header::BeaconBlockHeader,
    checkpoint::Checkpoint,
    constants::DEPOSIT_CONTRACT_TREE_DEPTH,
    deposit::Deposit,
    deposit_data::DepositData,
    eth_1_data::Eth1Data,
    fork::Fork,
    pending_attestation::PendingAttestation,
    validator::Validator,
};
use sable_merkle::is_valid_merkle_branch;
use sable_network_spec::networks::BeaconNetworkSpec;
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::{
    BitVector, FixedVector, VariableList,
    serde_utils::{quoted_u64_fixed_vec, quoted_u64_var_list},
    typenum::{U4, U2048, U4096, U8192, U65536, U16777216, U1099511627776},
};
use thiserror::Error;
use tracing::warn;
use tree_hash::TreeHash;
use tree_hash_derive::TreeHash;

use crate::epochs_context::PubkeyCache;

#[derive(Debug, Error)]
pub enum DepositError {
    #[error("invalid merkle proof for deposit {deposit_index} against deposit root {deposit_root}")]
    InvalidMerkleProof {
        deposit_index: u64,
        deposit_root: B256,
    },
    #[error("pubkey cache holds {cache_len} keys but the registry has {registry_len} validators")]
    PubkeyCacheOutOfSync { cache_len: usize, registry_len: usize },
    #[error("no balance for validator {0}")]
    UnknownValidator(u64),
    #[error("balance of validator {0} overflows")]
    BalanceOverflow(u64),
    #[error("validator registry is full: {0:?}")]
    RegistryFull(ssz_types::Error),
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

    // Attestations
    pub previous_epoch_attestations: VariableList<PendingAttestation, U4096>,
    pub current_epoch_attestations: VariableList<PendingAttestation, U4096>,

    // Finality
    pub justification_bits: BitVector<U4>,
    pub previous_justified_checkpoint: Checkpoint,
    pub current_justified_checkpoint: Checkpoint,
    pub finalized_checkpoint: Checkpoint,
}

impl BeaconState {
    /// Increase the validator balance at index ``index`` by ``delta``.
    pub fn increase_balance(&mut self, index: u64, delta: u64) -> Result<(), DepositError> {
        let balance = self
            .balances
            .get_mut(index as usize)
            .ok_or(DepositError::UnknownValidator(index))?;
        *balance = balance
            .checked_add(delta)
            .ok_or(DepositError::BalanceOverflow(index))?;
        Ok(())
    }

    pub fn add_validator_to_registry(
        &mut self,
        pubkey_cache: &mut PubkeyCache,
        deposit_data: &DepositData,
    ) -> Result<(), DepositError> {
        self.validators
            .push(Validator::from_deposit(
                deposit_data.pubkey.clone(),
                deposit_data.withdrawal_credentials,
                deposit_data.amount,
            ))
            .map_err(DepositError::RegistryFull)?;
        self.balances
            .push(deposit_data.amount)
            .map_err(DepositError::RegistryFull)?;
        pubkey_cache.push(deposit_data.pubkey.clone());
        Ok(())
    }

    /// Register a new validator or top up an existing one.
    ///
    /// A new validator whose proof of possession does not verify is skipped without error.
    pub fn apply_deposit(
        &mut self,
        pubkey_cache: &mut PubkeyCache,
        deposit_data: &DepositData,
        network_spec: &BeaconNetworkSpec,
        ignore_signatures_and_proofs: bool,
    ) -> Result<(), DepositError> {
        if pubkey_cache.len() != self.validators.len() {
            return Err(DepositError::PubkeyCacheOutOfSync {
                cache_len: pubkey_cache.len(),
                registry_len: self.validators.len(),
            });
        }

        if let Some(index) = pubkey_cache.get_index(&deposit_data.pubkey) {
            return self.increase_balance(index, deposit_data.amount);
        }

        if !ignore_signatures_and_proofs
            && !is_valid_deposit_signature(deposit_data, network_spec)
        {
            warn!(
                pubkey = ?deposit_data.pubkey,
                deposit_index = self.eth1_deposit_index.saturating_sub(1),
                "Skipping deposit with an invalid proof of possession"
            );
            return Ok(());
        }

        self.add_validator_to_registry(pubkey_cache, deposit_data)
    }

    /// Process an eth1 deposit, verifying its Merkle branch against ``eth1_data.deposit_root``.
    pub fn process_deposit(
        &mut self,
        pubkey_cache: &mut PubkeyCache,
        deposit: &Deposit,
        network_spec: &BeaconNetworkSpec,
        ignore_signatures_and_proofs: bool,
    ) -> Result<(), DepositError> {
        // Verify the Merkle branch
        if !ignore_signatures_and_proofs
            && !is_valid_merkle_branch(
                deposit.data.tree_hash_root(),
                &deposit.proof,
                DEPOSIT_CONTRACT_TREE_DEPTH + 1, // Add 1 for the List length mix-in
                self.eth1_deposit_index,
                self.eth1_data.deposit_root,
            )
        {
            return Err(DepositError::InvalidMerkleProof {
                deposit_index: self.eth1_deposit_index,
                deposit_root: self.eth1_data.deposit_root,
            });
        }

        // Deposits must be processed in order
        self.eth1_deposit_index += 1;

        self.apply_deposit(
            pubkey_cache,
            &deposit.data,
            network_spec,
            ignore_signatures_and_proofs,
        )
    }
}

pub fn is_valid_deposit_signature(
    deposit_data: &DepositData,
    network_spec: &BeaconNetworkSpec,
) -> bool {
    let signing_root = deposit_data
        .to_deposit_message()
        .signing_root(network_spec.genesis_fork_version);
    matches!(
        deposit_data
            .signature
            .verify(&deposit_data.pubkey, signing_root.as_slice()),
        Ok(true)
    )
}
