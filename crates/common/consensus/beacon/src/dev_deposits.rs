//! Deterministic validator keys and deposits for development networks.

use alloy_primitives::B256;
use anyhow::anyhow;
use ethereum_hashing::hash;
use sable_bls::{PrivateKey, traits::Signable};
use sable_consensus_misc::{
    constants::{BLS_WITHDRAWAL_PREFIX, MAX_EFFECTIVE_BALANCE},
    deposit::Deposit,
    deposit_data::DepositData,
    deposit_message::DepositMessage,
};
use sable_merkle::DepositTree;
use sable_network_spec::networks::{BeaconNetworkSpec, DEV};
use ssz_types::FixedVector;
use tree_hash::TreeHash;

use crate::{
    epochs_context::EpochsContext, genesis::genesis_from_eth1, phase0::beacon_state::BeaconState,
};

/// Eth1 block hash used as the randao seed of [`dev_genesis_state`].
pub const DEV_ETH1_BLOCK_HASH: B256 = B256::repeat_byte(0x42);

/// Return the private key of dev validator ``index``.
pub fn dev_private_key(index: u64) -> anyhow::Result<PrivateKey> {
    let mut seed = [0u8; 32];
    seed[..8].copy_from_slice(&index.to_le_bytes());
    PrivateKey::from_ikm(&hash(&seed)).map_err(|err| anyhow!("dev key {index}: {err:?}"))
}

/// BLS withdrawal credentials committing to ``pubkey_bytes``.
pub fn bls_withdrawal_credentials(pubkey_bytes: &[u8]) -> B256 {
    let mut credentials = B256::from_slice(&hash(pubkey_bytes));
    credentials[..BLS_WITHDRAWAL_PREFIX.len()].copy_from_slice(BLS_WITHDRAWAL_PREFIX);
    credentials
}

/// Build ``count`` signed deposits of ``MAX_EFFECTIVE_BALANCE``.
///
/// Each proof is taken against the deposit root at the moment its deposit is appended, which is
/// the root genesis processing checks it against.
pub fn dev_deposits(count: u64, network_spec: &BeaconNetworkSpec) -> anyhow::Result<Vec<Deposit>> {
    let mut tree = DepositTree::new();
    let mut deposits = Vec::with_capacity(count as usize);
    for index in 0..count {
        let private_key = dev_private_key(index)?;
        let pubkey = private_key
            .public_key()
            .map_err(|err| anyhow!("dev pubkey {index}: {err:?}"))?;
        let deposit_message = DepositMessage {
            withdrawal_credentials: bls_withdrawal_credentials(pubkey.to_bytes()),
            pubkey,
            amount: MAX_EFFECTIVE_BALANCE,
        };
        let signature = private_key.sign(
            deposit_message
                .signing_root(network_spec.genesis_fork_version)
                .as_slice(),
        )?;
        let data = DepositData {
            pubkey: deposit_message.pubkey,
            withdrawal_credentials: deposit_message.withdrawal_credentials,
            amount: deposit_message.amount,
            signature,
        };

        tree.push_leaf(data.tree_hash_root())?;
        let proof = FixedVector::new(tree.generate_proof(index as usize)?)
            .map_err(|err| anyhow!("deposit proof has the wrong length: {err:?}"))?;
        deposits.push(Deposit { proof, data });
    }
    Ok(deposits)
}

/// Build a verified genesis state of ``validator_count`` dev validators on the dev network.
pub fn dev_genesis_state(validator_count: u64) -> anyhow::Result<(BeaconState, EpochsContext)> {
    let deposits = dev_deposits(validator_count, &DEV)?;
    Ok(genesis_from_eth1(
        &DEV,
        DEV_ETH1_BLOCK_HASH,
        DEV.min_genesis_time,
        &deposits,
        false,
    )?)
}

#[cfg(test)]
mod tests {
    use sable_merkle::is_valid_merkle_branch;

    use super::*;
    use crate::phase0::beacon_state::is_valid_deposit_signature;

    #[test]
    fn test_dev_keys_are_deterministic_and_distinct() {
        let first = dev_private_key(0).expect("key");
        assert_eq!(first, dev_private_key(0).expect("key"));
        assert_ne!(first, dev_private_key(1).expect("key"));
    }

    #[test]
    fn test_dev_deposits_are_signed_and_proven() {
        let deposits = dev_deposits(4, &DEV).expect("deposits");
        let mut tree = DepositTree::new();
        for (index, deposit) in deposits.iter().enumerate() {
            assert!(is_valid_deposit_signature(&deposit.data, &DEV));
            assert_eq!(deposit.data.withdrawal_credentials[0], 0);

            tree.push_leaf(deposit.data.tree_hash_root()).expect("push");
            assert!(is_valid_merkle_branch(
                deposit.data.tree_hash_root(),
                &deposit.proof,
                33,
                index as u64,
                tree.root(),
            ));
        }
    }
}
