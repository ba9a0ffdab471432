use alloy_primitives::{B256, aliases::B32};
use sable_bls::PubKey;
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use tree_hash_derive::TreeHash;

use crate::{
    constants::DOMAIN_DEPOSIT,
    misc::{compute_domain, compute_signing_root},
};

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct DepositMessage {
    pub pubkey: PubKey,
    pub withdrawal_credentials: B256,
    #[serde(with = "serde_utils::quoted_u64")]
    pub amount: u64,
}

impl DepositMessage {
    /// Deposits are signed under the genesis fork version with an empty validators root, so a
    /// deposit stays valid across forks.
    pub fn signing_root(&self, genesis_fork_version: B32) -> B256 {
        let domain = compute_domain(DOMAIN_DEPOSIT, genesis_fork_version, B256::ZERO);
        compute_signing_root(self, domain)
    }
}
