use alloy_primitives::aliases::B32;
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use tree_hash_derive::TreeHash;

#[derive(
    Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize, Encode, Decode, TreeHash,
)]
pub struct Fork {
    pub previous_version: B32,
    pub current_version: B32,
    /// Epoch of the latest fork
    #[serde(with = "serde_utils::quoted_u64")]
    pub epoch: u64,
}
