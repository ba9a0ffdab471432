use alloy_primitives::{Address, B256, U256};
use sable_consensus_misc::misc::checksummed_address;
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::{
    FixedVector, VariableList,
    serde_utils::{hex_fixed_vec, hex_var_list, list_of_hex_var_list},
    typenum::{self, U32, U1048576, U1073741824},
};
use tree_hash::TreeHash;
use tree_hash_derive::TreeHash;

use super::execution_payload_header::ExecutionPayloadHeader;

pub type Transactions = VariableList<VariableList<u8, U1073741824>, U1048576>;

#[derive(
    Debug, PartialEq, Eq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash, Default,
)]
pub struct ExecutionPayload {
    // Execution block header fields
    pub parent_hash: B256,
    #[serde(with = "checksummed_address")]
    pub fee_recipient: Address,
    pub state_root: B256,
    pub receipts_root: B256,
    #[serde(with = "hex_fixed_vec")]
    pub logs_bloom: FixedVector<u8, typenum::U256>,
    pub prev_randao: B256,
    #[serde(with = "serde_utils::quoted_u64")]
    pub block_number: u64,
    #[serde(with = "serde_utils::quoted_u64")]
    pub gas_limit: u64,
    #[serde(with = "serde_utils::quoted_u64")]
    pub gas_used: u64,
    #[serde(with = "serde_utils::quoted_u64")]
    pub timestamp: u64,
    #[serde(with = "hex_var_list")]
    pub extra_data: VariableList<u8, U32>,
    #[serde(with = "serde_utils::quoted_u256")]
    pub base_fee_per_gas: U256,

    // Extra payload fields
    pub block_hash: B256,
    #[serde(with = "list_of_hex_var_list")]
    pub transactions: Transactions,
}

impl ExecutionPayload {
    pub fn to_execution_payload_header(&self) -> ExecutionPayloadHeader {
        ExecutionPayloadHeader {
            parent_hash: self.parent_hash,
            fee_recipient: self.fee_recipient,
            state_root: self.state_root,
            receipts_root: self.receipts_root,
            logs_bloom: self.logs_bloom.clone(),
            prev_randao: self.prev_randao,
            block_number: self.block_number,
            gas_limit: self.gas_limit,
            gas_used: self.gas_used,
            timestamp: self.timestamp,
            extra_data: self.extra_data.clone(),
            base_fee_per_gas: self.base_fee_per_gas,
            block_hash: self.block_hash,
            transactions_root: self.transactions.tree_hash_root(),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::address;

    use super::*;

    #[test]
    fn test_header_commits_to_transactions() {
        let mut payload = ExecutionPayload {
            fee_recipient: address!("0x8943545177806ED17B9F23F0a21ee5948eCaa776"),
            block_number: 7,
            gas_limit: 30_000_000,
            ..Default::default()
        };
        let empty_header = payload.to_execution_payload_header();
        assert_eq!(empty_header.block_number, 7);
        assert_eq!(empty_header.fee_recipient, payload.fee_recipient);
        assert_eq!(
            empty_header.transactions_root,
            Transactions::default().tree_hash_root()
        );

        payload
            .transactions
            .push(VariableList::from(vec![0x02, 0xf8]))
            .expect("push transaction");
        assert_ne!(
            payload.to_execution_payload_header().transactions_root,
            empty_header.transactions_root
        );
    }

    #[test]
    fn test_json_uses_quoted_integers_and_hex_bytes() {
        let payload = ExecutionPayload {
            block_number: 1,
            extra_data: VariableList::from(vec![0xab]),
            ..Default::default()
        };
        let json = serde_json::to_value(&payload).expect("serialize");
        assert_eq!(json["block_number"], "1");
        assert_eq!(json["extra_data"], "0xab");
        assert_eq!(
            serde_json::from_value::<ExecutionPayload>(json).expect("deserialize"),
            payload
        );
    }
}
