use alloy_primitives::{Address, B256, Bloom, Bytes, U64, U256};
use anyhow::anyhow;
use sable_consensus_beacon::bellatrix::execution_payload::{ExecutionPayload, Transactions};
use serde::{Deserialize, Serialize};
use ssz_types::{FixedVector, VariableList};

/// Engine API form of a bellatrix execution payload: camelCase keys, hex quantities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionPayloadV1 {
    pub parent_hash: B256,
    pub fee_recipient: Address,
    pub state_root: B256,
    pub receipts_root: B256,
    pub logs_bloom: Bloom,
    pub prev_randao: B256,
    pub block_number: U64,
    pub gas_limit: U64,
    pub gas_used: U64,
    pub timestamp: U64,
    pub extra_data: Bytes,
    pub base_fee_per_gas: U256,
    pub block_hash: B256,
    pub transactions: Vec<Bytes>,
}

impl From<&ExecutionPayload> for ExecutionPayloadV1 {
    fn from(payload: &ExecutionPayload) -> Self {
        ExecutionPayloadV1 {
            parent_hash: payload.parent_hash,
            fee_recipient: payload.fee_recipient,
            state_root: payload.state_root,
            receipts_root: payload.receipts_root,
            logs_bloom: Bloom::from_slice(&payload.logs_bloom),
            prev_randao: payload.prev_randao,
            block_number: U64::from(payload.block_number),
            gas_limit: U64::from(payload.gas_limit),
            gas_used: U64::from(payload.gas_used),
            timestamp: U64::from(payload.timestamp),
            extra_data: Bytes::copy_from_slice(&payload.extra_data),
            base_fee_per_gas: payload.base_fee_per_gas,
            block_hash: payload.block_hash,
            transactions: payload
                .transactions
                .iter()
                .map(|transaction| Bytes::copy_from_slice(transaction))
                .collect(),
        }
    }
}

impl TryFrom<ExecutionPayloadV1> for ExecutionPayload {
    type Error = anyhow::Error;

    fn try_from(payload: ExecutionPayloadV1) -> anyhow::Result<Self> {
        let transactions = payload
            .transactions
            .into_iter()
            .map(|transaction| {
                VariableList::new(transaction.to_vec())
                    .map_err(|err| anyhow!("Transaction exceeds the size limit: {err:?}"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(ExecutionPayload {
            parent_hash: payload.parent_hash,
            fee_recipient: payload.fee_recipient,
            state_root: payload.state_root,
            receipts_root: payload.receipts_root,
            logs_bloom: FixedVector::from(payload.logs_bloom.as_slice().to_vec()),
            prev_randao: payload.prev_randao,
            block_number: payload.block_number.to::<u64>(),
            gas_limit: payload.gas_limit.to::<u64>(),
            gas_used: payload.gas_used.to::<u64>(),
            timestamp: payload.timestamp.to::<u64>(),
            extra_data: VariableList::new(payload.extra_data.to_vec())
                .map_err(|err| anyhow!("Extra data exceeds 32 bytes: {err:?}"))?,
            base_fee_per_gas: payload.base_fee_per_gas,
            block_hash: payload.block_hash,
            transactions: Transactions::new(transactions)
                .map_err(|err| anyhow!("Too many transactions: {err:?}"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, b256};
    use serde_json::json;

    use super::*;

    fn payload() -> ExecutionPayload {
        ExecutionPayload {
            parent_hash: b256!("0x3b8fb240d288781d4aac94d3fd16809ee413bc99294a085798a589dae51ddd4a"),
            fee_recipient: address!("0xa94f5374fce5edbc8e2a8697c15331677e6ebf0b"),
            block_number: 1,
            gas_limit: 30_000_000,
            gas_used: 21_000,
            timestamp: 0x1234,
            extra_data: VariableList::from(vec![0xca, 0xfe]),
            base_fee_per_gas: U256::from(7u64),
            transactions: VariableList::from(vec![VariableList::from(vec![0x02, 0xf8])]),
            ..Default::default()
        }
    }

    #[test]
    fn test_engine_json_uses_hex_quantities() {
        let value = serde_json::to_value(ExecutionPayloadV1::from(&payload())).expect("json");
        assert_eq!(value["blockNumber"], json!("0x1"));
        assert_eq!(value["gasLimit"], json!("0x1c9c380"));
        assert_eq!(value["gasUsed"], json!("0x5208"));
        assert_eq!(value["timestamp"], json!("0x1234"));
        assert_eq!(value["baseFeePerGas"], json!("0x7"));
        assert_eq!(value["extraData"], json!("0xcafe"));
        assert_eq!(value["transactions"], json!(["0x02f8"]));
        assert!(value.get("block_number").is_none());
    }

    #[test]
    fn test_conversion_preserves_payload() {
        let payload = payload();
        let converted = ExecutionPayload::try_from(ExecutionPayloadV1::from(&payload))
            .expect("convert back");
        assert_eq!(converted, payload);
    }

    #[test]
    fn test_oversized_extra_data_is_rejected() {
        let mut engine_payload = ExecutionPayloadV1::from(&payload());
        engine_payload.extra_data = Bytes::from(vec![0u8; 33]);
        assert!(ExecutionPayload::try_from(engine_payload).is_err());
    }
}
