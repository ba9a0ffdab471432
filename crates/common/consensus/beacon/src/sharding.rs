use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::{
    FixedVector, VariableList,
    serde_utils::hex_fixed_vec,
    typenum::{U48, U16384},
};
use tree_hash_derive::TreeHash;

/// Compressed BLS12-381 G1 point committing to a polynomial.
pub type BLSCommitment = FixedVector<u8, U48>;

/// Evaluation points of a shard blob, ``POINTS_PER_SAMPLE * MAX_SAMPLES_PER_BLOCK`` at most.
pub type ShardData = VariableList<U256, U16384>;

#[derive(Debug, PartialEq, Eq, Clone, Default, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct DataCommitment {
    /// KZG10 commitment to the data
    #[serde(with = "hex_fixed_vec")]
    pub point: BLSCommitment,
    /// Length of the data in samples
    #[serde(with = "serde_utils::quoted_u64")]
    pub length: u64,
}

#[derive(Debug, PartialEq, Eq, Clone, Default, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct ShardBlobBody {
    /// The actual data commitment
    pub commitment: DataCommitment,
    /// Proof that the degree < commitment.length
    #[serde(with = "hex_fixed_vec")]
    pub degree_proof: BLSCommitment,
    /// The actual data. Should match the commitment and degree proof.
    pub data: ShardData,
    // Fee payment fields (EIP 1559 like)
    #[serde(with = "serde_utils::quoted_u64")]
    pub max_priority_fee_per_sample: u64,
    #[serde(with = "serde_utils::quoted_u64")]
    pub max_fee_per_sample: u64,
}

#[cfg(test)]
mod tests {
    use sable_consensus_misc::constants::{MAX_SAMPLES_PER_BLOCK, POINTS_PER_SAMPLE};
    use ssz::{Decode, Encode};
    use ssz_types::typenum::Unsigned;
    use tree_hash::TreeHash;

    use super::*;

    fn shard_blob_body(points: u64) -> ShardBlobBody {
        ShardBlobBody {
            commitment: DataCommitment {
                point: FixedVector::from(vec![0xc0; 48]),
                length: points.div_ceil(POINTS_PER_SAMPLE),
            },
            degree_proof: FixedVector::from(vec![0xab; 48]),
            data: VariableList::new((0..points).map(U256::from).collect()).expect("data"),
            max_priority_fee_per_sample: 2,
            max_fee_per_sample: 40,
        }
    }

    #[test]
    fn test_shard_data_limit_matches_sample_constants() {
        assert_eq!(
            U16384::to_u64(),
            POINTS_PER_SAMPLE * MAX_SAMPLES_PER_BLOCK
        );
    }

    #[test]
    fn test_ssz_round_trip_preserves_root() {
        let body = shard_blob_body(20);
        let bytes = body.as_ssz_bytes();
        // 56 byte commitment, 48 byte proof, 4 byte offset, two fees, then the data
        assert_eq!(bytes.len(), 56 + 48 + 4 + 16 + 20 * 32);

        let decoded = ShardBlobBody::from_ssz_bytes(&bytes).expect("decode");
        assert_eq!(decoded, body);
        assert_eq!(decoded.tree_hash_root(), body.tree_hash_root());
    }

    #[test]
    fn test_root_commits_to_data() {
        let body = shard_blob_body(3);
        let mut changed = body.clone();
        changed.data[2] = U256::from(7u64);
        assert_ne!(body.tree_hash_root(), changed.tree_hash_root());
        assert_ne!(
            body.tree_hash_root(),
            ShardBlobBody::default().tree_hash_root()
        );
    }

    #[test]
    fn test_oversized_data_is_rejected() {
        let limit = POINTS_PER_SAMPLE * MAX_SAMPLES_PER_BLOCK;
        assert!(ShardData::new(vec![U256::ZERO; limit as usize + 1]).is_err());
    }
}
