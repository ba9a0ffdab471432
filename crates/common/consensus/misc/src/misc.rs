use std::cmp::max;

use alloy_primitives::{B256, aliases::B32};
use anyhow::{anyhow, ensure};
use ethereum_hashing::hash;
use tree_hash::TreeHash;

use crate::{
    constants::{SHUFFLE_ROUND_COUNT, SLOTS_PER_EPOCH},
    fork_data::ForkData,
    signing_data::SigningData,
};

pub mod checksummed_address {
    use alloy_primitives::Address;
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    pub fn serialize<S>(address: &Address, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let checksummed = address.to_checksum(None);
        serializer.serialize_str(&checksummed)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Address, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        s.parse::<Address>().map_err(D::Error::custom)
    }
}

/// Return the signing root for the corresponding signing data.
pub fn compute_signing_root<SSZObject: TreeHash>(ssz_object: SSZObject, domain: B256) -> B256 {
    SigningData {
        object_root: ssz_object.tree_hash_root(),
        domain,
    }
    .tree_hash_root()
}

/// Return the shuffled index corresponding to ``seed`` (and ``index_count``).
pub fn compute_shuffled_index(
    mut index: usize,
    index_count: usize,
    seed: B256,
) -> anyhow::Result<usize> {
    ensure!(
        index < index_count,
        "Index {index} must be less than index_count {index_count}"
    );
    for round in 0..SHUFFLE_ROUND_COUNT {
        let seed_with_round = [seed.as_slice(), &round.to_le_bytes()].concat();
        let pivot = bytes_to_int64(&hash(&seed_with_round)[..8]) % index_count as u64;

        let flip = (pivot as usize + (index_count - index)) % index_count;
        let position = max(index, flip);
        let seed_with_position = [
            seed_with_round.as_slice(),
            &((position / 256) as u32).to_le_bytes(),
        ]
        .concat();
        let source = hash(&seed_with_position);
        let byte = source[(position % 256) / 8];
        let bit = (byte >> (position % 8)) % 2;

        index = if bit == 1 { flip } else { index };
    }
    Ok(index)
}

const SEED_SIZE: usize = 32;
const PIVOT_VIEW_SIZE: usize = SEED_SIZE + 1;
const TOTAL_SIZE: usize = PIVOT_VIEW_SIZE + 4;

/// Shuffle a whole list with the swap-or-not network of ``compute_shuffled_index``.
///
/// With ``forwards == false`` the result satisfies
/// ``output[i] == input[compute_shuffled_index(i, len, seed)]``, which is the committee order.
/// Shuffling forwards inverts that permutation.
pub fn shuffle_list(mut input: Vec<u64>, seed: B256, forwards: bool) -> Vec<u64> {
    let list_size = input.len();
    if list_size <= 1 {
        return input;
    }

    let mut buffer = [0u8; TOTAL_SIZE];
    buffer[..SEED_SIZE].copy_from_slice(seed.as_slice());
    for step in 0..SHUFFLE_ROUND_COUNT {
        let round = if forwards {
            step
        } else {
            SHUFFLE_ROUND_COUNT - 1 - step
        };
        buffer[SEED_SIZE] = round;
        let pivot = (bytes_to_int64(&hash(&buffer[..PIVOT_VIEW_SIZE])[..8]) % list_size as u64)
            as usize;

        // Pairs summing to pivot, then pairs summing to pivot + list_size
        swap_mirrored(&mut input, &mut buffer, 0, pivot);
        swap_mirrored(&mut input, &mut buffer, pivot + 1, list_size - 1);
    }
    input
}

/// Swap ``input[low + k]`` with ``input[high - k]`` wherever the round's bit at ``high - k`` is set.
fn swap_mirrored(input: &mut [u64], buffer: &mut [u8; TOTAL_SIZE], low: usize, high: usize) {
    if high < low {
        return;
    }
    buffer[PIVOT_VIEW_SIZE..].copy_from_slice(&((high >> 8) as u32).to_le_bytes());
    let mut source = hash(buffer.as_slice());
    let mut byte = source[(high & 0xff) >> 3];

    for offset in 0..(high + 1 - low) / 2 {
        let (i, j) = (low + offset, high - offset);
        if j & 0xff == 0xff {
            buffer[PIVOT_VIEW_SIZE..].copy_from_slice(&((j >> 8) as u32).to_le_bytes());
            source = hash(buffer.as_slice());
        }
        if j & 0x07 == 0x07 {
            byte = source[(j & 0xff) >> 3];
        }
        if (byte >> (j & 0x07)) & 0x01 == 1 {
            input.swap(i, j);
        }
    }
}

/// Return the integer deserialization of ``data`` interpreted as little-endian.
pub fn bytes_to_int64(slice: &[u8]) -> u64 {
    let mut bytes = [0u8; 8];
    let len = slice.len().min(8);
    bytes[..len].copy_from_slice(&slice[..len]);
    u64::from_le_bytes(bytes)
}

/// Return the epoch number at ``slot``.
pub fn compute_epoch_at_slot(slot: u64) -> u64 {
    slot / SLOTS_PER_EPOCH
}

/// Return the start slot of ``epoch``.
pub fn compute_start_slot_at_epoch(epoch: u64) -> anyhow::Result<u64> {
    epoch
        .checked_mul(SLOTS_PER_EPOCH)
        .ok_or_else(|| anyhow!("start slot of epoch {epoch} overflows"))
}

/// Return the domain for the ``domain_type`` and ``fork_version``.
pub fn compute_domain(
    domain_type: B32,
    fork_version: B32,
    genesis_validators_root: B256,
) -> B256 {
    let fork_data_root = ForkData {
        current_version: fork_version,
        genesis_validators_root,
    }
    .compute_fork_data_root();
    let domain_bytes = [domain_type.as_slice(), &fork_data_root[..28]].concat();
    B256::from_slice(&domain_bytes)
}

/// Return the largest integer ``x`` such that ``x**2 <= n``.
pub fn integer_squareroot(n: u64) -> u64 {
    if n == u64::MAX {
        return u32::MAX as u64;
    }
    let mut x = n;
    let mut y = x.div_ceil(2);
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use alloy_primitives::{b256, fixed_bytes};
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0, 0)]
    #[case(1, 1)]
    #[case(15, 3)]
    #[case(16, 4)]
    #[case(32, 5)]
    #[case(u64::MAX, 4294967295)]
    fn test_integer_squareroot(#[case] n: u64, #[case] expected: u64) {
        assert_eq!(integer_squareroot(n), expected);
    }

    #[test]
    fn test_compute_shuffled_index_is_a_permutation() {
        let seed = b256!("0x4ac96f664a6cafd300b161720809b9e17905d4d8fed7a97ff89cf0080a953fe7");
        for index_count in [1usize, 2, 7, 33, 100] {
            let shuffled = (0..index_count)
                .map(|index| compute_shuffled_index(index, index_count, seed).expect("in range"))
                .collect::<HashSet<_>>();
            assert_eq!(shuffled.len(), index_count);
            assert!(shuffled.iter().all(|index| *index < index_count));
        }
    }

    #[test]
    fn test_shuffle_list_matches_shuffled_index() {
        let seed = b256!("0x4ac96f664a6cafd300b161720809b9e17905d4d8fed7a97ff89cf0080a953fe7");
        for list_size in [0usize, 1, 2, 7, 255, 256, 257, 600] {
            let input = (0..list_size as u64).map(|index| index * 3 + 1).collect::<Vec<_>>();
            let expected = (0..list_size)
                .map(|index| {
                    input[compute_shuffled_index(index, list_size, seed).expect("in range")]
                })
                .collect::<Vec<_>>();
            let shuffled = shuffle_list(input.clone(), seed, false);
            assert_eq!(shuffled, expected, "list size {list_size}");
            assert_eq!(shuffle_list(shuffled, seed, true), input, "list size {list_size}");
        }
    }

    #[test]
    fn test_compute_shuffled_index_out_of_range() {
        assert!(compute_shuffled_index(3, 3, B256::ZERO).is_err());
    }

    #[test]
    fn test_compute_domain_prefixes_domain_type() {
        let domain = compute_domain(
            fixed_bytes!("0x01000000"),
            fixed_bytes!("0x00000000"),
            B256::ZERO,
        );
        assert_eq!(&domain[..4], &[1, 0, 0, 0]);

        let fork_data_root = ForkData {
            current_version: fixed_bytes!("0x00000000"),
            genesis_validators_root: B256::ZERO,
        }
        .compute_fork_data_root();
        assert_eq!(&domain[4..], &fork_data_root[..28]);
    }

    #[test]
    fn test_epoch_slot_conversions() {
        assert_eq!(compute_epoch_at_slot(63), 1);
        assert_eq!(compute_epoch_at_slot(64), 2);
        assert_eq!(compute_start_slot_at_epoch(2).expect("start slot"), 64);
        assert_eq!(
            compute_start_slot_at_epoch(compute_epoch_at_slot(u64::MAX)).expect("last epoch"),
            u64::MAX - (SLOTS_PER_EPOCH - 1)
        );
        assert!(compute_start_slot_at_epoch(u64::MAX).is_err());
    }
}
