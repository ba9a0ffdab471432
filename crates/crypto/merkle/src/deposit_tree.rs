use std::sync::LazyLock;

use alloy_primitives::B256;
use anyhow::ensure;

use crate::hash::{hash_concat, mix_in_length};

/// Depth of the deposit contract tree, not counting the length mix-in.
pub const DEPOSIT_TREE_DEPTH: usize = 32;

/// ``ZERO_HASHES[i]`` is the root of an empty subtree of height ``i``.
static ZERO_HASHES: LazyLock<[B256; DEPOSIT_TREE_DEPTH + 1]> = LazyLock::new(|| {
    let mut zero_hashes = [B256::ZERO; DEPOSIT_TREE_DEPTH + 1];
    for height in 1..=DEPOSIT_TREE_DEPTH {
        zero_hashes[height] = hash_concat(
            zero_hashes[height - 1].as_slice(),
            zero_hashes[height - 1].as_slice(),
        );
    }
    zero_hashes
});

/// Incremental Merkle accumulator emulating the eth1 deposit contract.
///
/// The root mixes in the number of leaves, so it equals the hash tree root of an SSZ
/// ``List[Root, 2**32]`` holding the same leaves. Appending and computing the root are both
/// ``O(DEPOSIT_TREE_DEPTH)``.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositTree {
    branch: [B256; DEPOSIT_TREE_DEPTH],
    leaves: Vec<B256>,
}

impl Default for DepositTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DepositTree {
    pub fn new() -> Self {
        Self {
            branch: [B256::ZERO; DEPOSIT_TREE_DEPTH],
            leaves: vec![],
        }
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Add a leaf (``DepositData::tree_hash_root``) to the tree.
    pub fn push_leaf(&mut self, leaf: B256) -> anyhow::Result<()> {
        ensure!(
            (self.leaves.len() as u64) < (1u64 << DEPOSIT_TREE_DEPTH),
            "Deposit tree is full"
        );
        self.leaves.push(leaf);

        let mut size = self.leaves.len() as u64;
        let mut node = leaf;
        for height in 0..DEPOSIT_TREE_DEPTH {
            if size & 1 == 1 {
                self.branch[height] = node;
                break;
            }
            node = hash_concat(self.branch[height].as_slice(), node.as_slice());
            size >>= 1;
        }
        Ok(())
    }

    /// Retrieve the root hash of this tree with the length mixed in.
    pub fn root(&self) -> B256 {
        let mut size = self.leaves.len() as u64;
        let mut node = B256::ZERO;
        for height in 0..DEPOSIT_TREE_DEPTH {
            if size & 1 == 1 {
                node = hash_concat(self.branch[height].as_slice(), node.as_slice());
            } else {
                node = hash_concat(node.as_slice(), ZERO_HASHES[height].as_slice());
            }
            size >>= 1;
        }
        mix_in_length(node, self.leaves.len() as u64)
    }

    /// Return a proof of inclusion of the leaf at ``index`` against the current [`Self::root`].
    ///
    /// The proof is bottom-up and has ``DEPOSIT_TREE_DEPTH + 1`` nodes, the last one being the
    /// little-endian leaf count.
    pub fn generate_proof(&self, index: usize) -> anyhow::Result<Vec<B256>> {
        ensure!(
            index < self.leaves.len(),
            "Leaf index {index} out of bounds for {} leaves",
            self.leaves.len()
        );

        let mut proof = Vec::with_capacity(DEPOSIT_TREE_DEPTH + 1);
        let mut layer = self.leaves.clone();
        let mut position = index;
        for zero_hash in ZERO_HASHES.iter().take(DEPOSIT_TREE_DEPTH) {
            proof.push(layer.get(position ^ 1).copied().unwrap_or(*zero_hash));
            layer = layer
                .chunks(2)
                .map(|pair| {
                    let right = pair.get(1).unwrap_or(zero_hash);
                    hash_concat(pair[0].as_slice(), right.as_slice())
                })
                .collect();
            position /= 2;
        }

        let mut length_bytes = [0u8; 32];
        length_bytes[..8].copy_from_slice(&(self.leaves.len() as u64).to_le_bytes());
        proof.push(B256::from(length_bytes));
        Ok(proof)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::is_valid_merkle_branch;

    #[test]
    fn test_empty_tree_root() {
        let tree = DepositTree::new();
        assert_eq!(
            tree.root(),
            mix_in_length(ZERO_HASHES[DEPOSIT_TREE_DEPTH], 0)
        );
    }

    #[test]
    fn test_single_leaf_root() {
        let leaf = B256::repeat_byte(0x11);
        let mut tree = DepositTree::new();
        tree.push_leaf(leaf).expect("push");

        let mut node = leaf;
        for zero_hash in ZERO_HASHES.iter().take(DEPOSIT_TREE_DEPTH) {
            node = hash_concat(node.as_slice(), zero_hash.as_slice());
        }
        assert_eq!(tree.root(), mix_in_length(node, 1));
    }

    #[test]
    fn test_proofs_verify_against_every_intermediate_root() {
        let mut tree = DepositTree::new();
        for i in 0..9u8 {
            tree.push_leaf(B256::repeat_byte(i + 1)).expect("push");
            let root = tree.root();
            for index in 0..tree.len() {
                let proof = tree.generate_proof(index).expect("proof");
                assert_eq!(proof.len(), DEPOSIT_TREE_DEPTH + 1);
                assert!(is_valid_merkle_branch(
                    B256::repeat_byte(index as u8 + 1),
                    &proof,
                    DEPOSIT_TREE_DEPTH as u64 + 1,
                    index as u64,
                    root,
                ));
            }
        }
    }

    #[test]
    fn test_proof_out_of_bounds() {
        let mut tree = DepositTree::new();
        tree.push_leaf(B256::ZERO).expect("push");
        assert!(tree.generate_proof(1).is_err());
    }
}
