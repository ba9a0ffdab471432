//! https://ethereum.github.io/consensus-specs/ssz/merkle-proofs

use alloy_primitives::B256;

mod deposit_tree;
mod hash;
mod index;

pub use deposit_tree::{DEPOSIT_TREE_DEPTH, DepositTree};
use hash::hash_concat;
use index::get_index_bit;

/// Check if ``leaf`` at ``index`` verifies against the Merkle ``root`` and ``branch``.
///
/// A branch shorter than ``depth`` never verifies.
pub fn is_valid_merkle_branch(
    leaf: B256,
    branch: &[B256],
    depth: u64,
    index: u64,
    root: B256,
) -> bool {
    if (branch.len() as u64) < depth {
        return false;
    }
    let mut value = leaf;
    for (i, node) in branch.iter().take(depth as usize).enumerate() {
        if get_index_bit(index, i as u64) {
            value = hash_concat(node.as_slice(), value.as_slice());
        } else {
            value = hash_concat(value.as_slice(), node.as_slice());
        }
    }
    value == root
}
