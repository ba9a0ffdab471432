/// Return the given bit of a leaf index, counting from the bottom of the tree.
pub(crate) fn get_index_bit(index: u64, position: u64) -> bool {
    (index & (1 << position)) > 0
}
