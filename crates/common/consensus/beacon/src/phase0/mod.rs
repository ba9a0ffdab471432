pub mod beacon_block_body;
pub mod beacon_state;
