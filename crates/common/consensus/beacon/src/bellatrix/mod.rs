pub mod beacon_state;
pub mod execution_payload;
pub mod execution_payload_header;
