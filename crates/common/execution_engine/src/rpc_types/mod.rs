pub mod execution_payload;
pub mod payload_status;
