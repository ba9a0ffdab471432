pub mod altair;
pub mod bellatrix;
pub mod dev_deposits;
pub mod epochs_context;
pub mod execution_engine;
pub mod genesis;
pub mod indexed_attestation;
pub mod phase0;
pub mod sharding;
pub mod upgrade;
pub mod versioned_state;
pub mod view;
