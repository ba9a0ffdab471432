use alloy_primitives::{aliases::B32, fixed_bytes};

pub const DEPOSIT_CONTRACT_TREE_DEPTH: u64 = 32;
pub const DOMAIN_BEACON_ATTESTER: B32 = fixed_bytes!("0x01000000");
pub const DOMAIN_BEACON_PROPOSER: B32 = fixed_bytes!("0x00000000");
pub const DOMAIN_DEPOSIT: B32 = fixed_bytes!("0x03000000");
pub const DOMAIN_SYNC_COMMITTEE: B32 = fixed_bytes!("0x07000000");
pub const EFFECTIVE_BALANCE_INCREMENT: u64 = 1_000_000_000;
pub const EPOCHS_PER_HISTORICAL_VECTOR: u64 = 65536;
pub const FAR_FUTURE_EPOCH: u64 = u64::MAX;
pub const GENESIS_EPOCH: u64 = 0;
pub const GENESIS_SLOT: u64 = 0;
pub const MAX_COMMITTEES_PER_SLOT: u64 = 64;
pub const MAX_EFFECTIVE_BALANCE: u64 = 32_000_000_000;
pub const MAX_RANDOM_BYTE: u64 = 255;
pub const MAX_VALIDATORS_PER_COMMITTEE: u64 = 2048;
pub const MIN_ATTESTATION_INCLUSION_DELAY: u64 = 1;
pub const MIN_SEED_LOOKAHEAD: u64 = 1;
pub const SHUFFLE_ROUND_COUNT: u8 = 90;
pub const SLOTS_PER_EPOCH: u64 = 32;
pub const SLOTS_PER_HISTORICAL_ROOT: u64 = 8192;
pub const SYNC_COMMITTEE_SIZE: u64 = 512;
pub const TARGET_COMMITTEE_SIZE: u64 = 128;

// Participation flags
pub const TIMELY_SOURCE_FLAG_INDEX: u8 = 0;
pub const TIMELY_TARGET_FLAG_INDEX: u8 = 1;
pub const TIMELY_HEAD_FLAG_INDEX: u8 = 2;

// Withdrawal prefix
pub const BLS_WITHDRAWAL_PREFIX: &[u8] = &[0];

// Execution
pub const GAS_LIMIT_DENOMINATOR: u64 = 1024;
pub const MIN_GAS_LIMIT: u64 = 5000;

// Sharding
pub const POINTS_PER_SAMPLE: u64 = 8;
pub const MAX_SAMPLES_PER_BLOCK: u64 = 2048;
