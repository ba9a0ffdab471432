pub const DEFAULT_DEV_NETWORK: &str = "dev";
pub const DEFAULT_DEV_VALIDATOR_COUNT: u64 = 64;
pub const DEFAULT_NETWORK: &str = "mainnet";
pub const DEFAULT_VERBOSITY: &str = "3";
