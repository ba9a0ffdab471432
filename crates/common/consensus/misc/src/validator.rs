use alloy_primitives::B256;
use sable_bls::PubKey;
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use tree_hash_derive::TreeHash;

use crate::constants::{EFFECTIVE_BALANCE_INCREMENT, FAR_FUTURE_EPOCH, MAX_EFFECTIVE_BALANCE};

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct Validator {
    pub pubkey: PubKey,

    /// Commitment to pubkey for withdrawals
    pub withdrawal_credentials: B256,

    /// Balance at stake
    #[serde(with = "serde_utils::quoted_u64")]
    pub effective_balance: u64,
    pub slashed: bool,

    /// When criteria for activation were met
    #[serde(with = "serde_utils::quoted_u64")]
    pub activation_eligibility_epoch: u64,
    #[serde(with = "serde_utils::quoted_u64")]
    pub activation_epoch: u64,
    #[serde(with = "serde_utils::quoted_u64")]
    pub exit_epoch: u64,

    /// When validator can withdraw funds
    #[serde(with = "serde_utils::quoted_u64")]
    pub withdrawable_epoch: u64,
}

impl Validator {
    /// A validator registered from a deposit of ``amount`` Gwei, not yet eligible for activation.
    pub fn from_deposit(pubkey: PubKey, withdrawal_credentials: B256, amount: u64) -> Self {
        Self {
            pubkey,
            withdrawal_credentials,
            effective_balance: (amount - amount % EFFECTIVE_BALANCE_INCREMENT)
                .min(MAX_EFFECTIVE_BALANCE),
            slashed: false,
            activation_eligibility_epoch: FAR_FUTURE_EPOCH,
            activation_epoch: FAR_FUTURE_EPOCH,
            exit_epoch: FAR_FUTURE_EPOCH,
            withdrawable_epoch: FAR_FUTURE_EPOCH,
        }
    }

    /// Check if ``validator`` is active.
    pub fn is_active_validator(&self, epoch: u64) -> bool {
        self.activation_epoch <= epoch && epoch < self.exit_epoch
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(32_000_000_000, 32_000_000_000)]
    #[case(33_500_000_000, 32_000_000_000)]
    #[case(17_999_999_999, 17_000_000_000)]
    #[case(999_999_999, 0)]
    fn test_effective_balance_from_deposit(#[case] amount: u64, #[case] expected: u64) {
        let validator = Validator::from_deposit(PubKey::default(), B256::ZERO, amount);
        assert_eq!(validator.effective_balance, expected);
        assert_eq!(validator.activation_epoch, FAR_FUTURE_EPOCH);
        assert!(!validator.is_active_validator(0));
    }
}
