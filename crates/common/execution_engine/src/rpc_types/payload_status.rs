use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayloadStatus {
    Valid,
    Invalid,
    Syncing,
    Accepted,
    InvalidBlockHash,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadStatusV1 {
    pub status: PayloadStatus,
    pub latest_valid_hash: Option<B256>,
    pub validation_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("VALID", PayloadStatus::Valid)]
    #[case("SYNCING", PayloadStatus::Syncing)]
    #[case("INVALID_BLOCK_HASH", PayloadStatus::InvalidBlockHash)]
    fn test_status_names(#[case] name: &str, #[case] expected: PayloadStatus) {
        let json = format!(r#"{{"status":"{name}","latestValidHash":null,"validationError":null}}"#);
        let status: PayloadStatusV1 = serde_json::from_str(&json).expect("status");
        assert_eq!(status.status, expected);
        assert_eq!(status.latest_valid_hash, None);
    }
}
