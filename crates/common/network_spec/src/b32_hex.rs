//! Deserializes 4-byte fork versions written as ``0x``-prefixed hex.

use alloy_primitives::aliases::B32;
use serde::Deserializer;
use serde_utils::hex::PrefixedHexVisitor;

pub fn deserialize<'de, D>(deserializer: D) -> Result<B32, D::Error>
where
    D: Deserializer<'de>,
{
    let decoded = deserializer.deserialize_str(PrefixedHexVisitor)?;
    B32::try_from(decoded.as_slice()).map_err(serde::de::Error::custom)
}
