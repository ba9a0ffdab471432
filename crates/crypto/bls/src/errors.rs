use thiserror::Error;

#[derive(Error, PartialEq, Eq, Debug)]
pub enum BLSError {
    #[cfg(feature = "supranational")]
    #[error("blst error: {0:?}")]
    BlstError(blst::BLST_ERROR),
    #[error("invalid byte length")]
    InvalidByteLength,
    #[error("invalid hex string")]
    InvalidHexString,
    #[error("invalid public key")]
    InvalidPublicKey,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("invalid private key")]
    InvalidPrivateKey,
}

#[cfg(feature = "supranational")]
impl From<blst::BLST_ERROR> for BLSError {
    fn from(err: blst::BLST_ERROR) -> Self {
        BLSError::BlstError(err)
    }
}
