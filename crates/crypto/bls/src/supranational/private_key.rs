use anyhow::anyhow;
use blst::min_pk::SecretKey as BlstSecretKey;

use crate::{
    PrivateKey, constants::DST, errors::BLSError, pubkey::PubKey, signature::BLSSignature,
    traits::Signable,
};

impl PrivateKey {
    /// Derives a key from input keying material following the IETF KeyGen procedure.
    ///
    /// ``ikm`` must be at least 32 bytes long.
    pub fn from_ikm(ikm: &[u8]) -> Result<Self, BLSError> {
        let secret_key = BlstSecretKey::key_gen(ikm, &[])?;
        Ok(Self {
            inner: secret_key.to_bytes().into(),
        })
    }

    pub fn public_key(&self) -> Result<PubKey, BLSError> {
        Ok(PubKey::from(self.to_blst_secret_key()?.sk_to_pk()))
    }

    fn to_blst_secret_key(&self) -> Result<BlstSecretKey, BLSError> {
        BlstSecretKey::from_bytes(self.inner.as_slice()).map_err(|_| BLSError::InvalidPrivateKey)
    }
}

impl Signable for PrivateKey {
    type Error = anyhow::Error;

    fn sign(&self, message: &[u8]) -> Result<BLSSignature, Self::Error> {
        let private_key = self
            .to_blst_secret_key()
            .map_err(|err| anyhow!("Failed to convert to BlstSecretKey: {err:?}"))?;
        Ok(BLSSignature::from(private_key.sign(message, DST, &[])))
    }
}
