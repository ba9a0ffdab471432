use anyhow::anyhow;
use blst::min_pk::{AggregatePublicKey as BlstAggregatePublicKey, PublicKey as BlstPublicKey};
use ssz_types::FixedVector;

use crate::{errors::BLSError, pubkey::PubKey, traits::Aggregatable};

impl From<BlstPublicKey> for PubKey {
    fn from(value: BlstPublicKey) -> Self {
        PubKey {
            inner: FixedVector::from(value.to_bytes().to_vec()),
        }
    }
}

impl PubKey {
    pub fn to_blst_pubkey(&self) -> Result<BlstPublicKey, BLSError> {
        BlstPublicKey::from_bytes(&self.inner).map_err(BLSError::from)
    }
}

impl Aggregatable<PubKey> for PubKey {
    type Error = anyhow::Error;

    fn aggregate(pubkeys: &[&PubKey]) -> anyhow::Result<PubKey> {
        let pubkeys = pubkeys
            .iter()
            .map(|pubkey| pubkey.to_blst_pubkey())
            .collect::<Result<Vec<_>, _>>()?;
        let aggregate_pubkey =
            BlstAggregatePublicKey::aggregate(&pubkeys.iter().collect::<Vec<_>>(), true)
                .map_err(|err| anyhow!("Failed to aggregate and validate public keys {err:?}"))?;
        Ok(PubKey::from(aggregate_pubkey.to_public_key()))
    }
}
