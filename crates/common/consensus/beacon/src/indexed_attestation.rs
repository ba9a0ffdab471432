use alloy_primitives::B256;
use sable_bls::{BLSSignature, PubKey, traits::Verifiable};
use sable_consensus_misc::{
    attestation_data::AttestationData,
    constants::{DOMAIN_BEACON_ATTESTER, MAX_VALIDATORS_PER_COMMITTEE},
    indexed_attestation::IndexedAttestation,
    misc::compute_signing_root,
};
use thiserror::Error;

use crate::view::AttestationValidator;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexedAttestationError {
    #[error("attestation has {count} indices, more than the limit of {limit}", limit = MAX_VALIDATORS_PER_COMMITTEE)]
    TooManyIndices { count: usize },
    #[error("attestation indices are not sorted")]
    NotSorted,
    #[error("attestation indices at {first} and {second} are duplicate, both: {index}")]
    DuplicateIndex {
        first: usize,
        second: usize,
        index: u64,
    },
    #[error("attestation index {index} is not in the validator registry")]
    IndexOutOfRange { index: u64 },
    #[error("attestation has no attesting indices")]
    EmptyAttestation,
    #[error("attestation aggregate signature is invalid")]
    InvalidSignature,
}

/// Aggregate signature check used by the indexed attestation validator.
pub trait AggregateVerifier {
    /// Whether ``signature`` is a valid aggregate of ``pubkeys`` over ``signing_root``.
    ///
    /// Undecodable keys or signatures are reported as ``false``.
    fn fast_aggregate_verify(
        &self,
        pubkeys: &[&PubKey],
        signing_root: B256,
        signature: &BLSSignature,
    ) -> bool;
}

/// [`AggregateVerifier`] backed by `sable-bls`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlsVerifier;

impl AggregateVerifier for BlsVerifier {
    fn fast_aggregate_verify(
        &self,
        pubkeys: &[&PubKey],
        signing_root: B256,
        signature: &BLSSignature,
    ) -> bool {
        matches!(
            signature.fast_aggregate_verify(pubkeys, signing_root.as_slice()),
            Ok(true)
        )
    }
}

/// Check if ``indexed_attestation`` is not empty, has sorted and unique indices and has a valid
/// aggregate signature.
pub fn is_valid_indexed_attestation<V: AttestationValidator + ?Sized>(
    view: &V,
    indexed_attestation: &IndexedAttestation,
) -> Result<(), IndexedAttestationError> {
    is_valid_indexed_attestation_with(view, indexed_attestation, &BlsVerifier)
}

pub fn is_valid_indexed_attestation_with<V, A>(
    view: &V,
    indexed_attestation: &IndexedAttestation,
    verifier: &A,
) -> Result<(), IndexedAttestationError>
where
    V: AttestationValidator + ?Sized,
    A: AggregateVerifier + ?Sized,
{
    validate_attestation_signature_set(
        view,
        &indexed_attestation.attesting_indices,
        &indexed_attestation.data,
        &indexed_attestation.signature,
        verifier,
    )
}

/// Run the indexed attestation checks over a raw index list.
///
/// The verifier is only consulted once every structural check has passed.
pub fn validate_attestation_signature_set<V, A>(
    view: &V,
    attesting_indices: &[u64],
    data: &AttestationData,
    signature: &BLSSignature,
    verifier: &A,
) -> Result<(), IndexedAttestationError>
where
    V: AttestationValidator + ?Sized,
    A: AggregateVerifier + ?Sized,
{
    let count = attesting_indices.len();
    if count as u64 > MAX_VALIDATORS_PER_COMMITTEE {
        return Err(IndexedAttestationError::TooManyIndices { count });
    }

    if !attesting_indices.is_sorted() {
        return Err(IndexedAttestationError::NotSorted);
    }

    // Sorted, so duplicates are adjacent
    if let Some(first) = attesting_indices
        .windows(2)
        .position(|pair| pair[0] == pair[1])
    {
        return Err(IndexedAttestationError::DuplicateIndex {
            first,
            second: first + 1,
            index: attesting_indices[first],
        });
    }

    let Some(&last) = attesting_indices.last() else {
        return Err(IndexedAttestationError::EmptyAttestation);
    };
    if !view.is_valid_index(last) {
        return Err(IndexedAttestationError::IndexOutOfRange { index: last });
    }

    let pubkeys = attesting_indices
        .iter()
        .map(|&index| {
            view.validator_pubkey(index)
                .ok_or(IndexedAttestationError::IndexOutOfRange { index })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let domain = view.signature_domain(DOMAIN_BEACON_ATTESTER, data.target.epoch);
    let signing_root = compute_signing_root(data, domain);
    if !verifier.fast_aggregate_verify(&pubkeys, signing_root, signature) {
        return Err(IndexedAttestationError::InvalidSignature);
    }

    Ok(())
}
