mod tests {
    use alloy_primitives::{B256, U256};
    use sable_bls::{
        BLSSignature,
        traits::{Aggregatable, Signable},
    };
    use sable_consensus_beacon::{
        bellatrix::{
            beacon_state::{BeaconState, ExecutionPayloadError},
            execution_payload::ExecutionPayload,
        },
        dev_deposits::{dev_genesis_state, dev_private_key},
        execution_engine::mock_engine::MockExecutionEngine,
        indexed_attestation::{IndexedAttestationError, is_valid_indexed_attestation},
        versioned_state::{ForkName, VersionedBeaconState},
        view::BeaconStateAccessors,
    };
    use sable_consensus_misc::{
        attestation_data::AttestationData, checkpoint::Checkpoint,
        constants::DOMAIN_BEACON_ATTESTER, indexed_attestation::IndexedAttestation,
        misc::compute_signing_root,
    };
    use sable_execution_engine::rpc_types::execution_payload::ExecutionPayloadV1;
    use sable_network_spec::networks::{BeaconNetworkSpec, DEV};
    use ssz_types::VariableList;
    use tokio_util::sync::CancellationToken;
    use tree_hash::TreeHash;

    const VALIDATOR_COUNT: u64 = 64;

    fn bellatrix_genesis() -> anyhow::Result<BeaconState> {
        let (state, _) = dev_genesis_state(VALIDATOR_COUNT)?;
        match VersionedBeaconState::Phase0(state).upgrade_through_epoch(0, &DEV)? {
            VersionedBeaconState::Bellatrix(state) => Ok(state),
            other => anyhow::bail!("expected bellatrix, got {}", other.fork_name()),
        }
    }

    fn payload_at(state: &BeaconState, network_spec: &BeaconNetworkSpec) -> ExecutionPayload {
        let parent = &state.latest_execution_payload_header;
        ExecutionPayload {
            parent_hash: parent.block_hash,
            block_number: parent.block_number + 1,
            gas_limit: 30_000_000,
            gas_used: 21_000,
            timestamp: state
                .compute_timestamp_at_slot(state.slot, network_spec.seconds_per_slot)
                .expect("timestamp"),
            base_fee_per_gas: U256::from(1_000_000_000u64),
            block_hash: B256::with_last_byte(parent.block_number as u8 + 1),
            ..Default::default()
        }
    }

    #[test]
    fn test_genesis_to_bellatrix_preserves_registry() {
        let (phase0, _) = dev_genesis_state(VALIDATOR_COUNT).expect("genesis");
        let validators_root = phase0.validators.tree_hash_root();
        assert!(VersionedBeaconState::Phase0(phase0.clone()).is_valid_genesis_state(&DEV));

        let state = bellatrix_genesis().expect("bellatrix");
        assert_eq!(state.validators.tree_hash_root(), validators_root);
        assert_eq!(state.genesis_validators_root, phase0.genesis_validators_root);
        assert_eq!(state.fork.current_version, DEV.bellatrix_fork_version);
        assert_eq!(state.fork.previous_version, DEV.altair_fork_version);
        assert_eq!(state.current_sync_committee, state.next_sync_committee);
        assert!(!state.is_merge_transition_complete());
        assert!(
            VersionedBeaconState::Bellatrix(state).is_valid_genesis_state(&DEV),
            "upgrades keep the genesis trigger"
        );
    }

    #[tokio::test]
    async fn test_payload_chain_on_upgraded_state() {
        let mut state = bellatrix_genesis().expect("bellatrix");
        let engine = MockExecutionEngine::new();
        let cancellation_token = CancellationToken::new();

        // First payload after the fork has no parent to check against
        let first = payload_at(&state, &DEV);
        state
            .process_execution_payload(&DEV, &first, Some(&engine), &cancellation_token)
            .await
            .expect("first payload");
        assert!(state.is_merge_transition_complete());
        assert_eq!(
            state.latest_execution_payload_header,
            first.to_execution_payload_header()
        );

        state.slot += 1;
        let second = payload_at(&state, &DEV);
        assert_eq!(second.parent_hash, first.block_hash);
        state
            .process_execution_payload(&DEV, &second, Some(&engine), &cancellation_token)
            .await
            .expect("second payload");
        assert_eq!(state.latest_execution_payload_header.block_number, 2);

        // Skipping a block number is rejected before the engine is consulted
        state.slot += 1;
        let mut skipped = payload_at(&state, &DEV);
        skipped.block_number += 1;
        let header_before = state.latest_execution_payload_header.clone();
        assert!(matches!(
            state
                .process_execution_payload(&DEV, &skipped, Some(&engine), &cancellation_token)
                .await,
            Err(ExecutionPayloadError::BlockNumberMismatch {
                expected: 3,
                actual: 4
            })
        ));
        assert_eq!(state.latest_execution_payload_header, header_before);
        assert_eq!(engine.calls(), 2);
    }

    #[tokio::test]
    async fn test_rejecting_engine_leaves_state_untouched() {
        let mut state = bellatrix_genesis().expect("bellatrix");
        let mut engine = MockExecutionEngine::new();
        engine.set_payload_status(false);
        let root_before = state.tree_hash_root();

        let payload = payload_at(&state, &DEV);
        let result = state
            .process_execution_payload(&DEV, &payload, Some(&engine), &CancellationToken::new())
            .await;
        assert!(matches!(
            result,
            Err(ExecutionPayloadError::PayloadRejected { block_number: 1, .. })
        ));
        assert_eq!(state.tree_hash_root(), root_before);
    }

    #[test]
    fn test_engine_wire_form_of_committed_payload() {
        let state = bellatrix_genesis().expect("bellatrix");
        let payload = payload_at(&state, &DEV);
        let wire = ExecutionPayloadV1::from(&payload);
        assert_eq!(wire.block_hash, payload.block_hash);
        assert_eq!(
            ExecutionPayload::try_from(wire).expect("convert back"),
            payload
        );
    }

    #[test]
    fn test_committee_attestation_on_upgraded_state() {
        let state = bellatrix_genesis().expect("bellatrix");
        let epochs_context = VersionedBeaconState::Bellatrix(state.clone())
            .epochs_context()
            .expect("epochs context");
        let mut committee = epochs_context
            .get_beacon_committee(0, 0)
            .expect("committee");
        committee.sort_unstable();
        assert_eq!(committee.len(), 2);

        let data = AttestationData {
            slot: 0,
            index: 0,
            beacon_block_root: B256::repeat_byte(0x01),
            source: Checkpoint::default(),
            target: Checkpoint {
                epoch: 0,
                root: B256::repeat_byte(0x01),
            },
        };
        let domain = state.get_domain(DOMAIN_BEACON_ATTESTER, Some(data.target.epoch));
        let signing_root = compute_signing_root(&data, domain);
        let signatures = committee
            .iter()
            .map(|&index| {
                dev_private_key(index)
                    .expect("key")
                    .sign(signing_root.as_slice())
                    .expect("sign")
            })
            .collect::<Vec<_>>();
        let signature =
            BLSSignature::aggregate(&signatures.iter().collect::<Vec<_>>()).expect("aggregate");

        let attestation = IndexedAttestation {
            attesting_indices: VariableList::from(committee.clone()),
            data,
            signature,
        };
        assert_eq!(is_valid_indexed_attestation(&state, &attestation), Ok(()));

        let mut reversed = attestation.clone();
        reversed.attesting_indices = VariableList::from(vec![committee[1], committee[0]]);
        assert_eq!(
            is_valid_indexed_attestation(&state, &reversed),
            Err(IndexedAttestationError::NotSorted)
        );

        let mut unknown = attestation;
        unknown.attesting_indices = VariableList::from(vec![committee[0], VALIDATOR_COUNT]);
        assert_eq!(
            is_valid_indexed_attestation(&state, &unknown),
            Err(IndexedAttestationError::IndexOutOfRange {
                index: VALIDATOR_COUNT
            })
        );
    }

    #[test]
    fn test_fork_names_of_the_upgrade_path() {
        let mut fork = ForkName::Phase0;
        let mut path = vec![fork];
        while let Some(next) = fork.next() {
            path.push(next);
            fork = next;
        }
        assert_eq!(
            path,
            vec![ForkName::Phase0, ForkName::Altair, ForkName::Bellatrix]
        );
    }
}
