//! End-to-end integration tests for the IFC operator core.
//!
//! These tests run the whole operator flow against an in-memory booster and
//! a recording chain: payments are sealed, hashed and signed, forwarded to
//! the booster, folded into a stage tree, committed, disputed and finalized.
//!
//! Each test builds its own booster and chain. No network, no shared state.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use ifc_protocol::chain::{ChainClient, ContractCall, TxHandle};
use ifc_protocol::config::StageTimings;
use ifc_protocol::crypto::hash::{keccak256, merkle_parent, to_prefixed_hex, H256};
use ifc_protocol::crypto::{Address, Credential, IfcKeypair, SealingKeypair};
use ifc_protocol::gateway::{BoosterGateway, PendingRoot, Slice};
use ifc_protocol::light_tx::{
    DepositLog, LightTransactionFactory, LightTxInput, LightTxType, Party, SignedLightTransaction,
};
use ifc_protocol::payment::{
    encode_and_hash, open_cipher, verify_commitment, PaymentSigner, RawPayment,
    SignedPaymentCommitment,
};
use ifc_protocol::stage::{stage_hash, ExonerationProof, StageLifecycle, StageState};
use ifc_protocol::ProtocolError;

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

/// A booster that keeps everything in memory. Stage trees are built from
/// the payment hashes it received, padded to a power of two by repeating
/// the last leaf.
#[derive(Default)]
struct InMemoryBooster {
    contract: Option<Address>,
    payments: Mutex<Vec<SignedPaymentCommitment>>,
    pending: Mutex<HashMap<u64, H256>>,
    committed: Mutex<HashMap<u64, H256>>,
    light_txs: Mutex<Vec<SignedLightTransaction>>,
}

impl InMemoryBooster {
    fn new(contract: Address) -> Self {
        Self {
            contract: Some(contract),
            ..Default::default()
        }
    }

    fn leaves(&self, stage_height: u64) -> Vec<H256> {
        let mut leaves: Vec<H256> = self
            .payments
            .lock()
            .iter()
            .filter(|p| p.stage_height == stage_height)
            .map(|p| p.payment_hash)
            .collect();
        if let Some(last) = leaves.last().copied() {
            while !leaves.len().is_power_of_two() {
                leaves.push(last);
            }
        }
        leaves
    }

    /// Build the stage tree and mark its root as pending.
    fn seal_stage(&self, stage_height: u64) -> H256 {
        let mut level = self.leaves(stage_height);
        while level.len() > 1 {
            level = level
                .chunks(2)
                .map(|pair| merkle_parent(&pair[0], &pair[1]))
                .collect();
        }
        let root = level[0];
        self.pending.lock().insert(stage_height, root);
        root
    }

    /// What the contract would hold once the commit is mined.
    fn confirm_commit(&self, stage_height: u64) {
        if let Some(root) = self.pending.lock().remove(&stage_height) {
            self.committed.lock().insert(stage_height, root);
        }
    }
}

#[async_trait]
impl BoosterGateway for InMemoryBooster {
    async fn pending_root(&self, stage_height: Option<u64>) -> ifc_protocol::Result<PendingRoot> {
        let pending = self.pending.lock();
        let found = match stage_height {
            Some(h) => pending.get(&h).map(|root| (h, *root)),
            None => pending.iter().min_by_key(|(h, _)| **h).map(|(h, r)| (*h, *r)),
        };
        found
            .map(|(stage_height, root_hash)| PendingRoot {
                stage_height,
                root_hash,
            })
            .ok_or_else(|| ProtocolError::NoPendingRoot("nothing to commit".into()))
    }

    async fn committed_root(&self, stage_height: u64) -> ifc_protocol::Result<Option<H256>> {
        Ok(self.committed.lock().get(&stage_height).copied())
    }

    async fn slice(&self, stage_height: u64, payment_hash: &H256) -> ifc_protocol::Result<Slice> {
        let mut level = self.leaves(stage_height);
        let mut index = level
            .iter()
            .position(|leaf| leaf == payment_hash)
            .ok_or_else(|| ProtocolError::gateway("/slice", Some(404), "unknown payment"))?;
        let tree_node_index = index as u64;
        let mut siblings = Vec::new();
        while level.len() > 1 {
            siblings.push(level[index ^ 1]);
            level = level
                .chunks(2)
                .map(|pair| merkle_parent(&pair[0], &pair[1]))
                .collect();
            index /= 2;
        }
        Ok(Slice {
            tree_node_index,
            siblings,
            colliding_payment_hashes: vec![*payment_hash],
        })
    }

    async fn send_payments(
        &self,
        payments: &[SignedPaymentCommitment],
    ) -> ifc_protocol::Result<serde_json::Value> {
        self.payments.lock().extend_from_slice(payments);
        Ok(serde_json::json!({ "ok": true, "received": payments.len() }))
    }

    async fn send_light_tx(
        &self,
        tx: &SignedLightTransaction,
    ) -> ifc_protocol::Result<serde_json::Value> {
        tx.verify()?;
        self.light_txs.lock().push(tx.clone());
        Ok(serde_json::json!({ "lightTxHash": to_prefixed_hex(&tx.light_tx_hash) }))
    }

    async fn contract_address(&self) -> ifc_protocol::Result<Address> {
        self.contract
            .ok_or_else(|| ProtocolError::gateway("/contract/address/ifc", Some(404), "unset"))
    }

    async fn viable_stage_height(&self) -> ifc_protocol::Result<u64> {
        Ok(1)
    }
}

/// Records every contract call instead of sending it.
#[derive(Default)]
struct RecordingChain {
    calls: Mutex<Vec<(Address, ContractCall)>>,
}

impl RecordingChain {
    fn methods(&self) -> Vec<&'static str> {
        self.calls.lock().iter().map(|(_, c)| c.method()).collect()
    }
}

#[async_trait]
impl ChainClient for RecordingChain {
    async fn submit(
        &self,
        contract: &Address,
        call: &ContractCall,
        _nonce: Option<u64>,
    ) -> ifc_protocol::Result<TxHandle> {
        let mut calls = self.calls.lock();
        calls.push((*contract, call.clone()));
        Ok(TxHandle {
            method: call.method().to_string(),
            tx_hash: keccak256(&(calls.len() as u64).to_be_bytes()),
        })
    }
}

struct Parties {
    client: SealingKeypair,
    stakeholder: SealingKeypair,
}

fn parties() -> Parties {
    Parties {
        client: SealingKeypair::generate(),
        stakeholder: SealingKeypair::generate(),
    }
}

fn payment(p: &Parties, value: u64, lsn: u64, stage_height: u64) -> RawPayment {
    RawPayment::new(
        "0x00000000000000000000000000000000000000aa",
        "0x00000000000000000000000000000000000000bb",
        value,
        lsn,
        stage_height,
        &p.client.public_key_bytes(),
        &p.stakeholder.public_key_bytes(),
    )
}

fn operator() -> PaymentSigner {
    PaymentSigner::new(Credential::new(IfcKeypair::generate()))
}

// ---------------------------------------------------------------------------
// 1. Dual sealing and payment hash
// ---------------------------------------------------------------------------

#[test]
fn payment_sealed_to_both_counterparties() {
    let p = parties();
    let raw = payment(&p, 100, 1, 1);
    let encoded = encode_and_hash(&raw).unwrap();

    assert_eq!(
        encoded.payment_hash,
        keccak256(&[encoded.cipher_client.as_slice(), encoded.cipher_stakeholder.as_slice()].concat())
    );

    // Each counterparty opens its own copy and sees the same payment.
    let opened_client = open_cipher(&encoded.cipher_client, &p.client).unwrap();
    let opened_stakeholder = open_cipher(&encoded.cipher_stakeholder, &p.stakeholder).unwrap();
    assert_eq!(opened_client, raw);
    assert_eq!(opened_stakeholder, raw);

    // And neither can open the other's.
    assert!(open_cipher(&encoded.cipher_client, &p.stakeholder).is_err());
}

#[test]
fn payment_hash_changes_with_either_key() {
    let p = parties();
    let base = encode_and_hash(&payment(&p, 100, 1, 1)).unwrap();

    let other_client = Parties {
        client: SealingKeypair::generate(),
        stakeholder: p.stakeholder.clone(),
    };
    let other_stakeholder = Parties {
        client: p.client.clone(),
        stakeholder: SealingKeypair::generate(),
    };

    let h1 = encode_and_hash(&payment(&other_client, 100, 1, 1)).unwrap();
    let h2 = encode_and_hash(&payment(&other_stakeholder, 100, 1, 1)).unwrap();
    assert_ne!(base.payment_hash, h1.payment_hash);
    assert_ne!(base.payment_hash, h2.payment_hash);
    assert_ne!(h1.payment_hash, h2.payment_hash);
}

#[test]
fn incomplete_payment_rejected_before_hashing() {
    let p = parties();
    let mut raw = payment(&p, 100, 1, 1);
    raw.local_sequence_number = None;

    match operator().sign_commitment(&raw, 1) {
        Err(ProtocolError::MalformedPayment(field)) => assert_eq!(field, "localSequenceNumber"),
        other => panic!("expected MalformedPayment, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// 2. Commitment signing
// ---------------------------------------------------------------------------

#[test]
fn commitment_recovers_to_operator() {
    let p = parties();
    let signer = operator();
    let commitment = signer.sign_commitment(&payment(&p, 5, 1, 3), 3).unwrap();

    assert_eq!(commitment.stage_hash, stage_hash(3));
    assert!(verify_commitment(&commitment, &signer.signer_address()).is_ok());

    let stranger = IfcKeypair::generate().address();
    assert!(matches!(
        verify_commitment(&commitment, &stranger),
        Err(ProtocolError::SignatureMismatch { .. })
    ));
}

#[test]
fn commitment_survives_the_wire() {
    let p = parties();
    let signer = operator();
    let commitment = signer.sign_commitment(&payment(&p, 5, 1, 3), 3).unwrap();

    let json = serde_json::to_string(&commitment).unwrap();
    let back: SignedPaymentCommitment = serde_json::from_str(&json).unwrap();
    assert_eq!(back, commitment);
    assert!(verify_commitment(&back, &signer.signer_address()).is_ok());
}

#[test]
fn misconfigured_signer_address_is_fatal() {
    let p = parties();
    let wrong = IfcKeypair::generate().address();
    let signer = PaymentSigner::new(Credential::with_signer_address(IfcKeypair::generate(), wrong));

    assert!(matches!(
        signer.sign_commitment(&payment(&p, 5, 1, 3), 3),
        Err(ProtocolError::SignatureMismatch { .. })
    ));
}

// ---------------------------------------------------------------------------
// 3. Slice verification over a four-leaf stage
// ---------------------------------------------------------------------------

#[test]
fn four_leaf_slice_for_second_payment() {
    let h: Vec<H256> = (0..4u8).map(|i| keccak256(&[i])).collect();
    let root = merkle_parent(&merkle_parent(&h[0], &h[1]), &merkle_parent(&h[2], &h[3]));

    let proof = ExonerationProof {
        stage_height: 1,
        payment_hash: h[1],
        tree_node_index: 1,
        slice: vec![h[0], merkle_parent(&h[2], &h[3])],
        colliding_payment_hashes: vec![h[1]],
    };
    let verifier = ifc_protocol::stage::ExonerationVerifier::new();
    assert!(verifier.verify(1, &h[1], &proof, &root).is_ok());

    let mut tampered = proof.clone();
    tampered.slice[0] = keccak256(b"h0'");
    assert!(matches!(
        verifier.verify(1, &h[1], &tampered, &root),
        Err(ProtocolError::SliceMismatch(_))
    ));
}

// ---------------------------------------------------------------------------
// 4. Light transactions
// ---------------------------------------------------------------------------

#[test]
fn withdrawal_derivation() {
    let keypair = IfcKeypair::generate();
    let client = keypair.address();
    let factory = LightTransactionFactory::new(Credential::new(keypair));

    let tx = factory
        .finalize(
            LightTxType::Withdrawal,
            LightTxInput {
                value: 50,
                ..Default::default()
            },
            None,
        )
        .unwrap();
    let data = &tx.light_tx_data;

    assert_eq!(data.from, Party::Account(client));
    assert_eq!(data.to, Party::Null);
    let preimage = format!(
        "{}{}",
        hex::encode(client.normalized()),
        hex::encode(data.nonce)
    );
    assert_eq!(preimage.len(), 128);
    assert_eq!(data.log_id, keccak256(preimage.as_bytes()));
    assert_eq!(tx.verify().unwrap(), client);

    let json = serde_json::to_value(&tx).unwrap();
    assert_eq!(json["type"], "withdrawal");
    assert_eq!(json["lightTxData"]["to"], "0");
}

#[test]
fn remittance_nonces_are_fresh() {
    let factory = LightTransactionFactory::new(Credential::new(IfcKeypair::generate()));
    let input = LightTxInput {
        value: 1,
        from: Some(Party::Account(Address::from_bytes([1; 20]))),
        to: Some(Party::Account(Address::from_bytes([2; 20]))),
        ..Default::default()
    };
    let a = factory.prepare(LightTxType::Remittance, input.clone()).unwrap();
    let b = factory.prepare(LightTxType::Remittance, input).unwrap();
    assert_ne!(a.nonce, b.nonce);
    assert_eq!(a.log_id, [0u8; 32]);
}

#[test]
fn unknown_type_name_rejected() {
    let factory = LightTransactionFactory::new(Credential::new(IfcKeypair::generate()));
    assert!(matches!(
        factory.finalize_named("airdrop", LightTxInput::default(), None),
        Err(ProtocolError::InvalidType(_))
    ));
}

#[tokio::test]
async fn deposit_event_flows_to_booster() {
    let booster = InMemoryBooster::new(Address::from_bytes([0xcc; 20]));
    let factory = LightTransactionFactory::new(Credential::new(IfcKeypair::generate()));

    let (tx, rx) = oneshot::channel();
    let pending = tokio::spawn({
        let factory = factory.clone();
        async move { factory.propose_deposit(None, rx).await }
    });
    tx.send(DepositLog::new(keccak256(b"log-1"), 1_000)).unwrap();

    let deposit = pending.await.unwrap().unwrap();
    assert_eq!(deposit.tx_type, LightTxType::Deposit);
    assert_eq!(deposit.light_tx_data.from, Party::Null);
    assert_eq!(deposit.light_tx_data.log_id, keccak256(b"log-1"));

    booster.send_light_tx(&deposit).await.unwrap();
    assert_eq!(booster.light_txs.lock().len(), 1);
}

// ---------------------------------------------------------------------------
// 5. Full stage lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn full_stage_lifecycle() {
    let contract = Address::from_bytes([0xcc; 20]);
    let booster = Arc::new(InMemoryBooster::new(contract));
    let chain = Arc::new(RecordingChain::default());
    let lifecycle = StageLifecycle::new(booster.clone(), chain.clone(), StageTimings::default());

    // Sign four payments into stage 1 and forward them.
    let signer = operator();
    let p = parties();
    let commitments: Vec<SignedPaymentCommitment> = (0..4)
        .map(|i| signer.sign_commitment(&payment(&p, 10 + i, i, 1), 1).unwrap())
        .collect();
    lifecycle.send_payments(&commitments).await.unwrap();

    // Booster builds the tree; operator commits its root.
    let root = booster.seal_stage(1);
    let handle = lifecycle.commit(1).await.unwrap();
    assert_eq!(handle.method, "addNewStage");
    booster.confirm_commit(1);

    let record = lifecycle.stage_record(1).unwrap();
    assert_eq!(record.state, StageState::Committed);
    assert_eq!(record.root_hash.as_deref(), Some(hex::encode(root).as_str()));

    // A client disputes with its slice.
    let disputed = commitments[2].payment_hash;
    lifecycle.exonerate(1, &disputed).await.unwrap();
    let record = lifecycle.stage_record(1).unwrap();
    assert_eq!(record.state, StageState::Exonerated);
    assert_eq!(record.exonerated_payments, vec![disputed]);

    // Every call went to the booster-advertised contract.
    assert!(chain.calls.lock().iter().all(|(to, _)| *to == contract));
    assert_eq!(chain.methods(), vec!["addNewStage", "exonerate"]);

    match &chain.calls.lock()[1].1 {
        ContractCall::Exonerate {
            stage_hash: sh,
            payment_hash,
            tree_node_index,
            slice,
            ..
        } => {
            assert_eq!(*sh, stage_hash(1));
            assert_eq!(*payment_hash, disputed);
            assert_eq!(*tree_node_index, 2);
            assert_eq!(slice.len(), 2);
        }
        other => panic!("unexpected call {other:?}"),
    };
}

#[tokio::test]
async fn undisputed_stage_finalizes() {
    let booster = Arc::new(InMemoryBooster::new(Address::from_bytes([0xcc; 20])));
    let chain = Arc::new(RecordingChain::default());
    let lifecycle = StageLifecycle::new(booster.clone(), chain.clone(), StageTimings::default());

    let signer = operator();
    let p = parties();
    let commitment = signer.sign_commitment(&payment(&p, 1, 1, 2), 2).unwrap();
    lifecycle.send_payments(&[commitment]).await.unwrap();
    booster.seal_stage(2);

    lifecycle.commit(2).await.unwrap();
    lifecycle.finalize(2).await.unwrap();

    assert_eq!(lifecycle.stage_record(2).unwrap().state, StageState::Finalized);
    assert_eq!(chain.methods(), vec!["addNewStage", "finalize"]);
}

#[tokio::test]
async fn rebutted_dispute_stage_still_finalizes() {
    let booster = Arc::new(InMemoryBooster::new(Address::from_bytes([0xcc; 20])));
    let chain = Arc::new(RecordingChain::default());
    let lifecycle = StageLifecycle::new(booster.clone(), chain.clone(), StageTimings::default());

    let signer = operator();
    let p = parties();
    let commitments: Vec<_> = (0..2)
        .map(|i| signer.sign_commitment(&payment(&p, 5, i, 6), 6).unwrap())
        .collect();
    lifecycle.send_payments(&commitments).await.unwrap();
    booster.seal_stage(6);
    lifecycle.commit(6).await.unwrap();
    booster.confirm_commit(6);

    let disputed = commitments[0].payment_hash;
    lifecycle.exonerate(6, &disputed).await.unwrap();
    lifecycle.finalize(6).await.unwrap();

    let record = lifecycle.stage_record(6).unwrap();
    assert_eq!(record.state, StageState::Finalized);
    assert_eq!(record.exonerated_payments, vec![disputed]);
    assert_eq!(record.last_tx.unwrap().method, "finalize");
    assert_eq!(chain.methods(), vec!["addNewStage", "exonerate", "finalize"]);
}

#[tokio::test]
async fn forged_slice_never_reaches_chain() {
    let booster = Arc::new(InMemoryBooster::new(Address::from_bytes([0xcc; 20])));
    let chain = Arc::new(RecordingChain::default());
    let lifecycle = StageLifecycle::new(booster.clone(), chain.clone(), StageTimings::default());

    let signer = operator();
    let p = parties();
    let commitments: Vec<_> = (0..2)
        .map(|i| signer.sign_commitment(&payment(&p, 1, i, 3), 3).unwrap())
        .collect();
    lifecycle.send_payments(&commitments).await.unwrap();
    booster.seal_stage(3);
    lifecycle.commit(3).await.unwrap();
    booster.confirm_commit(3);

    let forged = ExonerationProof {
        stage_height: 3,
        payment_hash: keccak256(b"never paid"),
        tree_node_index: 0,
        slice: vec![commitments[1].payment_hash],
        colliding_payment_hashes: vec![],
    };
    let err = lifecycle
        .exonerate_with_proof(3, &forged.payment_hash, &forged)
        .await
        .unwrap_err();
    assert!(matches!(err, ProtocolError::SliceMismatch(_)));
    assert_eq!(chain.methods(), vec!["addNewStage"]);
    assert_eq!(lifecycle.stage_record(3).unwrap().state, StageState::Committed);
}

#[tokio::test]
async fn penalty_after_commit() {
    let booster = Arc::new(InMemoryBooster::new(Address::from_bytes([0xcc; 20])));
    let chain = Arc::new(RecordingChain::default());
    let lifecycle = StageLifecycle::new(booster.clone(), chain.clone(), StageTimings::default());

    let signer = operator();
    let p = parties();
    let commitment = signer.sign_commitment(&payment(&p, 1, 1, 4), 4).unwrap();
    lifecycle.send_payments(&[commitment.clone()]).await.unwrap();
    booster.seal_stage(4);
    lifecycle.commit(4).await.unwrap();

    lifecycle
        .pay_penalty(4, vec![commitment.payment_hash])
        .await
        .unwrap();
    assert_eq!(lifecycle.stage_record(4).unwrap().state, StageState::Penalized);

    // The local view refuses to move out of a terminal state, but the
    // request itself still goes out: the contract decides.
    lifecycle.finalize(4).await.unwrap();
    assert_eq!(lifecycle.stage_record(4).unwrap().state, StageState::Penalized);
    assert_eq!(chain.methods(), vec!["addNewStage", "payPenalty", "finalize"]);
}

#[tokio::test]
async fn concurrent_stages_tracked_independently() {
    let booster = Arc::new(InMemoryBooster::new(Address::from_bytes([0xcc; 20])));
    let chain = Arc::new(RecordingChain::default());
    let lifecycle = Arc::new(StageLifecycle::new(
        booster.clone(),
        chain.clone(),
        StageTimings::default(),
    ));

    let finals = futures::future::join_all((1..=8u64).map(|h| {
        let lifecycle = lifecycle.clone();
        async move { lifecycle.finalize(h).await }
    }))
    .await;

    assert!(finals.iter().all(|r| r.is_ok()));
    let records = lifecycle.stage_records();
    assert_eq!(records.len(), 8);
    assert!(records.iter().all(|r| r.state == StageState::Finalized));
    assert_eq!(chain.methods().len(), 8);
}
