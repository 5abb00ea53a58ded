//! Interop vectors produced by an independent implementation of the format.
//!
//! Both envelopes carry the same transaction: one Relation whose asset body
//! is `"transferred"`, a Witness naming one user at slot 0, and a single
//! ECDSA P-256 signature.

use std::cell::RefCell;

use ledger_tx::core::{BodyType, CoreError, KeyType, Verifier};
use ledger_tx::{deserialize, Format, Serializer, Transaction};
use ledger_tx_testkit::vectors::{
    all_vectors, interop_vectors, GoldenVector, INTEROP_PLAIN, INTEROP_ZLIB,
};
use serde::Serialize;

fn decode(hex_envelope: &str) -> Transaction {
    let bytes = hex::decode(hex_envelope).unwrap();
    deserialize(&bytes).unwrap()
}

#[test]
fn test_interop_txid_and_group() {
    for vector in interop_vectors() {
        let tx = decode(vector.envelope_hex);
        assert_eq!(
            tx.transaction_id().unwrap().to_hex(),
            vector.expected_txid,
            "{}",
            vector.name
        );
        assert_eq!(
            tx.relations()[0].asset_group_id().to_hex(),
            vector.expected_relation_group,
            "{}",
            vector.name
        );
    }
}

#[test]
fn test_interop_contents() {
    let tx = decode(INTEROP_PLAIN.envelope_hex);

    assert_eq!(tx.version(), 1);
    assert_eq!(tx.timestamp(), 1_543_302_859);
    assert_eq!(tx.id_length(), 32);
    assert!(tx.events().is_empty());
    assert!(tx.references().is_empty());
    assert!(tx.cross_ref().is_none());

    assert_eq!(tx.relations().len(), 1);
    let relation = &tx.relations()[0];
    assert!(relation.pointers().is_empty());
    let asset = relation.asset().unwrap();
    assert_eq!(asset.body_type(), BodyType::String);
    assert_eq!(asset.body_str(), Some("transferred"));
    assert_eq!(asset.file_size(), 0);

    let witness = tx.witness().unwrap();
    assert_eq!(witness.len(), 1);
    assert_eq!(witness.sig_indices(), &[0]);

    assert_eq!(tx.slots().len(), 1);
    let slot = tx.slots().get(0).unwrap();
    assert_eq!(slot.owner(), Some(&witness.user_ids()[0]));
    assert_eq!(slot.signature().key_type(), KeyType::ECDSA_P256V1);
    assert_eq!(slot.signature().public_key().len(), 65);
    assert_eq!(slot.signature().signature().len(), 64);
}

#[test]
fn test_zlib_and_plain_agree() {
    let plain = decode(INTEROP_PLAIN.envelope_hex);
    let zlib = decode(INTEROP_ZLIB.envelope_hex);
    assert_eq!(plain.transaction_data(), zlib.transaction_data());
    assert_eq!(plain.transaction_id(), zlib.transaction_id());
}

#[test]
fn test_repack_from_entities_is_byte_identical() {
    let envelope = hex::decode(INTEROP_PLAIN.envelope_hex).unwrap();
    let payload = &envelope[2..];

    let mut tx = Transaction::unpack(payload).unwrap();
    // Same value, but drops every cache so pack() rebuilds from the entities.
    tx.set_timestamp(tx.timestamp());
    assert!(tx.transaction_data().is_none());

    assert_eq!(tx.pack().unwrap(), payload);
    assert_eq!(
        tx.transaction_id().unwrap().to_hex(),
        INTEROP_PLAIN.expected_txid
    );
}

#[test]
fn test_reserialize_zlib_roundtrip() {
    let mut tx = decode(INTEROP_PLAIN.envelope_hex);
    let wire = Serializer::default().serialize(&mut tx, Format::Zlib).unwrap();
    let back = deserialize(&wire).unwrap();
    assert_eq!(back.transaction_id(), tx.transaction_id());
}

#[test]
fn test_default_verifier_rejects_ecdsa() {
    let mut tx = decode(INTEROP_PLAIN.envelope_hex);
    assert!(matches!(
        tx.verify_all(),
        Err(CoreError::VerificationFailed { index: 0 })
    ));
}

/// Accepts everything and records what it was asked to check.
#[derive(Default)]
struct RecordingVerifier {
    seen: RefCell<Vec<(KeyType, usize, usize)>>,
}

impl Verifier for RecordingVerifier {
    fn verify(&self, key_type: KeyType, public_key: &[u8], digest: &[u8], _: &[u8]) -> bool {
        self.seen
            .borrow_mut()
            .push((key_type, public_key.len(), digest.len()));
        true
    }
}

#[test]
fn test_caller_supplied_verifier_sees_full_digest() {
    let mut tx = decode(INTEROP_PLAIN.envelope_hex);
    let verifier = RecordingVerifier::default();
    tx.verify_all_with(&verifier).unwrap();
    assert_eq!(
        verifier.seen.borrow().as_slice(),
        &[(KeyType::ECDSA_P256V1, 65, 32)]
    );
}

#[test]
fn test_check_id_against_recorded_txid() {
    let mut tx = decode(INTEROP_ZLIB.envelope_hex);
    let expected = hex::decode(INTEROP_ZLIB.expected_txid).unwrap();
    tx.check_id(&expected).unwrap();

    let mut wrong = expected.clone();
    wrong[0] ^= 1;
    assert!(matches!(
        tx.check_id(&wrong),
        Err(CoreError::IdMismatch { .. })
    ));
}

#[test]
fn test_self_generated_vectors_verify() {
    for vector in all_vectors().unwrap() {
        let tx = vector.verify().unwrap();
        assert_eq!(tx.id_length(), vector.id_length, "{}", vector.name);

        let envelope = hex::decode(&vector.envelope).unwrap();
        let via_envelope = deserialize(&envelope).unwrap();
        assert_eq!(via_envelope.transaction_id(), tx.transaction_id());
    }
}

#[test]
fn print_golden_vectors_json() {
    #[derive(Serialize)]
    struct VectorFile {
        version: u32,
        description: String,
        vectors: Vec<GoldenVector>,
    }

    let file = VectorFile {
        version: ledger_tx::core::TRANSACTION_VERSION,
        description: "Packed transactions and their ids. Signatures are deterministic Ed25519."
            .to_string(),
        vectors: all_vectors().unwrap(),
    };

    let json = serde_json::to_string_pretty(&file).unwrap();
    println!("{}", json);
}
