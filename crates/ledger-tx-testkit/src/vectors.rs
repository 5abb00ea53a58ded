//! Golden test vectors.
//!
//! Two kinds of vectors live here:
//!
//! - [`InteropVector`]: envelopes produced by an independent implementation
//!   of the wire format. Decoding them must yield the recorded ids and
//!   re-packing must reproduce the payload byte for byte.
//! - [`GoldenVector`]: transactions built deterministically by this crate.
//!   They pin the packed bytes so that an accidental format change shows up
//!   as a diff.

use ledger_tx::{Format, Serializer};
use ledger_tx_core::{
    Asset, BodyValue, CrossRef, Event, Keypair, Pointer, Relation, Result, Transaction, Witness,
};
use serde::{Deserialize, Serialize};

/// An envelope produced elsewhere, with the ids it must decode to.
#[derive(Debug, Clone, Copy)]
pub struct InteropVector {
    pub name: &'static str,
    pub envelope_hex: &'static str,
    pub expected_txid: &'static str,
    pub expected_relation_group: &'static str,
    pub expected_timestamp: i64,
}

/// One Relation carrying the string body `"transferred"`, one witness at
/// slot 0, and one ECDSA P-256 signature.
pub const INTEROP_PLAIN: InteropVector = InteropVector {
    name: "interop_plain",
    envelope_hex: "000001000000cbeefc5b000000002000000000000100a100000020009cfa77b06efc3528c051f42d47a84e71d0f75056ae4542146b3f73c18169c9d000007900000020007a7374f7d35f5eb37a42b4551c0d98268988bdfd3084bccbdfd65c587c596d4620001e5f3cf4588e64234d88fed3e87f0fff3580c03a1dab2f55d42ec004c04cb1692000fc982c9463a8e29ffd46331fae974cb43d8f76822c3e9b92f230ad95138061e70000000000000b007472616e73666572726564010026000000010020001e5f3cf4588e64234d88fed3e87f0fff3580c03a1dab2f55d42ec004c04cb1690000000001008d0000000200000008020000042159bcbd47bcb8cb8183f6a07b06d212e3f21807d534278d7b7dbb1b93f1f0b5b956a80a0032cb411712d8bbd3beefe1a71c52866681676c30be7e6f7c556b1b000200002d426b1c5cca56e47eef0162604e00203bc4b21a544c4ce35ec67a3aee81d798f6201be300fe4a10aea61b625a07020a19e9bfa786c0aaf560c950b8e0bcec13",
    expected_txid: "6d187c7ff825e46d4c0f258d08264a070f0909314c854671a15d8dbf6c983f19",
    expected_relation_group: "9cfa77b06efc3528c051f42d47a84e71d0f75056ae4542146b3f73c18169c9d0",
    expected_timestamp: 1_543_302_859,
};

/// The same transaction inside a zlib envelope.
pub const INTEROP_ZLIB: InteropVector = InteropVector {
    name: "interop_zlib",
    envelope_hex: "1000789c6364606038fdee4f3490625000110c8c0c0bc1ec39bfca37e4fd31d53810f845d77d855fe185ef0161eb5c9d44b2ed8b0f36669ebcc0c050095657555cf2fd727cdce62aa72da132bc33d43a3bf6fe3568d973fafeb598889ac85c370506b9789b2f117d29cabe1dff2ebfa8e7ff6fda70c04a76b57ee815bd032c077c36662a30fc99a1332579c5a3f97fdd8ce5d74df7d962db5fd6a463377bd22783b553851b129f831dc6c0cd50529498579c965a54949ac2c8a006762c61e3219eea05924c40cc0124581423f7ec75dfb3e37463f3b705d56c97841e7f9260bf6aa2de5b5dbb5b7af2c70f5b7786ade062303aed282e7463f7e57def1f2e97096a4b6b4ccf31d857975f139a2d0d3249d7295b26e654d893baf78c49097e0c0ad647364985f8f83c8e3b5665f5aef1fa8c6f0ad28f19fe7909ac5b269d14c5cec425f972fff2b603abbe269c0cd8f160cf1b61008dcf976f",
    expected_txid: "6d187c7ff825e46d4c0f258d08264a070f0909314c854671a15d8dbf6c983f19",
    expected_relation_group: "9cfa77b06efc3528c051f42d47a84e71d0f75056ae4542146b3f73c18169c9d0",
    expected_timestamp: 1_543_302_859,
};

pub fn interop_vectors() -> Vec<InteropVector> {
    vec![INTEROP_PLAIN, INTEROP_ZLIB]
}

/// A deterministic transaction with its expected encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldenVector {
    pub name: String,
    pub description: String,
    pub id_length: usize,
    /// Hex transaction id.
    pub txid: String,
    /// Hex `Transaction::pack()` output.
    pub packed: String,
    /// Hex plain envelope.
    pub envelope: String,
}

impl GoldenVector {
    fn capture(name: &str, description: &str, tx: &mut Transaction) -> Result<Self> {
        let packed = tx.pack()?;
        let envelope = Serializer::default()
            .encode_envelope(&packed, Format::Plain)
            .map_err(|e| ledger_tx_core::CoreError::Encoding(e.to_string()))?;
        let txid = tx
            .transaction_id()
            .map(|id| id.to_hex())
            .unwrap_or_default();
        Ok(Self {
            name: name.to_string(),
            description: description.to_string(),
            id_length: tx.id_length(),
            txid,
            packed: hex::encode(packed),
            envelope: hex::encode(envelope),
        })
    }

    /// Decode the packed bytes and check them against the recorded id.
    pub fn verify(&self) -> Result<Transaction> {
        let bytes = hex::decode(&self.packed)
            .map_err(|e| ledger_tx_core::CoreError::MalformedInput(e.to_string()))?;
        let mut tx = Transaction::unpack(&bytes)?;
        let expected = hex::decode(&self.txid)
            .map_err(|e| ledger_tx_core::CoreError::MalformedInput(e.to_string()))?;
        tx.check_id(&expected)?;
        tx.verify_all()?;
        Ok(tx)
    }
}

const TIMESTAMP: i64 = 1_700_000_000_000;

fn signer() -> Keypair {
    Keypair::from_seed(&[0x42; 32])
}

fn asset(id_length: usize, owner: &[u8], body: &str) -> Result<Asset> {
    let mut asset = Asset::new(id_length);
    asset.set_owner(owner);
    asset.set_nonce(vec![0x01; id_length]);
    asset.set_body_string(body)?;
    Ok(asset)
}

/// Generate all golden vectors.
pub fn all_vectors() -> Result<Vec<GoldenVector>> {
    Ok(vec![
        generate_empty_transaction()?,
        generate_single_event()?,
        generate_relation_with_pointer()?,
        generate_structured_body()?,
        generate_cross_ref()?,
        generate_short_ids()?,
    ])
}

pub fn generate_empty_transaction() -> Result<GoldenVector> {
    let mut tx = Transaction::new(32);
    tx.set_timestamp(TIMESTAMP);
    GoldenVector::capture("empty", "No entities, no signatures", &mut tx)
}

pub fn generate_single_event() -> Result<GoldenVector> {
    let mut event = Event::new(32);
    event.attach(b"group", asset(32, b"alice", "hello")?);
    event.add_mandatory_approver(b"alice");

    let mut tx = Transaction::new(32);
    tx.set_timestamp(TIMESTAMP);
    tx.add_event(event);
    tx.set_witness(Witness::new(32)).add_witness(b"alice")?;
    let signature = tx.sign(&signer())?;
    tx.add_signature(b"alice", signature)?;

    GoldenVector::capture(
        "single_event",
        "One Event, one witness, one Ed25519 signature",
        &mut tx,
    )
}

pub fn generate_relation_with_pointer() -> Result<GoldenVector> {
    let mut pointer = Pointer::new(32);
    pointer.attach(&[0xaa; 32], Some(&[0xbb; 32]));
    let mut bare = Pointer::new(32);
    bare.attach(&[0xcc; 32], None);

    let mut relation = Relation::new(32);
    relation.attach(b"group", asset(32, b"alice", "linked")?);
    relation.add_pointer(pointer);
    relation.add_pointer(bare);

    let mut tx = Transaction::new(32);
    tx.set_timestamp(TIMESTAMP);
    tx.add_relation(relation);

    GoldenVector::capture(
        "relation_with_pointer",
        "One Relation with a full Pointer and an asset-less Pointer",
        &mut tx,
    )
}

pub fn generate_structured_body() -> Result<GoldenVector> {
    let body = BodyValue::Map(vec![
        (BodyValue::from("kind"), BodyValue::from("transfer")),
        (BodyValue::from("amount"), BodyValue::from(100i64)),
    ]);
    let mut asset = asset(32, b"alice", "")?;
    asset.set_body_structured(&body)?;

    let mut relation = Relation::new(32);
    relation.attach(b"group", asset);

    let mut tx = Transaction::new(32);
    tx.set_timestamp(TIMESTAMP);
    tx.add_relation(relation);

    GoldenVector::capture(
        "structured_body",
        "Relation whose asset body is a MessagePack map",
        &mut tx,
    )
}

pub fn generate_cross_ref() -> Result<GoldenVector> {
    let mut cross_ref = CrossRef::new();
    cross_ref.attach(&[0x11; 32], &[0x22; 32]);

    let mut relation = Relation::new(32);
    relation.attach(b"group", asset(32, b"alice", "anchored")?);

    let mut tx = Transaction::new(32);
    tx.set_timestamp(TIMESTAMP);
    tx.add_relation(relation);
    tx.set_cross_ref(cross_ref);

    GoldenVector::capture(
        "cross_ref",
        "Relation plus a CrossRef, which only enters the second digest step",
        &mut tx,
    )
}

pub fn generate_short_ids() -> Result<GoldenVector> {
    let mut event = Event::new(8);
    event.attach(b"group", asset(8, b"alice", "short")?);

    let mut tx = Transaction::new(8);
    tx.set_timestamp(TIMESTAMP);
    tx.add_event(event);
    tx.set_witness(Witness::new(8)).add_witness(b"alice")?;
    let signature = tx.sign(&signer())?;
    tx.add_signature(b"alice", signature)?;

    GoldenVector::capture("short_ids", "Id length 8 throughout", &mut tx)
}

/// Verify that every golden vector decodes to its recorded id.
pub fn verify_all_vectors() -> Result<()> {
    for vector in all_vectors()? {
        vector.verify()?;
    }
    Ok(())
}

/// Render all golden vectors as pretty JSON.
pub fn vectors_json() -> Result<String> {
    let vectors = all_vectors()?;
    serde_json::to_string_pretty(&vectors)
        .map_err(|e| ledger_tx_core::CoreError::Encoding(e.to_string()))
}
