//! Proptest generators for property-based testing.

use proptest::prelude::*;

use proptest::sample::Index;

use ledger_tx_core::{
    Asset, BodyValue, CrossRef, Event, Identifier, KeyType, Keypair, Pointer, Reference, Relation,
    Result, Signature, Transaction, Witness,
};

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// Generate an id length: short, default and longer than a hash.
pub fn id_length() -> impl Strategy<Value = usize> {
    prop_oneof![Just(1usize), Just(8usize), Just(32usize), Just(64usize)]
}

/// Generate raw id bytes. Deliberately not fitted to any id length.
pub fn id_bytes() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..=40)
}

/// Generate a reasonable timestamp.
pub fn timestamp() -> impl Strategy<Value = i64> {
    0i64..=i64::MAX / 2
}

/// Generate a string body.
pub fn body_text() -> impl Strategy<Value = String> {
    "[ -~]{0,64}".prop_map(String::from)
}

/// Generate a structured body. Floats are left out so values compare equal
/// after a round trip.
pub fn body_value() -> impl Strategy<Value = BodyValue> {
    let leaf = prop_oneof![
        Just(BodyValue::Null),
        any::<bool>().prop_map(BodyValue::Bool),
        any::<i64>().prop_map(BodyValue::Int),
        ((i64::MAX as u64 + 1)..=u64::MAX).prop_map(BodyValue::UInt),
        "[a-z]{0,12}".prop_map(BodyValue::String),
        prop::collection::vec(any::<u8>(), 0..16).prop_map(BodyValue::Bytes),
    ];
    leaf.prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(BodyValue::Array),
            prop::collection::vec(("[a-z]{1,8}".prop_map(BodyValue::String), inner), 0..4)
                .prop_map(BodyValue::Map),
        ]
    })
}

/// Generate a signature: empty, or with arbitrary key type and byte lengths.
pub fn signature() -> impl Strategy<Value = Signature> {
    prop_oneof![
        Just(Signature::empty()),
        (
            1u32..=4,
            prop::collection::vec(any::<u8>(), 0..80),
            prop::collection::vec(any::<u8>(), 0..80),
        )
            .prop_map(|(key_type, pubkey, sig)| Signature::new(KeyType(key_type), pubkey, sig)),
    ]
}

/// Either kind of asset body.
#[derive(Debug, Clone)]
pub enum BodyParams {
    Text(String),
    Structured(BodyValue),
}

impl Arbitrary for BodyParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        prop_oneof![
            body_text().prop_map(BodyParams::Text),
            body_value().prop_map(BodyParams::Structured),
        ]
        .boxed()
    }
}

/// Parameters for generating an asset.
#[derive(Debug, Clone)]
pub struct AssetParams {
    pub id_length: usize,
    pub user_id: Vec<u8>,
    pub nonce: Vec<u8>,
    pub file: Option<Vec<u8>>,
    pub body: BodyParams,
}

impl Arbitrary for AssetParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            id_length(),
            id_bytes(),
            prop::collection::vec(any::<u8>(), 0..=32),
            prop::option::of(prop::collection::vec(any::<u8>(), 1..64)),
            any::<BodyParams>(),
        )
            .prop_map(|(id_length, user_id, nonce, file, body)| AssetParams {
                id_length,
                user_id,
                nonce,
                file,
                body,
            })
            .boxed()
    }
}

/// Build an asset from params. Deterministic in its inputs.
pub fn asset_from_params(params: &AssetParams) -> Result<Asset> {
    let mut asset = Asset::new(params.id_length);
    asset.set_owner(&params.user_id);
    asset.set_nonce(params.nonce.clone());
    if let Some(file) = &params.file {
        asset.attach_file_digest(file)?;
    }
    match &params.body {
        BodyParams::Text(text) => asset.set_body_string(text)?,
        BodyParams::Structured(value) => asset.set_body_structured(value)?,
    }
    Ok(asset)
}

/// Parameters for a Reference to Event 0 of a generated earlier transaction.
#[derive(Debug, Clone)]
pub struct ReferenceParams {
    pub group: Vec<u8>,
    /// Approvers of the referenced Event. Even positions are mandatory,
    /// odd ones optional.
    pub approvers: Vec<Vec<u8>>,
    /// Which of `approvers` sign this Reference.
    pub chosen: Vec<Index>,
    /// Also name the chosen approvers as witnesses, so slots are shared.
    pub witnessed: bool,
}

impl ReferenceParams {
    pub fn chosen_approvers(&self) -> impl Iterator<Item = &Vec<u8>> + '_ {
        self.chosen.iter().map(|index| index.get(&self.approvers))
    }
}

impl Arbitrary for ReferenceParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            id_bytes(),
            prop::collection::vec(id_bytes(), 1..4),
            prop::collection::vec(any::<Index>(), 0..3),
            any::<bool>(),
        )
            .prop_map(|(group, approvers, chosen, witnessed)| ReferenceParams {
                group,
                approvers,
                chosen,
                witnessed,
            })
            .boxed()
    }
}

/// Build the earlier transaction a Reference points at, already digested.
pub fn referenced_transaction(
    id_length: usize,
    timestamp: i64,
    params: &ReferenceParams,
) -> Result<Transaction> {
    let mut asset = Asset::new(id_length);
    asset.set_owner(&params.group);
    asset.set_nonce(vec![0x05; id_length]);
    asset.set_body_string("referenced")?;
    let mut event = Event::new(id_length);
    event.attach(&params.group, asset);
    for (i, approver) in params.approvers.iter().enumerate() {
        if i % 2 == 0 {
            event.add_mandatory_approver(approver);
        } else {
            event.add_option_approver(approver);
        }
    }

    let mut prev = Transaction::new(id_length);
    prev.set_timestamp(timestamp);
    prev.add_event(event);
    prev.digest()?;
    Ok(prev)
}

/// Parameters for generating a transaction.
#[derive(Debug, Clone)]
pub struct TxParams {
    pub id_length: usize,
    pub timestamp: i64,
    pub events: Vec<(Vec<u8>, Vec<Vec<u8>>, String)>,
    pub references: Vec<ReferenceParams>,
    pub relations: Vec<(Vec<u8>, Vec<(Vec<u8>, Option<Vec<u8>>)>, String)>,
    pub witnesses: Vec<Vec<u8>>,
    pub cross_ref: Option<(Vec<u8>, Vec<u8>)>,
    pub signers: Vec<Keypair>,
}

impl TxParams {
    /// Every user expected to own a slot, fitted to the id length.
    pub fn slot_owners(&self) -> Vec<Identifier> {
        let mut owners: Vec<Identifier> = Vec::new();
        let approvers = self.references.iter().flat_map(|r| r.chosen_approvers());
        let witnessed = self
            .references
            .iter()
            .filter(|r| r.witnessed)
            .flat_map(|r| r.chosen_approvers());
        for user in approvers.chain(self.witnesses.iter()).chain(witnessed) {
            let user = Identifier::fit(user, self.id_length);
            if !owners.contains(&user) {
                owners.push(user);
            }
        }
        owners
    }
}

impl Arbitrary for TxParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        let event = (
            id_bytes(),
            prop::collection::vec(id_bytes(), 0..3),
            body_text(),
        );
        let pointer = (id_bytes(), prop::option::of(id_bytes()));
        let relation = (
            id_bytes(),
            prop::collection::vec(pointer, 0..3),
            body_text(),
        );
        (
            id_length(),
            timestamp(),
            prop::collection::vec(event, 0..3),
            prop::collection::vec(any::<ReferenceParams>(), 0..3),
            prop::collection::vec(relation, 0..3),
            prop::collection::vec(id_bytes(), 0..3),
            prop::option::of((id_bytes(), id_bytes())),
            prop::collection::vec(keypair(), 3),
        )
            .prop_map(
                |(
                    id_length,
                    timestamp,
                    events,
                    references,
                    relations,
                    witnesses,
                    cross_ref,
                    signers,
                )| {
                    TxParams {
                        id_length,
                        timestamp,
                        events,
                        references,
                        relations,
                        witnesses,
                        cross_ref,
                        signers,
                    }
                },
            )
            .boxed()
    }
}

/// Build and sign a transaction from params.
///
/// The owner of slot `i` signs with `signers[i % signers.len()]`. Nonces are
/// fixed, so equal params give equal transactions.
pub fn transaction_from_params(params: &TxParams) -> Result<Transaction> {
    let n = params.id_length;
    let mut tx = Transaction::new(n);
    tx.set_timestamp(params.timestamp);

    for (group, approvers, body) in &params.events {
        let mut asset = Asset::new(n);
        asset.set_owner(group);
        asset.set_nonce(vec![0x07; n]);
        asset.set_body_string(body)?;
        let mut event = Event::new(n);
        event.attach(group, asset);
        for approver in approvers {
            event.add_mandatory_approver(approver);
        }
        tx.add_event(event);
    }

    for reference_params in &params.references {
        let prev = referenced_transaction(n, params.timestamp, reference_params)?;
        let mut reference = tx.add_reference(Reference::new(n));
        reference.attach(&reference_params.group, &prev, 0)?;
        for approver in reference_params.chosen_approvers() {
            reference.add_approver(approver)?;
        }
    }

    for (group, pointers, body) in &params.relations {
        let mut asset = Asset::new(n);
        asset.set_owner(group);
        asset.set_nonce(vec![0x09; n]);
        asset.set_body_string(body)?;
        let mut relation = Relation::new(n);
        relation.attach(group, asset);
        for (txid, asset_id) in pointers {
            let mut pointer = Pointer::new(n);
            pointer.attach(txid, asset_id.as_deref());
            relation.add_pointer(pointer);
        }
        tx.add_relation(relation);
    }

    if let Some((domain_id, txid)) = &params.cross_ref {
        let mut cross_ref = CrossRef::new();
        cross_ref.attach(domain_id, txid);
        tx.set_cross_ref(cross_ref);
    }

    let witnessed_approvers = params
        .references
        .iter()
        .filter(|r| r.witnessed)
        .flat_map(|r| r.chosen_approvers());
    let witnesses: Vec<&Vec<u8>> = params.witnesses.iter().chain(witnessed_approvers).collect();
    if !witnesses.is_empty() {
        let mut witness = tx.set_witness(Witness::new(n));
        for user in witnesses {
            witness.add_witness(user)?;
        }
    }

    let owners: Vec<Identifier> = tx
        .slots()
        .iter()
        .filter_map(|slot| slot.owner().cloned())
        .collect();
    for (i, owner) in owners.iter().enumerate() {
        let signer = &params.signers[i % params.signers.len()];
        let signature = tx.sign(signer)?;
        tx.add_signature(owner.as_bytes(), signature)?;
    }

    Ok(tx)
}
