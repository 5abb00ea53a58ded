//! Transaction: the aggregate root.
//!
//! Wire layout (all integers little-endian):
//! ```text
//! u32 version
//! i64 timestamp
//! u16 id_length
//! u16 n {u32 len, Event}
//! u16 n {u32 len, Reference}
//! u16 n {u32 len, Relation}
//! u16 has_witness   [u32 len, Witness]
//! u16 has_cross_ref [u32 len, CrossRef]
//! u16 n {u32 len, Signature}
//! ```
//!
//! # Content addressing
//!
//! The id is derived in two steps:
//! 1. `base_digest = SHA256(version .. witness block)`
//! 2. `full_digest = SHA256(base_digest || cross_ref block)`
//!
//! `transaction_id` is the first `id_length` bytes of `full_digest`.
//! Signatures are not covered by the digest. A party outside the domain can
//! be handed `base_digest` plus the CrossRef and still derive the id without
//! seeing any asset.
//!
//! # Caches
//!
//! The id, both digests and the packed bytes are cached. Any structural
//! mutation clears all of them. Changing a signature clears only the packed
//! bytes.

use std::fmt;

use crate::crossref::CrossRef;
use crate::crypto::{DefaultVerifier, Sha256Hash, Signer, Verifier};
use crate::error::{CoreError, Result};
use crate::event::Event;
use crate::ident::now_millis;
use crate::reference::Reference;
use crate::relation::Relation;
use crate::signature::Signature;
use crate::slots::SignatureSlots;
use crate::types::Identifier;
use crate::witness::Witness;
use crate::wire::{Reader, Writer};
use crate::{MAX_ID_LENGTH, TRANSACTION_VERSION};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct TxDigest {
    base: Sha256Hash,
    full: Sha256Hash,
}

#[derive(Clone, Debug)]
pub struct Transaction {
    version: u32,
    timestamp: i64,
    id_length: usize,
    events: Vec<Event>,
    references: Vec<Reference>,
    relations: Vec<Relation>,
    witness: Option<Witness>,
    cross_ref: Option<CrossRef>,
    slots: SignatureSlots,
    transaction_id: Option<Identifier>,
    digest: Option<TxDigest>,
    transaction_data: Option<Vec<u8>>,
}

impl Transaction {
    /// An empty transaction stamped with the current time in milliseconds.
    pub fn new(id_length: usize) -> Self {
        Self {
            version: TRANSACTION_VERSION,
            timestamp: now_millis(),
            id_length,
            events: Vec::new(),
            references: Vec::new(),
            relations: Vec::new(),
            witness: None,
            cross_ref: None,
            slots: SignatureSlots::new(id_length),
            transaction_id: None,
            digest: None,
            transaction_data: None,
        }
    }

    /// Preallocate `event_count` empty Events, `relation_count` empty
    /// Relations and optionally an empty Witness.
    pub fn with_parts(
        event_count: usize,
        relation_count: usize,
        witness: bool,
        id_length: usize,
    ) -> Self {
        let mut tx = Self::new(id_length);
        tx.events = (0..event_count).map(|_| Event::new(id_length)).collect();
        tx.relations = (0..relation_count)
            .map(|_| Relation::new(id_length))
            .collect();
        if witness {
            tx.witness = Some(Witness::new(id_length));
        }
        tx
    }

    fn invalidate(&mut self) {
        self.transaction_id = None;
        self.digest = None;
        self.transaction_data = None;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Header
    // ─────────────────────────────────────────────────────────────────────────

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn set_version(&mut self, version: u32) {
        self.version = version;
        self.invalidate();
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn set_timestamp(&mut self, timestamp: i64) {
        self.timestamp = timestamp;
        self.invalidate();
    }

    pub fn id_length(&self) -> usize {
        self.id_length
    }

    /// Change the id length of the transaction and every owned entity.
    pub fn set_id_length(&mut self, id_length: usize) {
        if self.id_length == id_length {
            return;
        }
        self.id_length = id_length;
        self.events
            .iter_mut()
            .for_each(|e| e.set_id_length(id_length));
        self.references
            .iter_mut()
            .for_each(|r| r.set_id_length(id_length));
        self.relations
            .iter_mut()
            .for_each(|r| r.set_id_length(id_length));
        if let Some(witness) = &mut self.witness {
            witness.set_id_length(id_length);
        }
        self.slots.set_id_length(id_length);
        self.invalidate();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Entities
    // ─────────────────────────────────────────────────────────────────────────

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn witness(&self) -> Option<&Witness> {
        self.witness.as_ref()
    }

    pub fn cross_ref(&self) -> Option<&CrossRef> {
        self.cross_ref.as_ref()
    }

    /// Append an Event and return its index. The event takes this
    /// transaction's id length.
    pub fn add_event(&mut self, mut event: Event) -> usize {
        event.set_id_length(self.id_length);
        self.events.push(event);
        self.invalidate();
        self.events.len() - 1
    }

    pub fn add_relation(&mut self, mut relation: Relation) -> usize {
        relation.set_id_length(self.id_length);
        self.relations.push(relation);
        self.invalidate();
        self.relations.len() - 1
    }

    /// Append a Reference and return a handle for adding approvers.
    pub fn add_reference(&mut self, mut reference: Reference) -> ReferenceMut<'_> {
        reference.set_id_length(self.id_length);
        self.invalidate();
        self.references.push(reference);
        let index = self.references.len() - 1;
        ReferenceMut {
            reference: &mut self.references[index],
            slots: &mut self.slots,
            index,
        }
    }

    /// Install the Witness, replacing any previous one.
    pub fn set_witness(&mut self, mut witness: Witness) -> WitnessMut<'_> {
        witness.set_id_length(self.id_length);
        self.invalidate();
        WitnessMut {
            witness: self.witness.insert(witness),
            slots: &mut self.slots,
        }
    }

    pub fn set_cross_ref(&mut self, cross_ref: CrossRef) {
        self.cross_ref = Some(cross_ref);
        self.invalidate();
    }

    pub fn event_mut(&mut self, index: usize) -> Result<&mut Event> {
        self.invalidate();
        let len = self.events.len();
        self.events.get_mut(index).ok_or(CoreError::IndexOutOfRange {
            what: "event",
            index,
            len,
        })
    }

    pub fn relation_mut(&mut self, index: usize) -> Result<&mut Relation> {
        self.invalidate();
        let len = self.relations.len();
        self.relations
            .get_mut(index)
            .ok_or(CoreError::IndexOutOfRange {
                what: "relation",
                index,
                len,
            })
    }

    pub fn reference_mut(&mut self, index: usize) -> Result<ReferenceMut<'_>> {
        self.invalidate();
        let len = self.references.len();
        let reference = self
            .references
            .get_mut(index)
            .ok_or(CoreError::IndexOutOfRange {
                what: "reference",
                index,
                len,
            })?;
        Ok(ReferenceMut {
            reference,
            slots: &mut self.slots,
            index,
        })
    }

    pub fn witness_mut(&mut self) -> Result<WitnessMut<'_>> {
        self.invalidate();
        let witness = self
            .witness
            .as_mut()
            .ok_or(CoreError::NotBound("transaction has no witness"))?;
        Ok(WitnessMut {
            witness,
            slots: &mut self.slots,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Signature slots
    // ─────────────────────────────────────────────────────────────────────────

    pub fn slots(&self) -> &SignatureSlots {
        &self.slots
    }

    /// Signatures in slot order.
    pub fn signatures(&self) -> impl Iterator<Item = &Signature> + '_ {
        self.slots.iter().map(|slot| slot.signature())
    }

    /// Slot index of `user_id`, creating an empty slot if needed.
    pub fn get_or_create_slot(&mut self, user_id: &[u8]) -> Result<u16> {
        self.transaction_data = None;
        self.slots.get_or_create(user_id)
    }

    /// Place `signature` in `user_id`'s slot, creating the slot if needed.
    pub fn add_signature(&mut self, user_id: &[u8], signature: Signature) -> Result<u16> {
        self.transaction_data = None;
        self.slots.add_signature(user_id, signature)
    }

    /// Place `signature` in slot `index`. Needed for decoded slots that have
    /// no recorded owner.
    pub fn set_signature_at(&mut self, index: usize, signature: Signature) -> Result<()> {
        self.transaction_data = None;
        self.slots.set_signature(index, signature)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Digest
    // ─────────────────────────────────────────────────────────────────────────

    /// The transaction id, once digested.
    pub fn transaction_id(&self) -> Option<&Identifier> {
        self.transaction_id.as_ref()
    }

    pub fn base_digest(&self) -> Option<Sha256Hash> {
        self.digest.map(|d| d.base)
    }

    pub fn full_digest(&self) -> Option<Sha256Hash> {
        self.digest.map(|d| d.full)
    }

    /// Cached wire bytes from the last `pack` or `unpack`.
    pub fn transaction_data(&self) -> Option<&[u8]> {
        self.transaction_data.as_deref()
    }

    /// Compute (or reuse) the digest, setting `transaction_id`. Returns the
    /// full 32-byte digest.
    pub fn digest(&mut self) -> Result<Sha256Hash> {
        match self.digest {
            Some(d) => Ok(d.full),
            None => self.refresh_digest(),
        }
    }

    fn refresh_digest(&mut self) -> Result<Sha256Hash> {
        self.check_header()?;
        for event in &mut self.events {
            event.ensure_asset_id()?;
        }
        for relation in &mut self.relations {
            relation.ensure_asset_id()?;
        }

        let base = Sha256Hash::hash(&self.pack_base()?);
        let cross_ref = self.pack_cross_ref()?;
        let mut second = Vec::with_capacity(32 + cross_ref.len());
        second.extend_from_slice(base.as_bytes());
        second.extend_from_slice(&cross_ref);
        let full = Sha256Hash::hash(&second);

        self.transaction_id = Some(Identifier::truncated(full.as_bytes(), self.id_length));
        self.digest = Some(TxDigest { base, full });
        Ok(full)
    }

    fn check_header(&self) -> Result<()> {
        if self.version == 0 {
            return Err(CoreError::UnsupportedFormat(
                "transaction version 0".into(),
            ));
        }
        if self.id_length == 0 || self.id_length > MAX_ID_LENGTH {
            return Err(CoreError::InvariantViolation(format!(
                "id length must be in 1..={MAX_ID_LENGTH}, got {}",
                self.id_length
            )));
        }
        Ok(())
    }

    /// Every slot index named by a Reference or the Witness must exist.
    fn check_sig_indices(&self) -> Result<()> {
        let len = self.slots.len();
        let witnessed = self.witness.iter().flat_map(|w| w.sig_indices());
        let referenced = self.references.iter().flat_map(|r| r.sig_indices());
        match witnessed.chain(referenced).find(|&&i| i as usize >= len) {
            Some(&index) => Err(CoreError::InvariantViolation(format!(
                "signature index {index} has no slot (have {len})"
            ))),
            None => Ok(()),
        }
    }

    /// Header, Events, References, Relations and Witness: the input of the
    /// base digest.
    fn pack_base(&self) -> Result<Vec<u8>> {
        let mut w = Writer::with_capacity(256);
        w.put_u32(self.version);
        w.put_i64(self.timestamp);
        w.put_count(self.id_length, "id length")?;

        w.put_count(self.events.len(), "events")?;
        for event in &self.events {
            w.put_frame_u32(&event.pack()?)?;
        }
        w.put_count(self.references.len(), "references")?;
        for reference in &self.references {
            w.put_frame_u32(&reference.pack()?)?;
        }
        w.put_count(self.relations.len(), "relations")?;
        for relation in &self.relations {
            w.put_frame_u32(&relation.pack()?)?;
        }
        match &self.witness {
            Some(witness) => {
                w.put_u16(1);
                w.put_frame_u32(&witness.pack()?)?;
            }
            None => w.put_u16(0),
        }
        Ok(w.into_bytes())
    }

    fn pack_cross_ref(&self) -> Result<Vec<u8>> {
        let mut w = Writer::new();
        match &self.cross_ref {
            Some(cross_ref) => {
                w.put_u16(1);
                w.put_frame_u32(&cross_ref.pack()?)?;
            }
            None => w.put_u16(0),
        }
        Ok(w.into_bytes())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Wire format
    // ─────────────────────────────────────────────────────────────────────────

    /// Pack to wire bytes, digesting first if needed.
    pub fn pack(&mut self) -> Result<Vec<u8>> {
        if let Some(data) = &self.transaction_data {
            return Ok(data.clone());
        }
        self.digest()?;
        self.check_sig_indices()?;

        let mut w = Writer::with_capacity(512);
        w.put_raw(&self.pack_base()?);
        w.put_raw(&self.pack_cross_ref()?);
        w.put_count(self.slots.len(), "signatures")?;
        for slot in &self.slots {
            w.put_frame_u32(&slot.signature().pack()?)?;
        }
        let bytes = w.into_bytes();
        tracing::trace!(len = bytes.len(), signatures = self.slots.len(), "packed transaction");
        self.transaction_data = Some(bytes.clone());
        Ok(bytes)
    }

    /// Decode a transaction and re-derive its id from the received bytes.
    ///
    /// Signature slot owners are restored from the Witness. References are
    /// not bound to the events they cite.
    pub fn unpack(bytes: &[u8]) -> Result<Self> {
        let mut r = Reader::new(bytes);

        let version = r.get_u32()?;
        if version == 0 {
            return Err(CoreError::UnsupportedFormat(
                "transaction version 0".into(),
            ));
        }
        let timestamp = r.get_i64()?;
        let id_length = r.get_u16()? as usize;
        if id_length == 0 {
            return Err(CoreError::MalformedInput("id length of 0".into()));
        }

        let n = r.get_u16()?;
        let events = (0..n)
            .map(|_| Event::unpack(r.get_frame_u32()?, id_length))
            .collect::<Result<Vec<_>>>()?;
        let n = r.get_u16()?;
        let references = (0..n)
            .map(|_| Reference::unpack(r.get_frame_u32()?, id_length))
            .collect::<Result<Vec<_>>>()?;
        let n = r.get_u16()?;
        let relations = (0..n)
            .map(|_| Relation::unpack(r.get_frame_u32()?, id_length))
            .collect::<Result<Vec<_>>>()?;

        let witness = if r.get_flag("witness")? {
            Some(Witness::unpack(r.get_frame_u32()?, id_length)?)
        } else {
            None
        };
        let cross_ref = if r.get_flag("cross_ref")? {
            Some(CrossRef::unpack(r.get_frame_u32()?)?)
        } else {
            None
        };

        let n = r.get_u16()?;
        let signatures = (0..n)
            .map(|_| Signature::unpack(r.get_frame_u32()?))
            .collect::<Result<Vec<_>>>()?;
        r.finish("transaction")?;

        let mut tx = Self {
            version,
            timestamp,
            id_length,
            events,
            references,
            relations,
            witness,
            cross_ref,
            slots: SignatureSlots::from_signatures(id_length, signatures),
            transaction_id: None,
            digest: None,
            transaction_data: None,
        };
        let padded = tx.restore_slots()?;
        tx.refresh_digest()?;
        if !padded {
            tx.transaction_data = Some(bytes.to_vec());
        }
        let txid = tx
            .transaction_id
            .as_ref()
            .map(Identifier::to_hex)
            .unwrap_or_default();
        tracing::debug!(%txid, len = bytes.len(), "unpacked transaction");
        Ok(tx)
    }

    /// Pad the slot list so every referenced index exists, then record
    /// Witness users as slot owners. Returns whether padding was needed.
    /// An index past the u16 slot count cannot be packed again and is rejected.
    fn restore_slots(&mut self) -> Result<bool> {
        let witnessed = self.witness.iter().flat_map(|w| w.sig_indices());
        let referenced = self.references.iter().flat_map(|r| r.sig_indices());
        let needed = witnessed
            .chain(referenced)
            .map(|&i| i as usize + 1)
            .max()
            .unwrap_or(0);
        if needed > u16::MAX as usize {
            return Err(CoreError::MalformedInput(format!(
                "signature index {} exceeds the slot limit",
                needed - 1
            )));
        }

        let padded = needed > self.slots.len();
        if padded {
            tracing::debug!(
                received = self.slots.len(),
                needed,
                "padding signature slots named by references or witness"
            );
            self.slots.pad_to(needed);
        }

        if let Some(witness) = &self.witness {
            for (user_id, index) in witness.entries() {
                self.slots.claim(index as usize, user_id);
            }
        }
        Ok(padded)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Signing & verification
    // ─────────────────────────────────────────────────────────────────────────

    /// Sign the full 32-byte digest. The signature is returned, not placed;
    /// use [`Transaction::add_signature`] to put it in a slot.
    pub fn sign(&mut self, signer: &dyn Signer) -> Result<Signature> {
        let digest = self.digest()?;
        let signature = signer
            .sign(digest.as_bytes())
            .ok_or(CoreError::SigningFailed)?;
        Ok(Signature::new(
            signer.key_type(),
            signer.public_key(),
            signature,
        ))
    }

    /// Verify every initialized signature with the bundled verifier.
    pub fn verify_all(&mut self) -> Result<()> {
        self.verify_all_with(&DefaultVerifier)
    }

    /// Recompute the digest and verify every initialized signature against
    /// it. Fails with the index of the first bad signature.
    pub fn verify_all_with(&mut self, verifier: &dyn Verifier) -> Result<()> {
        let digest = self.refresh_digest()?;
        for (index, slot) in self.slots.iter().enumerate() {
            let signature = slot.signature();
            if !signature.is_initialized() {
                continue;
            }
            if !signature.verify_with(verifier, digest.as_bytes()) {
                tracing::warn!(
                    index,
                    key_type = %signature.key_type(),
                    "signature verification failed"
                );
                return Err(CoreError::VerificationFailed { index });
            }
        }
        Ok(())
    }

    /// Recompute the id and compare it with one the caller already trusts.
    pub fn check_id(&mut self, expected: &[u8]) -> Result<()> {
        self.refresh_digest()?;
        match &self.transaction_id {
            Some(actual) if actual == expected => Ok(()),
            actual => Err(CoreError::IdMismatch {
                expected: hex::encode(expected),
                actual: actual.as_ref().map(Identifier::to_hex).unwrap_or_default(),
            }),
        }
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "------- Dump of the transaction data ------")?;
        match &self.transaction_id {
            Some(id) => writeln!(f, "* transaction_id: {id}")?,
            None => writeln!(f, "* transaction_id: None")?,
        }
        writeln!(f, "version: {}", self.version)?;
        writeln!(f, "timestamp: {}", self.timestamp)?;
        writeln!(f, "id_length: {}", self.id_length)?;

        writeln!(f, "Event[]: {}", self.events.len())?;
        for (i, event) in self.events.iter().enumerate() {
            writeln!(f, " [{i}]")?;
            write!(f, "{event}")?;
        }
        writeln!(f, "Reference[]: {}", self.references.len())?;
        for (i, reference) in self.references.iter().enumerate() {
            writeln!(f, " [{i}]")?;
            write!(f, "{reference}")?;
        }
        writeln!(f, "Relation[]: {}", self.relations.len())?;
        for (i, relation) in self.relations.iter().enumerate() {
            writeln!(f, " [{i}]")?;
            write!(f, "{relation}")?;
        }
        match &self.witness {
            Some(witness) => write!(f, "{witness}")?,
            None => writeln!(f, "Witness: None")?,
        }
        match &self.cross_ref {
            Some(cross_ref) => write!(f, "{cross_ref}")?,
            None => writeln!(f, "Cross_Ref: None")?,
        }
        writeln!(f, "Signature[]: {}", self.slots.len())?;
        for (i, slot) in self.slots.iter().enumerate() {
            writeln!(f, " [{i}]")?;
            write!(f, "{}", slot.signature())?;
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Borrow handles
// ─────────────────────────────────────────────────────────────────────────────

/// A Reference borrowed together with its transaction's signature slots.
pub struct ReferenceMut<'a> {
    reference: &'a mut Reference,
    slots: &'a mut SignatureSlots,
    index: usize,
}

impl ReferenceMut<'_> {
    /// Position of this Reference in the transaction.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn reference(&self) -> &Reference {
        self.reference
    }

    /// Bind to an Event of an earlier, digested transaction.
    pub fn attach(
        &mut self,
        asset_group_id: &[u8],
        ref_transaction: &Transaction,
        event_index: usize,
    ) -> Result<()> {
        self.reference
            .attach(asset_group_id, ref_transaction, event_index)
    }

    /// Register `user_id` as an approver of the referenced Event and give it
    /// a signature slot. Returns the slot index.
    pub fn add_approver(&mut self, user_id: &[u8]) -> Result<u16> {
        let user_id = Identifier::fit(user_id, self.reference.id_length());
        self.reference.check_approver(&user_id)?;
        let index = self.slots.get_or_create(user_id.as_bytes())?;
        self.reference.push_sig_index(index);
        Ok(index)
    }

    pub fn add_signature(&mut self, user_id: &[u8], signature: Signature) -> Result<u16> {
        self.slots.add_signature(user_id, signature)
    }
}

/// The Witness borrowed together with its transaction's signature slots.
pub struct WitnessMut<'a> {
    witness: &'a mut Witness,
    slots: &'a mut SignatureSlots,
}

impl WitnessMut<'_> {
    pub fn witness(&self) -> &Witness {
        self.witness
    }

    /// Authorize `user_id` as a signer. Returns its slot index.
    pub fn add_witness(&mut self, user_id: &[u8]) -> Result<u16> {
        let user_id = Identifier::fit(user_id, self.witness.id_length());
        let index = self.slots.get_or_create(user_id.as_bytes())?;
        self.witness.push(user_id, index);
        Ok(index)
    }

    pub fn add_signature(&mut self, user_id: &[u8], signature: Signature) -> Result<u16> {
        self.slots.add_signature(user_id, signature)
    }
}
