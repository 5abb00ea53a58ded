//! Reference: a UTXO-style input citing an Event of an earlier transaction.
//!
//! Wire layout:
//! ```text
//! LP(asset_group_id) LP(transaction_id) u16 event_index u16 n {u16 sig_index}
//! ```
//!
//! Approvers are added through [`crate::ReferenceMut`], which borrows the
//! owning transaction's signature-slot registry.

use std::fmt;

use crate::error::{CoreError, Result};
use crate::event::Event;
use crate::transaction::Transaction;
use crate::types::Identifier;
use crate::wire::{Reader, Writer};

/// Approver lists copied from the referenced Event.
///
/// Not packed. Keeping a copy means the referenced transaction does not have
/// to stay alive for later approver checks.
#[derive(Clone, Debug, PartialEq, Eq)]
struct ReferencedEvent {
    mandatory_approvers: Vec<Identifier>,
    option_approvers: Vec<Identifier>,
}

impl ReferencedEvent {
    fn from_event(event: &Event, id_length: usize) -> Self {
        let fit = |ids: &[Identifier]| {
            ids.iter()
                .map(|id| Identifier::fit(id.as_bytes(), id_length))
                .collect()
        };
        Self {
            mandatory_approvers: fit(event.mandatory_approvers()),
            option_approvers: fit(event.option_approvers()),
        }
    }

    fn contains(&self, user_id: &Identifier) -> bool {
        self.mandatory_approvers
            .iter()
            .chain(self.option_approvers.iter())
            .any(|approver| approver == user_id)
    }

    fn refit(&mut self, id_length: usize) {
        for id in self
            .mandatory_approvers
            .iter_mut()
            .chain(self.option_approvers.iter_mut())
        {
            id.refit(id_length);
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reference {
    id_length: usize,
    asset_group_id: Identifier,
    transaction_id: Identifier,
    event_index_in_ref: u16,
    sig_indices: Vec<u16>,
    ref_event: Option<ReferencedEvent>,
}

impl Reference {
    pub fn new(id_length: usize) -> Self {
        Self {
            id_length,
            asset_group_id: Identifier::fit(&[], id_length),
            transaction_id: Identifier::fit(&[], id_length),
            event_index_in_ref: 0,
            sig_indices: Vec::new(),
            ref_event: None,
        }
    }

    /// Bind to Event `event_index` of `ref_transaction`.
    ///
    /// The referenced transaction must already have an id (see
    /// [`Transaction::digest`]).
    pub fn attach(
        &mut self,
        asset_group_id: &[u8],
        ref_transaction: &Transaction,
        event_index: usize,
    ) -> Result<()> {
        let txid = ref_transaction
            .transaction_id()
            .ok_or(CoreError::NotBound("referenced transaction has no id"))?;
        let events = ref_transaction.events();
        let event = events.get(event_index).ok_or(CoreError::IndexOutOfRange {
            what: "event",
            index: event_index,
            len: events.len(),
        })?;
        let event_index_in_ref = u16::try_from(event_index).map_err(|_| {
            CoreError::InvariantViolation(format!("event index {event_index} exceeds u16"))
        })?;

        self.asset_group_id = Identifier::fit(asset_group_id, self.id_length);
        self.transaction_id = Identifier::fit(txid.as_bytes(), self.id_length);
        self.event_index_in_ref = event_index_in_ref;
        self.ref_event = Some(ReferencedEvent::from_event(event, self.id_length));
        Ok(())
    }

    pub fn id_length(&self) -> usize {
        self.id_length
    }

    pub fn asset_group_id(&self) -> &Identifier {
        &self.asset_group_id
    }

    pub fn transaction_id(&self) -> &Identifier {
        &self.transaction_id
    }

    pub fn event_index_in_ref(&self) -> u16 {
        self.event_index_in_ref
    }

    pub fn sig_indices(&self) -> &[u16] {
        &self.sig_indices
    }

    /// Whether the referenced Event's approver lists are available.
    pub fn is_bound(&self) -> bool {
        self.ref_event.is_some()
    }

    /// Check that `user_id` may approve the referenced Event.
    pub(crate) fn check_approver(&self, user_id: &Identifier) -> Result<()> {
        let ref_event = self
            .ref_event
            .as_ref()
            .ok_or(CoreError::NotBound("reference is not attached to an event"))?;
        if !ref_event.contains(user_id) {
            return Err(CoreError::UnauthorizedApprover);
        }
        Ok(())
    }

    pub(crate) fn push_sig_index(&mut self, index: u16) {
        self.sig_indices.push(index);
    }

    pub(crate) fn set_id_length(&mut self, id_length: usize) {
        if self.id_length == id_length {
            return;
        }
        self.id_length = id_length;
        self.asset_group_id.refit(id_length);
        self.transaction_id.refit(id_length);
        if let Some(ref_event) = &mut self.ref_event {
            ref_event.refit(id_length);
        }
    }

    pub fn pack(&self) -> Result<Vec<u8>> {
        let mut w = Writer::new();
        w.put_length_prefixed(self.asset_group_id.as_bytes())?;
        w.put_length_prefixed(self.transaction_id.as_bytes())?;
        w.put_u16(self.event_index_in_ref);
        w.put_count(self.sig_indices.len(), "reference signature indices")?;
        for &index in &self.sig_indices {
            w.put_u16(index);
        }
        Ok(w.into_bytes())
    }

    /// Decode a reference. The result is not bound to any referenced event.
    pub fn unpack(bytes: &[u8], id_length: usize) -> Result<Self> {
        let mut r = Reader::new(bytes);
        let asset_group_id = Identifier::from(r.get_length_prefixed()?);
        let transaction_id = Identifier::from(r.get_length_prefixed()?);
        let event_index_in_ref = r.get_u16()?;
        let n = r.get_u16()?;
        let sig_indices = (0..n).map(|_| r.get_u16()).collect::<Result<Vec<_>>>()?;
        r.finish("reference")?;
        Ok(Self {
            id_length,
            asset_group_id,
            transaction_id,
            event_index_in_ref,
            sig_indices,
            ref_event: None,
        })
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  asset_group_id: {}", self.asset_group_id)?;
        writeln!(f, "  transaction_id: {}", self.transaction_id)?;
        writeln!(f, "  event_index_in_ref: {}", self.event_index_in_ref)?;
        writeln!(f, "  sig_indices: {:?}", self.sig_indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::Asset;

    fn previous_transaction() -> Transaction {
        let mut asset = Asset::new(32);
        asset.set_owner(b"alice");
        asset.set_body_string("coin").unwrap();
        let mut event = Event::new(32);
        event.attach(b"group", asset);
        event.add_mandatory_approver(b"alice");
        event.add_option_approver(b"bob");

        let mut tx = Transaction::new(32);
        tx.add_event(event);
        tx.digest().unwrap();
        tx
    }

    #[test]
    fn test_attach_requires_digested_transaction() {
        let mut undigested = Transaction::new(32);
        undigested.add_event(Event::new(32));
        let mut reference = Reference::new(32);
        assert!(matches!(
            reference.attach(b"group", &undigested, 0),
            Err(CoreError::NotBound(_))
        ));
    }

    #[test]
    fn test_attach_checks_event_index() {
        let prev = previous_transaction();
        let mut reference = Reference::new(32);
        assert!(matches!(
            reference.attach(b"group", &prev, 3),
            Err(CoreError::IndexOutOfRange { index: 3, len: 1, .. })
        ));
    }

    #[test]
    fn test_attach_copies_txid_and_approvers() {
        let prev = previous_transaction();
        let mut reference = Reference::new(32);
        reference.attach(b"group", &prev, 0).unwrap();
        assert_eq!(Some(reference.transaction_id()), prev.transaction_id());
        assert!(reference.is_bound());

        let alice = Identifier::fit(b"alice", 32);
        let mallory = Identifier::fit(b"mallory", 32);
        assert!(reference.check_approver(&alice).is_ok());
        assert!(matches!(
            reference.check_approver(&mallory),
            Err(CoreError::UnauthorizedApprover)
        ));
    }

    #[test]
    fn test_unbound_reference_rejects_approvers() {
        let reference = Reference::new(32);
        assert!(matches!(
            reference.check_approver(&Identifier::fit(b"alice", 32)),
            Err(CoreError::NotBound(_))
        ));
    }

    #[test]
    fn test_pack_unpack() {
        let prev = previous_transaction();
        let mut reference = Reference::new(32);
        reference.attach(b"group", &prev, 0).unwrap();
        reference.push_sig_index(0);
        reference.push_sig_index(2);

        let packed = reference.pack().unwrap();
        let decoded = Reference::unpack(&packed, 32).unwrap();
        assert_eq!(decoded.sig_indices(), &[0, 2]);
        assert_eq!(decoded.transaction_id(), reference.transaction_id());
        assert!(!decoded.is_bound());
        assert_eq!(decoded.pack().unwrap(), packed);
    }
}
