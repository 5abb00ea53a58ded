//! Signature-slot registry.
//!
//! Every signer of a transaction owns one slot. A slot pairs the signer's
//! identity with the signature placed for it, so identities and signatures
//! can never drift apart in length. Slot indices are what References and the
//! Witness store on the wire.

use crate::error::{CoreError, Result};
use crate::signature::Signature;
use crate::types::Identifier;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignatureSlot {
    owner: Option<Identifier>,
    signature: Signature,
}

impl SignatureSlot {
    /// The identity this slot belongs to.
    ///
    /// `None` for slots decoded from the wire whose owner is only named by a
    /// Reference (References carry slot indices, not identities).
    pub fn owner(&self) -> Option<&Identifier> {
        self.owner.as_ref()
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignatureSlots {
    id_length: usize,
    slots: Vec<SignatureSlot>,
}

impl SignatureSlots {
    pub(crate) fn new(id_length: usize) -> Self {
        Self {
            id_length,
            slots: Vec::new(),
        }
    }

    pub(crate) fn from_signatures(id_length: usize, signatures: Vec<Signature>) -> Self {
        Self {
            id_length,
            slots: signatures
                .into_iter()
                .map(|signature| SignatureSlot {
                    owner: None,
                    signature,
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SignatureSlot> {
        self.slots.iter()
    }

    pub fn get(&self, index: usize) -> Option<&SignatureSlot> {
        self.slots.get(index)
    }

    /// Slot index owned by `user_id`, compared by content after fitting to
    /// the id length.
    pub fn position(&self, user_id: &[u8]) -> Option<u16> {
        let user_id = Identifier::fit(user_id, self.id_length);
        self.slots
            .iter()
            .position(|slot| slot.owner.as_ref() == Some(&user_id))
            .and_then(|i| u16::try_from(i).ok())
    }

    /// Look up the slot owned by `user_id`, creating an empty one if absent.
    pub fn get_or_create(&mut self, user_id: &[u8]) -> Result<u16> {
        if let Some(index) = self.position(user_id) {
            return Ok(index);
        }
        if self.slots.len() >= u16::MAX as usize {
            return Err(CoreError::InvariantViolation(format!(
                "signature slot limit of {} reached",
                u16::MAX
            )));
        }
        let index = self.slots.len() as u16;
        self.slots.push(SignatureSlot {
            owner: Some(Identifier::fit(user_id, self.id_length)),
            signature: Signature::empty(),
        });
        Ok(index)
    }

    /// Place `signature` in the slot owned by `user_id`, creating it if needed.
    pub fn add_signature(&mut self, user_id: &[u8], signature: Signature) -> Result<u16> {
        let index = self.get_or_create(user_id)?;
        self.slots[index as usize].signature = signature;
        Ok(index)
    }

    /// Place `signature` in slot `index` regardless of its owner.
    pub fn set_signature(&mut self, index: usize, signature: Signature) -> Result<()> {
        let len = self.slots.len();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(CoreError::IndexOutOfRange {
                what: "signature slot",
                index,
                len,
            })?;
        slot.signature = signature;
        Ok(())
    }

    /// Grow to `len` slots with empty, ownerless entries.
    pub(crate) fn pad_to(&mut self, len: usize) {
        if self.slots.len() < len {
            self.slots.resize_with(len, SignatureSlot::default);
        }
    }

    /// Record `owner` for slot `index` unless it already has one.
    pub(crate) fn claim(&mut self, index: usize, owner: &Identifier) {
        if let Some(slot) = self.slots.get_mut(index) {
            if slot.owner.is_none() {
                slot.owner = Some(owner.clone());
            }
        }
    }

    pub(crate) fn set_id_length(&mut self, id_length: usize) {
        if self.id_length == id_length {
            return;
        }
        self.id_length = id_length;
        for owner in self.slots.iter_mut().filter_map(|s| s.owner.as_mut()) {
            owner.refit(id_length);
        }
    }
}

impl<'a> IntoIterator for &'a SignatureSlots {
    type Item = &'a SignatureSlot;
    type IntoIter = std::slice::Iter<'a, SignatureSlot>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyType;

    fn sig(byte: u8) -> Signature {
        Signature::new(KeyType::ED25519, vec![byte; 32], vec![byte; 64])
    }

    #[test]
    fn test_get_or_create_reuses_slot() {
        let mut slots = SignatureSlots::new(32);
        assert_eq!(slots.get_or_create(b"alice").unwrap(), 0);
        assert_eq!(slots.get_or_create(b"bob").unwrap(), 1);
        assert_eq!(slots.get_or_create(b"alice").unwrap(), 0);
        assert_eq!(slots.len(), 2);
        assert!(!slots.get(1).unwrap().signature().is_initialized());
    }

    #[test]
    fn test_comparison_is_by_content() {
        let mut slots = SignatureSlots::new(4);
        slots.get_or_create(b"alice").unwrap();
        // Both fit to "alic".
        assert_eq!(slots.position(b"alicia"), Some(0));
    }

    #[test]
    fn test_add_signature_overwrites_owned_slot() {
        let mut slots = SignatureSlots::new(8);
        slots.get_or_create(b"alice").unwrap();
        slots.add_signature(b"bob", sig(1)).unwrap();
        slots.add_signature(b"alice", sig(2)).unwrap();
        slots.add_signature(b"bob", sig(3)).unwrap();

        assert_eq!(slots.len(), 2);
        assert_eq!(slots.get(0).unwrap().signature(), &sig(2));
        assert_eq!(slots.get(1).unwrap().signature(), &sig(3));
    }

    #[test]
    fn test_set_signature_out_of_range() {
        let mut slots = SignatureSlots::new(8);
        assert!(matches!(
            slots.set_signature(0, sig(1)),
            Err(CoreError::IndexOutOfRange { index: 0, len: 0, .. })
        ));
    }

    #[test]
    fn test_pad_and_claim() {
        let mut slots = SignatureSlots::from_signatures(4, vec![sig(1)]);
        slots.pad_to(3);
        assert_eq!(slots.len(), 3);
        let owner = Identifier::fit(b"user", 4);
        slots.claim(2, &owner);
        slots.claim(2, &Identifier::fit(b"else", 4));
        assert_eq!(slots.get(2).unwrap().owner(), Some(&owner));
        assert_eq!(slots.position(b"user"), Some(2));
    }
}
