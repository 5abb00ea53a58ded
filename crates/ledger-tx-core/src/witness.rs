//! Witness: signer identities authorized directly, outside any Event policy.
//!
//! Wire layout: `u16 n {LP(user_id) u16 sig_index}`.
//!
//! Entries are added through [`crate::WitnessMut`] so that each user gets a
//! signature slot in the owning transaction.

use std::fmt;

use crate::error::Result;
use crate::types::Identifier;
use crate::wire::{Reader, Writer};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Witness {
    id_length: usize,
    user_ids: Vec<Identifier>,
    sig_indices: Vec<u16>,
}

impl Witness {
    pub fn new(id_length: usize) -> Self {
        Self {
            id_length,
            user_ids: Vec::new(),
            sig_indices: Vec::new(),
        }
    }

    pub fn id_length(&self) -> usize {
        self.id_length
    }

    pub fn user_ids(&self) -> &[Identifier] {
        &self.user_ids
    }

    pub fn sig_indices(&self) -> &[u16] {
        &self.sig_indices
    }

    /// `(user_id, sig_index)` pairs in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&Identifier, u16)> {
        self.user_ids.iter().zip(self.sig_indices.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.user_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.user_ids.is_empty()
    }

    pub(crate) fn push(&mut self, user_id: Identifier, sig_index: u16) {
        self.user_ids.push(user_id);
        self.sig_indices.push(sig_index);
    }

    pub(crate) fn set_id_length(&mut self, id_length: usize) {
        if self.id_length == id_length {
            return;
        }
        self.id_length = id_length;
        for id in &mut self.user_ids {
            id.refit(id_length);
        }
    }

    pub fn pack(&self) -> Result<Vec<u8>> {
        let mut w = Writer::new();
        w.put_count(self.user_ids.len(), "witness users")?;
        for (user_id, sig_index) in self.entries() {
            w.put_length_prefixed(user_id.as_bytes())?;
            w.put_u16(sig_index);
        }
        Ok(w.into_bytes())
    }

    pub fn unpack(bytes: &[u8], id_length: usize) -> Result<Self> {
        let mut r = Reader::new(bytes);
        let n = r.get_u16()? as usize;
        let mut witness = Self::new(id_length);
        witness.user_ids.reserve(n);
        witness.sig_indices.reserve(n);
        for _ in 0..n {
            let user_id = Identifier::from(r.get_length_prefixed()?);
            let sig_index = r.get_u16()?;
            witness.push(user_id, sig_index);
        }
        r.finish("witness")?;
        Ok(witness)
    }
}

impl fmt::Display for Witness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Witness:")?;
        if self.is_empty() {
            return writeln!(f, "  None");
        }
        for (i, (user_id, sig_index)) in self.entries().enumerate() {
            writeln!(f, " [{i}]")?;
            writeln!(f, " user_id: {user_id}")?;
            writeln!(f, " sig_index: {sig_index}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_unpack() {
        let mut witness = Witness::new(8);
        witness.push(Identifier::fit(b"user1", 8), 0);
        witness.push(Identifier::fit(b"user2", 8), 1);

        let packed = witness.pack().unwrap();
        assert_eq!(packed.len(), 2 + 2 * (2 + 8 + 2));
        let decoded = Witness::unpack(&packed, 8).unwrap();
        assert_eq!(decoded, witness);
    }

    #[test]
    fn test_entries_stay_paired() {
        let mut witness = Witness::new(4);
        witness.push(Identifier::fit(b"a", 4), 3);
        witness.push(Identifier::fit(b"b", 4), 1);
        let pairs: Vec<u16> = witness.entries().map(|(_, idx)| idx).collect();
        assert_eq!(pairs, vec![3, 1]);
        assert_eq!(witness.user_ids().len(), witness.sig_indices().len());
    }

    #[test]
    fn test_truncated_witness_rejected() {
        let mut witness = Witness::new(4);
        witness.push(Identifier::fit(b"a", 4), 0);
        let packed = witness.pack().unwrap();
        assert!(Witness::unpack(&packed[..packed.len() - 1], 4)
            .unwrap_err()
            .is_malformed());
    }
}
