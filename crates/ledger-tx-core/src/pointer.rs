//! Pointer: a `(transaction_id, asset_id?)` link used inside a Relation.
//!
//! Wire layout: `LP(transaction_id) u16 has_asset [LP(asset_id)]`.

use std::fmt;

use crate::error::Result;
use crate::types::Identifier;
use crate::wire::{Reader, Writer};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pointer {
    id_length: usize,
    transaction_id: Identifier,
    /// `None` points at the whole transaction rather than one output.
    asset_id: Option<Identifier>,
}

impl Pointer {
    pub fn new(id_length: usize) -> Self {
        Self {
            id_length,
            transaction_id: Identifier::fit(&[], id_length),
            asset_id: None,
        }
    }

    pub fn attach(&mut self, transaction_id: &[u8], asset_id: Option<&[u8]>) {
        self.transaction_id = Identifier::fit(transaction_id, self.id_length);
        self.asset_id = asset_id.map(|id| Identifier::fit(id, self.id_length));
    }

    pub fn id_length(&self) -> usize {
        self.id_length
    }

    pub fn transaction_id(&self) -> &Identifier {
        &self.transaction_id
    }

    pub fn asset_id(&self) -> Option<&Identifier> {
        self.asset_id.as_ref()
    }

    pub(crate) fn set_id_length(&mut self, id_length: usize) {
        if self.id_length == id_length {
            return;
        }
        self.id_length = id_length;
        self.transaction_id.refit(id_length);
        if let Some(id) = &mut self.asset_id {
            id.refit(id_length);
        }
    }

    pub fn pack(&self) -> Result<Vec<u8>> {
        let mut w = Writer::new();
        w.put_length_prefixed(self.transaction_id.as_bytes())?;
        match &self.asset_id {
            Some(id) => {
                w.put_u16(1);
                w.put_length_prefixed(id.as_bytes())?;
            }
            None => w.put_u16(0),
        }
        Ok(w.into_bytes())
    }

    pub fn unpack(bytes: &[u8], id_length: usize) -> Result<Self> {
        let mut r = Reader::new(bytes);
        let transaction_id = Identifier::from(r.get_length_prefixed()?);
        let asset_id = if r.get_flag("pointer asset")? {
            Some(Identifier::from(r.get_length_prefixed()?))
        } else {
            None
        };
        r.finish("pointer")?;
        Ok(Self {
            id_length,
            transaction_id,
            asset_id,
        })
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "     transaction_id: {}", self.transaction_id)?;
        match &self.asset_id {
            Some(id) => writeln!(f, "     asset_id: {id}"),
            None => writeln!(f, "     asset_id: None"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_asset_id() {
        let mut ptr = Pointer::new(32);
        ptr.attach(&[1; 32], Some(&[2; 32]));
        let packed = ptr.pack().unwrap();
        assert_eq!(packed.len(), 2 + 32 + 2 + 2 + 32);
        assert_eq!(Pointer::unpack(&packed, 32).unwrap(), ptr);
    }

    #[test]
    fn test_without_asset_id() {
        let mut ptr = Pointer::new(8);
        ptr.attach(&[1; 32], None);
        let packed = ptr.pack().unwrap();
        assert_eq!(&packed[packed.len() - 2..], &[0, 0]);
        let decoded = Pointer::unpack(&packed, 8).unwrap();
        assert!(decoded.asset_id().is_none());
        assert_eq!(decoded.transaction_id().len(), 8);
    }

    #[test]
    fn test_bad_presence_flag() {
        let mut ptr = Pointer::new(4);
        ptr.attach(&[1; 4], None);
        let mut packed = ptr.pack().unwrap();
        let at = packed.len() - 2;
        packed[at] = 2;
        assert!(Pointer::unpack(&packed, 4).unwrap_err().is_malformed());
    }
}
