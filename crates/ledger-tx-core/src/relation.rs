//! Relation: a non-UTXO link between an asset and other transactions.
//!
//! Wire layout:
//! ```text
//! LP(asset_group_id) u16 n {u16 len, Pointer} u32 asset_len [Asset]
//! ```

use std::fmt;

use crate::asset::Asset;
use crate::error::Result;
use crate::pointer::Pointer;
use crate::types::Identifier;
use crate::wire::{Reader, Writer};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Relation {
    id_length: usize,
    asset_group_id: Identifier,
    pointers: Vec<Pointer>,
    asset: Option<Asset>,
}

impl Relation {
    pub fn new(id_length: usize) -> Self {
        Self {
            id_length,
            asset_group_id: Identifier::fit(&[], id_length),
            pointers: Vec::new(),
            asset: None,
        }
    }

    /// Build a relation holding a fresh asset owned by `user_id`.
    pub fn with_asset(
        id_length: usize,
        asset_group_id: &[u8],
        user_id: &[u8],
        body: &str,
    ) -> Result<Self> {
        let mut asset = Asset::new(id_length);
        asset.set_owner(user_id);
        asset.set_body_string(body)?;
        let mut relation = Self::new(id_length);
        relation.attach(asset_group_id, asset);
        Ok(relation)
    }

    pub fn attach(&mut self, asset_group_id: &[u8], mut asset: Asset) {
        self.asset_group_id = Identifier::fit(asset_group_id, self.id_length);
        asset.set_id_length(self.id_length);
        self.asset = Some(asset);
    }

    /// Append a pointer. It takes this relation's id length.
    pub fn add_pointer(&mut self, mut pointer: Pointer) {
        pointer.set_id_length(self.id_length);
        self.pointers.push(pointer);
    }

    pub fn id_length(&self) -> usize {
        self.id_length
    }

    pub fn asset_group_id(&self) -> &Identifier {
        &self.asset_group_id
    }

    pub fn pointers(&self) -> &[Pointer] {
        &self.pointers
    }

    pub fn asset(&self) -> Option<&Asset> {
        self.asset.as_ref()
    }

    pub fn asset_mut(&mut self) -> Option<&mut Asset> {
        self.asset.as_mut()
    }

    pub(crate) fn set_id_length(&mut self, id_length: usize) {
        if self.id_length == id_length {
            return;
        }
        self.id_length = id_length;
        self.asset_group_id.refit(id_length);
        for pointer in &mut self.pointers {
            pointer.set_id_length(id_length);
        }
        if let Some(asset) = &mut self.asset {
            asset.set_id_length(id_length);
        }
    }

    pub(crate) fn ensure_asset_id(&mut self) -> Result<()> {
        match &mut self.asset {
            Some(asset) => asset.ensure_id(),
            None => Ok(()),
        }
    }

    pub fn pack(&self) -> Result<Vec<u8>> {
        let mut w = Writer::new();
        w.put_length_prefixed(self.asset_group_id.as_bytes())?;
        w.put_count(self.pointers.len(), "pointers")?;
        for pointer in &self.pointers {
            w.put_frame_u16(&pointer.pack()?)?;
        }
        match &self.asset {
            Some(asset) => w.put_frame_u32(&asset.pack()?)?,
            None => w.put_u32(0),
        }
        Ok(w.into_bytes())
    }

    pub fn unpack(bytes: &[u8], id_length: usize) -> Result<Self> {
        let mut r = Reader::new(bytes);
        let asset_group_id = Identifier::from(r.get_length_prefixed()?);
        let n = r.get_u16()?;
        let pointers = (0..n)
            .map(|_| Pointer::unpack(r.get_frame_u16()?, id_length))
            .collect::<Result<Vec<_>>>()?;
        let asset_bytes = r.get_frame_u32()?;
        let asset = if asset_bytes.is_empty() {
            None
        } else {
            Some(Asset::unpack(asset_bytes, id_length)?)
        };
        r.finish("relation")?;
        Ok(Self {
            id_length,
            asset_group_id,
            pointers,
            asset,
        })
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  asset_group_id: {}", self.asset_group_id)?;
        writeln!(f, "  Pointers[]: {}", self.pointers.len())?;
        for (i, pointer) in self.pointers.iter().enumerate() {
            writeln!(f, "   [{i}]")?;
            write!(f, "{pointer}")?;
        }
        match &self.asset {
            Some(asset) => write!(f, "{asset}"),
            None => writeln!(f, "  Asset: None"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_unpack_with_pointers() {
        let mut relation = Relation::with_asset(32, b"group", b"user", "state").unwrap();
        let mut p1 = Pointer::new(32);
        p1.attach(&[3; 32], Some(&[4; 32]));
        let mut p2 = Pointer::new(32);
        p2.attach(&[5; 32], None);
        relation.add_pointer(p1);
        relation.add_pointer(p2);

        let packed = relation.pack().unwrap();
        let decoded = Relation::unpack(&packed, 32).unwrap();
        assert_eq!(decoded.pointers().len(), 2);
        assert!(decoded.pointers()[1].asset_id().is_none());
        assert_eq!(decoded.asset().unwrap().body_str(), Some("state"));
        assert_eq!(decoded.pack().unwrap(), packed);
    }

    #[test]
    fn test_pointer_inherits_id_length() {
        let mut relation = Relation::new(8);
        let mut ptr = Pointer::new(32);
        ptr.attach(&[7; 32], Some(&[8; 32]));
        relation.add_pointer(ptr);
        assert_eq!(relation.pointers()[0].transaction_id().len(), 8);
        assert_eq!(relation.pointers()[0].asset_id().unwrap().len(), 8);
    }

    #[test]
    fn test_empty_relation() {
        let relation = Relation::new(1);
        let packed = relation.pack().unwrap();
        // LP(1 byte) + u16 count + u32 asset_len
        assert_eq!(packed.len(), 3 + 2 + 4);
        assert_eq!(Relation::unpack(&packed, 1).unwrap(), relation);
    }
}
