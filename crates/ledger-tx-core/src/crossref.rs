//! CrossRef: anchors a transaction of another domain.
//!
//! Both fields are fixed at 32 bytes on the wire whatever the transaction's
//! id length is. Each still carries its own `u16` length prefix:
//! `LP(domain_id) LP(transaction_id)`.

use std::fmt;

use crate::error::{CoreError, Result};
use crate::types::Identifier;
use crate::wire::{Reader, Writer};
use crate::DOMAIN_ID_LENGTH;

/// Width of the foreign transaction id inside a CrossRef.
pub const CROSS_REF_TXID_LENGTH: usize = 32;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CrossRef {
    domain_id: Identifier,
    transaction_id: Identifier,
}

impl Default for CrossRef {
    fn default() -> Self {
        Self::new()
    }
}

impl CrossRef {
    pub fn new() -> Self {
        Self {
            domain_id: Identifier::fit(&[], DOMAIN_ID_LENGTH),
            transaction_id: Identifier::fit(&[], CROSS_REF_TXID_LENGTH),
        }
    }

    /// Both ids are fitted to 32 bytes.
    pub fn attach(&mut self, domain_id: &[u8], transaction_id: &[u8]) {
        self.domain_id = Identifier::fit(domain_id, DOMAIN_ID_LENGTH);
        self.transaction_id = Identifier::fit(transaction_id, CROSS_REF_TXID_LENGTH);
    }

    pub fn domain_id(&self) -> &Identifier {
        &self.domain_id
    }

    pub fn transaction_id(&self) -> &Identifier {
        &self.transaction_id
    }

    pub fn pack(&self) -> Result<Vec<u8>> {
        let mut w = Writer::with_capacity(4 + DOMAIN_ID_LENGTH + CROSS_REF_TXID_LENGTH);
        w.put_length_prefixed(self.domain_id.as_bytes())?;
        w.put_length_prefixed(self.transaction_id.as_bytes())?;
        Ok(w.into_bytes())
    }

    pub fn unpack(bytes: &[u8]) -> Result<Self> {
        let mut r = Reader::new(bytes);
        let domain_id = read_fixed(&mut r, DOMAIN_ID_LENGTH, "domain_id")?;
        let transaction_id = read_fixed(&mut r, CROSS_REF_TXID_LENGTH, "transaction_id")?;
        r.finish("cross_ref")?;
        Ok(Self {
            domain_id,
            transaction_id,
        })
    }
}

fn read_fixed(r: &mut Reader<'_>, len: usize, what: &str) -> Result<Identifier> {
    let bytes = r.get_length_prefixed()?;
    if bytes.len() != len {
        return Err(CoreError::MalformedInput(format!(
            "cross_ref {what} must be {len} bytes, got {}",
            bytes.len()
        )));
    }
    Ok(Identifier::from(bytes))
}

impl fmt::Display for CrossRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cross_Ref:")?;
        writeln!(f, "  domain_id: {}", self.domain_id)?;
        writeln!(f, "  transaction_id: {}", self.transaction_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_width_regardless_of_input() {
        let mut cross_ref = CrossRef::new();
        cross_ref.attach(&[0xaa; 40], &[0xbb; 8]);
        assert_eq!(cross_ref.domain_id().len(), 32);
        assert_eq!(cross_ref.transaction_id().len(), 32);
        assert_eq!(&cross_ref.transaction_id().as_bytes()[8..], &[0; 24]);

        let packed = cross_ref.pack().unwrap();
        assert_eq!(packed.len(), 2 + 32 + 2 + 32);
        assert_eq!(CrossRef::unpack(&packed).unwrap(), cross_ref);
    }

    #[test]
    fn test_short_field_rejected() {
        let mut w = Writer::new();
        w.put_length_prefixed(&[1; 32]).unwrap();
        w.put_length_prefixed(&[2; 8]).unwrap();
        assert!(CrossRef::unpack(w.as_slice()).unwrap_err().is_malformed());
    }
}
