//! Identifier type shared by every entity.
//!
//! All ids in a transaction (user, asset, asset group, transaction) have the
//! same transaction-wide length, chosen once per transaction. The domain id in
//! a CrossRef is the only exception and is always 32 bytes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A byte-string identifier of transaction-wide length.
///
/// Equality is byte-content equality.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identifier(Vec<u8>);

impl Identifier {
    /// Wrap raw bytes as-is.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Fit `bytes` to exactly `len` bytes: truncate if longer, zero-pad if shorter.
    pub fn fit(bytes: &[u8], len: usize) -> Self {
        let mut out = vec![0u8; len];
        let n = bytes.len().min(len);
        out[..n].copy_from_slice(&bytes[..n]);
        Self(out)
    }

    /// Keep at most `len` leading bytes.
    pub fn truncated(bytes: &[u8], len: usize) -> Self {
        Self(bytes[..bytes.len().min(len)].to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        Ok(Self(hex::decode(s)?))
    }

    /// Re-fit to a new length in place.
    pub(crate) fn refit(&mut self, len: usize) {
        if self.0.len() != len {
            *self = Self::fit(&self.0, len);
        }
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "Identifier({})", &hex[..hex.len().min(16)])
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl AsRef<[u8]> for Identifier {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Identifier {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Identifier {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl PartialEq<[u8]> for Identifier {
    fn eq(&self, other: &[u8]) -> bool {
        self.0 == other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_truncates_and_pads() {
        let long = Identifier::fit(&[1, 2, 3, 4], 2);
        assert_eq!(long.as_bytes(), &[1, 2]);

        let short = Identifier::fit(&[1, 2], 4);
        assert_eq!(short.as_bytes(), &[1, 2, 0, 0]);
    }

    #[test]
    fn test_truncated_never_pads() {
        assert_eq!(Identifier::truncated(&[7; 32], 64).len(), 32);
        assert_eq!(Identifier::truncated(&[7; 32], 8).len(), 8);
    }

    #[test]
    fn test_hex_roundtrip() {
        let id = Identifier::from_bytes(vec![0xab; 8]);
        let recovered = Identifier::from_hex(&id.to_hex()).unwrap();
        assert_eq!(id, recovered);
        assert_eq!(format!("{}", id), "abababababababab");
    }

    #[test]
    fn test_debug_is_abbreviated() {
        let id = Identifier::from_bytes(vec![0xcd; 32]);
        assert_eq!(format!("{:?}", id), "Identifier(cdcdcdcdcdcdcdcd)");
    }

    #[test]
    fn test_content_equality() {
        let a = Identifier::from_bytes(vec![1, 2, 3]);
        let b = Identifier::fit(&[1, 2, 3, 9], 3);
        assert_eq!(a, b);
        assert!(a == *[1u8, 2, 3].as_slice());
    }
}
