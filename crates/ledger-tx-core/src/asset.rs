//! Asset: a content-addressed payload owned by an Event or a Relation.
//!
//! Wire layout:
//! ```text
//! LP(asset_id) LP(user_id) LP(nonce) u32 file_size [32B file_digest if file_size > 0]
//! u16 body_type u16 body_size [body]
//! ```
//!
//! `asset_id` is `SHA256` of the same layout with the `LP(asset_id)` field
//! left out, truncated to the transaction-wide id length.

use serde::{de::DeserializeOwned, Serialize};
use std::fmt;

use crate::body::{self, BodyValue};
use crate::crypto::Sha256Hash;
use crate::error::{CoreError, Result};
use crate::ident::random_bytes;
use crate::types::Identifier;
use crate::wire::{Reader, Writer};

/// How the body bytes are to be interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum BodyType {
    /// UTF-8 text (not validated on decode).
    #[default]
    String = 0,
    /// MessagePack, see [`crate::body`].
    Structured = 1,
}

impl BodyType {
    pub fn from_u16(value: u16) -> Result<Self> {
        match value {
            0 => Ok(BodyType::String),
            1 => Ok(BodyType::Structured),
            other => Err(CoreError::MalformedInput(format!(
                "unknown asset body type {other}"
            ))),
        }
    }

    pub const fn to_u16(self) -> u16 {
        self as u16
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Asset {
    id_length: usize,
    asset_id: Option<Identifier>,
    user_id: Identifier,
    nonce: Vec<u8>,
    file_size: u32,
    file_digest: Option<[u8; 32]>,
    body_type: BodyType,
    body: Vec<u8>,
}

impl Asset {
    pub fn new(id_length: usize) -> Self {
        Self {
            id_length,
            asset_id: None,
            user_id: Identifier::fit(&[], id_length),
            nonce: Vec::new(),
            file_size: 0,
            file_digest: None,
            body_type: BodyType::String,
            body: Vec::new(),
        }
    }

    /// Set the owner and draw a fresh random nonce of id length.
    pub fn set_owner(&mut self, user_id: &[u8]) {
        self.user_id = Identifier::fit(user_id, self.id_length);
        self.nonce = random_bytes(self.id_length);
        self.asset_id = None;
    }

    /// Replace the nonce. Mostly useful to make asset ids reproducible.
    pub fn set_nonce(&mut self, nonce: impl Into<Vec<u8>>) {
        self.nonce = nonce.into();
        self.asset_id = None;
    }

    /// Record the size and SHA-256 of an off-band file. The content itself is
    /// not kept.
    pub fn attach_file_digest(&mut self, file: &[u8]) -> Result<()> {
        self.file_size = u32::try_from(file.len()).map_err(|_| {
            CoreError::InvariantViolation(format!("file of {} bytes exceeds u32", file.len()))
        })?;
        self.file_digest = (self.file_size > 0).then(|| *Sha256Hash::hash(file).as_bytes());
        self.asset_id = None;
        Ok(())
    }

    pub fn set_body_string(&mut self, body: &str) -> Result<()> {
        self.set_body(BodyType::String, body.as_bytes().to_vec())
    }

    pub fn set_body_structured(&mut self, value: &BodyValue) -> Result<()> {
        self.set_body(BodyType::Structured, value.to_msgpack()?)
    }

    /// Encode a serde value as a structured body.
    pub fn set_body_object<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.set_body(BodyType::Structured, body::encode_object(value)?)
    }

    fn set_body(&mut self, body_type: BodyType, body: Vec<u8>) -> Result<()> {
        if body.len() > u16::MAX as usize {
            return Err(CoreError::BodyTooLarge(body.len()));
        }
        self.body_type = body_type;
        self.body = body;
        self.asset_id = None;
        Ok(())
    }

    pub fn id_length(&self) -> usize {
        self.id_length
    }

    /// The asset id, if it has been computed or decoded.
    pub fn asset_id(&self) -> Option<&Identifier> {
        self.asset_id.as_ref()
    }

    pub fn user_id(&self) -> &Identifier {
        &self.user_id
    }

    pub fn nonce(&self) -> &[u8] {
        &self.nonce
    }

    pub fn file_size(&self) -> u32 {
        self.file_size
    }

    pub fn file_digest(&self) -> Option<&[u8; 32]> {
        self.file_digest.as_ref()
    }

    pub fn body_type(&self) -> BodyType {
        self.body_type
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The body as text, when it is a string body holding valid UTF-8.
    pub fn body_str(&self) -> Option<&str> {
        match self.body_type {
            BodyType::String => std::str::from_utf8(&self.body).ok(),
            BodyType::Structured => None,
        }
    }

    /// Decode a structured body. `Ok(None)` for string bodies.
    pub fn body_value(&self) -> Result<Option<BodyValue>> {
        match self.body_type {
            BodyType::String => Ok(None),
            BodyType::Structured => BodyValue::from_msgpack(&self.body).map(Some),
        }
    }

    /// Decode a structured body into a serde type.
    pub fn body_object<T: DeserializeOwned>(&self) -> Result<T> {
        if self.body_type != BodyType::Structured {
            return Err(CoreError::Encoding("asset body is not structured".into()));
        }
        body::decode_object(&self.body)
    }

    /// Compute the asset id, store it, and return the full 32-byte hash.
    pub fn digest(&mut self) -> Result<Sha256Hash> {
        let hash = self.compute_digest()?;
        self.asset_id = Some(Identifier::truncated(hash.as_bytes(), self.id_length));
        Ok(hash)
    }

    /// Compute and store the asset id unless one is already present.
    pub(crate) fn ensure_id(&mut self) -> Result<()> {
        if self.asset_id.is_none() {
            self.digest()?;
        }
        Ok(())
    }

    fn compute_digest(&self) -> Result<Sha256Hash> {
        let mut w = Writer::new();
        self.write_without_id(&mut w)?;
        Ok(Sha256Hash::hash(w.as_slice()))
    }

    /// Recompute the digest of the received content and compare it with the
    /// stored asset id.
    pub fn check_id(&self) -> Result<()> {
        let actual = Identifier::truncated(self.compute_digest()?.as_bytes(), self.id_length);
        match &self.asset_id {
            Some(stored) if *stored == actual => Ok(()),
            stored => Err(CoreError::IdMismatch {
                expected: stored.as_ref().map(Identifier::to_hex).unwrap_or_default(),
                actual: actual.to_hex(),
            }),
        }
    }

    /// Change the id length. Refits the owner and the nonce (truncate or
    /// zero-pad) and drops the cached asset id.
    pub(crate) fn set_id_length(&mut self, id_length: usize) {
        if self.id_length == id_length {
            return;
        }
        self.id_length = id_length;
        self.user_id.refit(id_length);
        self.nonce.resize(id_length, 0);
        self.asset_id = None;
    }

    fn write_without_id(&self, w: &mut Writer) -> Result<()> {
        w.put_length_prefixed(self.user_id.as_bytes())?;
        w.put_length_prefixed(&self.nonce)?;
        w.put_u32(self.file_size);
        if self.file_size > 0 {
            let digest = self.file_digest.ok_or_else(|| {
                CoreError::InvariantViolation("file size set without file digest".into())
            })?;
            w.put_raw(&digest);
        }
        w.put_u16(self.body_type.to_u16());
        w.put_length_prefixed(&self.body)?;
        Ok(())
    }

    /// Pack to wire bytes. Uses the stored asset id, or computes one without
    /// storing it.
    pub fn pack(&self) -> Result<Vec<u8>> {
        let asset_id = match &self.asset_id {
            Some(id) => id.clone(),
            None => Identifier::truncated(self.compute_digest()?.as_bytes(), self.id_length),
        };
        let mut w = Writer::with_capacity(64 + self.body.len());
        w.put_length_prefixed(asset_id.as_bytes())?;
        self.write_without_id(&mut w)?;
        Ok(w.into_bytes())
    }

    /// Decode an asset. The asset id is kept as received.
    pub fn unpack(bytes: &[u8], id_length: usize) -> Result<Self> {
        let mut r = Reader::new(bytes);
        let asset_id = Identifier::from(r.get_length_prefixed()?);
        let user_id = Identifier::from(r.get_length_prefixed()?);
        let nonce = r.get_length_prefixed()?.to_vec();
        let file_size = r.get_u32()?;
        let file_digest = if file_size > 0 {
            let mut digest = [0u8; 32];
            digest.copy_from_slice(r.get_bytes(32)?);
            Some(digest)
        } else {
            None
        };
        let body_type = BodyType::from_u16(r.get_u16()?)?;
        let body = r.get_length_prefixed()?.to_vec();
        r.finish("asset")?;

        Ok(Self {
            id_length,
            asset_id: Some(asset_id),
            user_id,
            nonce,
            file_size,
            file_digest,
            body_type,
            body,
        })
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Asset:")?;
        match &self.asset_id {
            Some(id) => writeln!(f, "     asset_id: {id}")?,
            None => writeln!(f, "     asset_id: None")?,
        }
        writeln!(f, "     user_id: {}", self.user_id)?;
        writeln!(f, "     nonce: {}", hex::encode(&self.nonce))?;
        writeln!(f, "     file_size: {}", self.file_size)?;
        match &self.file_digest {
            Some(d) => writeln!(f, "     file_digest: {}", hex::encode(d))?,
            None => writeln!(f, "     file_digest: None")?,
        }
        writeln!(f, "     body_size: {}", self.body.len())?;
        match self.body_str() {
            Some(s) => writeln!(f, "     body: {s}"),
            None => writeln!(f, "     body: {}", hex::encode(&self.body)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_asset(body: &str) -> Asset {
        let mut asset = Asset::new(32);
        asset.set_owner(&[0x11; 32]);
        asset.set_nonce(vec![0x22; 32]);
        asset.set_body_string(body).unwrap();
        asset
    }

    #[test]
    fn test_id_excludes_id_field() {
        let mut asset = fixed_asset("hello");
        let hash = asset.digest().unwrap();
        let packed = asset.pack().unwrap();

        // LP(asset_id) is 2 + 32 bytes; everything after it is hashed.
        assert_eq!(Sha256Hash::hash(&packed[34..]), hash);
        assert_eq!(asset.asset_id().unwrap().as_bytes(), hash.as_bytes());
    }

    #[test]
    fn test_identical_content_identical_id() {
        let mut a = fixed_asset("hello");
        let mut b = fixed_asset("hello");
        assert_eq!(a.digest().unwrap(), b.digest().unwrap());

        let mut c = fixed_asset("hellp");
        assert_ne!(a.digest().unwrap(), c.digest().unwrap());
    }

    #[test]
    fn test_digest_is_idempotent() {
        let mut asset = fixed_asset("x");
        let first = asset.digest().unwrap();
        assert_eq!(asset.digest().unwrap(), first);
    }

    #[test]
    fn test_mutation_clears_asset_id() {
        let mut asset = fixed_asset("x");
        asset.digest().unwrap();
        asset.set_body_string("y").unwrap();
        assert!(asset.asset_id().is_none());
    }

    #[test]
    fn test_pack_without_digest_matches_digested_pack() {
        let asset = fixed_asset("lazy");
        let mut digested = asset.clone();
        digested.digest().unwrap();
        assert_eq!(asset.pack().unwrap(), digested.pack().unwrap());
    }

    #[test]
    fn test_file_digest_roundtrip() {
        let mut asset = fixed_asset("");
        asset.attach_file_digest(b"large off-band content").unwrap();
        assert_eq!(asset.file_size(), 22);

        let packed = asset.pack().unwrap();
        let decoded = Asset::unpack(&packed, 32).unwrap();
        assert_eq!(decoded.file_digest(), asset.file_digest());
        assert_eq!(decoded.pack().unwrap(), packed);
    }

    #[test]
    fn test_empty_file_has_no_digest() {
        let mut asset = fixed_asset("");
        asset.attach_file_digest(b"").unwrap();
        assert!(asset.file_digest().is_none());
    }

    #[test]
    fn test_structured_body() {
        let mut asset = fixed_asset("");
        let value = BodyValue::Map(vec![(BodyValue::from("k"), BodyValue::Int(7))]);
        asset.set_body_structured(&value).unwrap();
        assert_eq!(asset.body_type(), BodyType::Structured);
        assert_eq!(asset.body_value().unwrap(), Some(value));
        assert!(asset.body_str().is_none());
    }

    #[test]
    fn test_body_too_large() {
        let mut asset = Asset::new(8);
        let big = "a".repeat(u16::MAX as usize + 1);
        assert!(matches!(
            asset.set_body_string(&big),
            Err(CoreError::BodyTooLarge(65536))
        ));
    }

    #[test]
    fn test_owner_is_fitted() {
        let mut asset = Asset::new(4);
        asset.set_owner(&[9; 32]);
        assert_eq!(asset.user_id().as_bytes(), &[9, 9, 9, 9]);
        assert_eq!(asset.nonce().len(), 4);
    }

    #[test]
    fn test_set_id_length_refits_nonce() {
        let mut asset = fixed_asset("x");
        asset.set_id_length(8);
        assert_eq!(asset.nonce(), &[0x22; 8]);
        asset.set_id_length(10);
        assert_eq!(asset.nonce(), &[0x22, 0x22, 0x22, 0x22, 0x22, 0x22, 0x22, 0x22, 0, 0]);
        assert!(asset.asset_id().is_none());
    }

    #[test]
    fn test_check_id_detects_forged_asset_id() {
        let mut asset = fixed_asset("genuine");
        asset.digest().unwrap();
        let packed = asset.pack().unwrap();
        Asset::unpack(&packed, 32).unwrap().check_id().unwrap();

        // Flip a byte of the received asset id, after the 2-byte length.
        let mut forged = packed.clone();
        forged[2] ^= 0x01;
        let decoded = Asset::unpack(&forged, 32).unwrap();
        assert!(matches!(
            decoded.check_id(),
            Err(CoreError::IdMismatch { .. })
        ));
    }

    #[test]
    fn test_check_id_without_id() {
        assert!(matches!(
            fixed_asset("x").check_id(),
            Err(CoreError::IdMismatch { .. })
        ));
    }

    #[test]
    fn test_unpack_rejects_trailing_bytes() {
        let mut packed = fixed_asset("x").pack().unwrap();
        packed.push(0);
        assert!(Asset::unpack(&packed, 32).unwrap_err().is_malformed());
    }

    #[test]
    fn test_unpack_rejects_unknown_body_type() {
        let mut packed = fixed_asset("").pack().unwrap();
        let at = packed.len() - 4;
        packed[at] = 7;
        assert!(Asset::unpack(&packed, 32).is_err());
    }
}
