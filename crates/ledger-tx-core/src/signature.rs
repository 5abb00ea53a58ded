//! Signature: the public key and signature bytes for one signer slot.
//!
//! Wire layout:
//! ```text
//! u32 key_type [u32 pubkey_bits, pubkey, u32 signature_bits, signature]
//! ```
//! The bracketed part is omitted for an empty slot (`key_type == 0`). Lengths
//! are in bits and must be whole bytes.

use std::fmt;

use crate::crypto::{DefaultVerifier, KeyType, Verifier};
use crate::error::{CoreError, Result};
use crate::wire::{Reader, Writer};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Signature {
    key_type: KeyType,
    pubkey: Vec<u8>,
    signature: Vec<u8>,
}

impl Signature {
    /// An empty slot.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(key_type: KeyType, pubkey: Vec<u8>, signature: Vec<u8>) -> Self {
        Self {
            key_type,
            pubkey,
            signature,
        }
    }

    pub fn set_public_key(&mut self, key_type: KeyType, pubkey: impl Into<Vec<u8>>) {
        self.key_type = key_type;
        self.pubkey = pubkey.into();
    }

    pub fn set_signature(&mut self, signature: impl Into<Vec<u8>>) {
        self.signature = signature.into();
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    pub fn public_key(&self) -> &[u8] {
        &self.pubkey
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    pub fn is_initialized(&self) -> bool {
        self.key_type.is_initialized()
    }

    pub fn pubkey_len_bits(&self) -> u64 {
        self.pubkey.len() as u64 * 8
    }

    pub fn signature_len_bits(&self) -> u64 {
        self.signature.len() as u64 * 8
    }

    /// Verify against `digest` with the bundled verifier.
    pub fn verify(&self, digest: &[u8]) -> bool {
        self.verify_with(&DefaultVerifier, digest)
    }

    pub fn verify_with(&self, verifier: &dyn Verifier, digest: &[u8]) -> bool {
        self.is_initialized()
            && verifier.verify(self.key_type, &self.pubkey, digest, &self.signature)
    }

    pub fn pack(&self) -> Result<Vec<u8>> {
        let mut w = Writer::with_capacity(12 + self.pubkey.len() + self.signature.len());
        w.put_u32(self.key_type.to_u32());
        if !self.is_initialized() {
            return Ok(w.into_bytes());
        }
        put_bits_prefixed(&mut w, &self.pubkey, "public key")?;
        put_bits_prefixed(&mut w, &self.signature, "signature")?;
        Ok(w.into_bytes())
    }

    /// Recover a signature from its packed bytes.
    pub fn unpack(bytes: &[u8]) -> Result<Self> {
        let mut r = Reader::new(bytes);
        let key_type = KeyType(r.get_u32()?);
        if !key_type.is_initialized() {
            r.finish("empty signature")?;
            return Ok(Self::empty());
        }
        let pubkey = get_bits_prefixed(&mut r, "public key")?.to_vec();
        let signature = get_bits_prefixed(&mut r, "signature")?.to_vec();
        r.finish("signature")?;
        Ok(Self {
            key_type,
            pubkey,
            signature,
        })
    }
}

fn put_bits_prefixed(w: &mut Writer, bytes: &[u8], what: &str) -> Result<()> {
    let bits = bytes
        .len()
        .checked_mul(8)
        .and_then(|bits| u32::try_from(bits).ok())
        .ok_or_else(|| CoreError::InvariantViolation(format!("{what} is too long")))?;
    w.put_u32(bits);
    w.put_raw(bytes);
    Ok(())
}

fn get_bits_prefixed<'a>(r: &mut Reader<'a>, what: &str) -> Result<&'a [u8]> {
    let bits = r.get_u32()?;
    if bits % 8 != 0 {
        return Err(CoreError::MalformedInput(format!(
            "{what} length of {bits} bits is not a whole number of bytes"
        )));
    }
    r.get_bytes((bits / 8) as usize)
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_initialized() {
            return writeln!(f, "  Not initialized");
        }
        writeln!(f, "  key_type: {}", self.key_type)?;
        writeln!(f, "  signature: {}", hex::encode(&self.signature))?;
        writeln!(f, "  pubkey: {}", hex::encode(&self.pubkey))
    }
}
