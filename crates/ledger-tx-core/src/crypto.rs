//! Cryptographic primitives: SHA-256 hashing and the signature seam.
//!
//! Hashing is fixed to SHA-256 because transaction and asset ids are
//! compared byte-for-byte with other implementations.
//!
//! Signing and verification are external capabilities. The transaction only
//! talks to the [`Signer`] and [`Verifier`] traits. An Ed25519 backend is
//! bundled. ECDSA key types are representable on the wire, but callers must
//! supply their own [`Verifier`] to check them.

use ed25519_dalek::{Signature as DalekSignature, Signer as _, SigningKey, Verifier as _, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A 32-byte SHA-256 hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sha256Hash(pub [u8; 32]);

impl Sha256Hash {
    /// Compute the SHA-256 hash of data.
    pub fn hash(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Sha256Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SHA256({}...)", &self.to_hex()[..8])
    }
}

impl AsRef<[u8]> for Sha256Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Sha256Hash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// Curve / algorithm tag carried by every signature on the wire.
///
/// Kept open (a raw `u32`) so signatures of unknown types survive a
/// decode/encode cycle untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct KeyType(pub u32);

impl KeyType {
    /// Empty signature slot.
    pub const NOT_INITIALIZED: Self = Self(0);
    pub const ECDSA_SECP256K1: Self = Self(1);
    pub const ECDSA_P256V1: Self = Self(2);
    pub const ED25519: Self = Self(3);

    pub const fn to_u32(self) -> u32 {
        self.0
    }

    pub fn is_initialized(self) -> bool {
        self != Self::NOT_INITIALIZED
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::NOT_INITIALIZED => write!(f, "not-initialized"),
            Self::ECDSA_SECP256K1 => write!(f, "ecdsa-secp256k1"),
            Self::ECDSA_P256V1 => write!(f, "ecdsa-p256v1"),
            Self::ED25519 => write!(f, "ed25519"),
            Self(other) => write!(f, "unknown({other})"),
        }
    }
}

/// Produces signatures over a transaction digest.
pub trait Signer {
    fn key_type(&self) -> KeyType;

    /// Encoded public key, as it will appear in the packed Signature.
    fn public_key(&self) -> Vec<u8>;

    /// Sign a 32-byte digest. `None` means the primitive failed.
    fn sign(&self, digest: &[u8]) -> Option<Vec<u8>>;
}

/// Checks signatures over a transaction digest.
pub trait Verifier {
    fn verify(&self, key_type: KeyType, public_key: &[u8], digest: &[u8], signature: &[u8])
        -> bool;
}

/// The bundled verifier. Understands [`KeyType::ED25519`] and rejects all
/// other key types.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultVerifier;

impl Verifier for DefaultVerifier {
    fn verify(
        &self,
        key_type: KeyType,
        public_key: &[u8],
        digest: &[u8],
        signature: &[u8],
    ) -> bool {
        if key_type != KeyType::ED25519 {
            tracing::debug!(%key_type, "no bundled verifier for key type");
            return false;
        }
        let Ok(pk) = <[u8; 32]>::try_from(public_key) else {
            return false;
        };
        let Ok(sig) = <[u8; 64]>::try_from(signature) else {
            return false;
        };
        let Ok(verifying_key) = VerifyingKey::from_bytes(&pk) else {
            return false;
        };
        verifying_key
            .verify(digest, &DalekSignature::from_bytes(&sig))
            .is_ok()
    }
}

/// An Ed25519 keypair for signing transactions.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            signing_key: SigningKey::generate(&mut rng),
        }
    }

    /// Create from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }
}

impl Signer for Keypair {
    fn key_type(&self) -> KeyType {
        KeyType::ED25519
    }

    fn public_key(&self) -> Vec<u8> {
        self.public_key_bytes().to_vec()
    }

    fn sign(&self, digest: &[u8]) -> Option<Vec<u8>> {
        Some(self.signing_key.sign(digest).to_bytes().to_vec())
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({}...)", &hex::encode(self.public_key_bytes())[..8])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_verify() {
        let keypair = Keypair::generate();
        let digest = Sha256Hash::hash(b"hello world");
        let sig = keypair.sign(digest.as_bytes()).unwrap();

        let verifier = DefaultVerifier;
        assert!(verifier.verify(KeyType::ED25519, &keypair.public_key(), digest.as_bytes(), &sig));

        let tampered = Sha256Hash::hash(b"hello worlD");
        assert!(!verifier.verify(
            KeyType::ED25519,
            &keypair.public_key(),
            tampered.as_bytes(),
            &sig
        ));
    }

    #[test]
    fn test_unknown_key_type_rejected() {
        let keypair = Keypair::from_seed(&[0x42; 32]);
        let digest = Sha256Hash::hash(b"x");
        let sig = keypair.sign(digest.as_bytes()).unwrap();
        assert!(!DefaultVerifier.verify(
            KeyType::ECDSA_P256V1,
            &keypair.public_key(),
            digest.as_bytes(),
            &sig
        ));
    }

    #[test]
    fn test_malformed_key_material_rejected() {
        assert!(!DefaultVerifier.verify(KeyType::ED25519, &[1, 2, 3], &[0; 32], &[0; 64]));
        assert!(!DefaultVerifier.verify(KeyType::ED25519, &[0; 32], &[0; 32], &[0; 10]));
    }

    #[test]
    fn test_deterministic_from_seed() {
        let kp1 = Keypair::from_seed(&[0x42; 32]);
        let kp2 = Keypair::from_seed(&[0x42; 32]);
        assert_eq!(kp1.public_key(), kp2.public_key());
    }

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            Sha256Hash::hash(b"abc").to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_key_type_display() {
        assert_eq!(KeyType::ED25519.to_string(), "ed25519");
        assert_eq!(KeyType(99).to_string(), "unknown(99)");
        assert!(!KeyType::NOT_INITIALIZED.is_initialized());
    }
}
