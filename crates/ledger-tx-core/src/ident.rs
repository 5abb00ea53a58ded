//! Identifier generation: deterministic, time-salted, and random.

use rand::RngCore;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::crypto::Sha256Hash;
use crate::types::Identifier;

/// Derive an identifier from a seed: `SHA256(seed)` fitted to `len`.
pub fn identifier_from_seed(seed: impl AsRef<[u8]>, len: usize) -> Identifier {
    Identifier::fit(Sha256Hash::hash(seed.as_ref()).as_bytes(), len)
}

/// Derive an identifier from a seed salted with the current time.
///
/// Two calls with the same seed yield different ids.
pub fn identifier_with_timestamp(seed: impl AsRef<[u8]>, len: usize) -> Identifier {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let mut salted = seed.as_ref().to_vec();
    salted.extend_from_slice(nanos.to_string().as_bytes());
    salted.extend_from_slice(&random_bytes(8));
    identifier_from_seed(&salted, len)
}

/// Generate `len` random bytes from the thread-local CSPRNG.
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut out);
    out
}

/// Current time as Unix milliseconds.
pub(crate) fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_identifier_is_deterministic() {
        let a = identifier_from_seed("asset_group_id1", 8);
        let b = identifier_from_seed("asset_group_id1", 8);
        assert_eq!(a, b);
        assert_eq!(a.len(), 8);
        assert_ne!(a, identifier_from_seed("asset_group_id2", 8));
    }

    #[test]
    fn test_seeded_identifier_is_hash_prefix() {
        let full = Sha256Hash::hash(b"user1");
        let id = identifier_from_seed(b"user1", 32);
        assert_eq!(id.as_bytes(), full.as_bytes());
    }

    #[test]
    fn test_timestamped_identifier_differs() {
        let a = identifier_with_timestamp("user2", 32);
        let b = identifier_with_timestamp("user2", 32);
        assert_ne!(a, b);
    }

    #[test]
    fn test_random_bytes_length() {
        assert_eq!(random_bytes(0).len(), 0);
        assert_eq!(random_bytes(64).len(), 64);
    }
}
