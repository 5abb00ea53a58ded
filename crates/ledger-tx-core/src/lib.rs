//! # Ledger Transaction Core
//!
//! The transaction data model, its binary codec, and content addressing.
//!
//! This crate contains no I/O. Signing and verification go through the
//! [`Signer`] and [`Verifier`] traits; an Ed25519 backend is bundled.
//!
//! ## Key Types
//!
//! - [`Transaction`] - The aggregate root: owns every entity and the signature slots
//! - [`Event`] / [`Reference`] - UTXO-style outputs and inputs
//! - [`Relation`] / [`Pointer`] - Non-UTXO links between assets and transactions
//! - [`Asset`] - Content-addressed payload
//! - [`Witness`] - Signers authorized outside any Event policy
//! - [`CrossRef`] - Anchor to a transaction in another domain
//! - [`Signature`] - One signer slot's key and signature
//!
//! ## Wire format
//!
//! Little-endian, length-framed, byte-compatible with other implementations of
//! the same layout. See [`wire`] and each entity's module docs.
//!
//! ## Building a transaction
//!
//! ```
//! use ledger_tx_core::{Asset, Event, Keypair, Transaction, Witness};
//!
//! let mut asset = Asset::new(32);
//! asset.set_owner(b"alice");
//! asset.set_body_string("hello").unwrap();
//!
//! let mut event = Event::new(32);
//! event.attach(b"group", asset);
//! event.add_mandatory_approver(b"alice");
//!
//! let mut tx = Transaction::new(32);
//! tx.add_event(event);
//! tx.set_witness(Witness::new(32)).add_witness(b"alice").unwrap();
//!
//! let keypair = Keypair::generate();
//! let signature = tx.sign(&keypair).unwrap();
//! tx.add_signature(b"alice", signature).unwrap();
//!
//! let bytes = tx.pack().unwrap();
//! let mut received = Transaction::unpack(&bytes).unwrap();
//! received.verify_all().unwrap();
//! assert_eq!(received.transaction_id(), tx.transaction_id());
//! ```

pub mod asset;
pub mod body;
pub mod crossref;
pub mod crypto;
pub mod error;
pub mod event;
pub mod ident;
pub mod pointer;
pub mod reference;
pub mod relation;
pub mod signature;
pub mod slots;
pub mod transaction;
pub mod types;
pub mod wire;
pub mod witness;

pub use asset::{Asset, BodyType};
pub use body::BodyValue;
pub use crossref::CrossRef;
pub use crypto::{DefaultVerifier, KeyType, Keypair, Sha256Hash, Signer, Verifier};
pub use error::{CoreError, Result};
pub use event::Event;
pub use ident::{identifier_from_seed, identifier_with_timestamp, random_bytes};
pub use pointer::Pointer;
pub use reference::Reference;
pub use relation::Relation;
pub use signature::Signature;
pub use slots::{SignatureSlot, SignatureSlots};
pub use transaction::{ReferenceMut, Transaction, WitnessMut};
pub use types::Identifier;
pub use witness::Witness;

/// Id length used when a caller has no reason to pick another.
pub const DEFAULT_ID_LENGTH: usize = 32;

/// Transaction format version written by this crate.
pub const TRANSACTION_VERSION: u32 = 1;

/// Width of a domain id. Independent of the transaction's id length.
pub const DOMAIN_ID_LENGTH: usize = 32;

/// Largest id length the `u16` header field can carry.
pub const MAX_ID_LENGTH: usize = u16::MAX as usize;
