//! # Ledger Tx
//!
//! Build, sign, pack and transport ledger transactions in the shared binary
//! format.
//!
//! ## Overview
//!
//! - **Transactions**: Events, References, Relations, Witness, CrossRef and
//!   signature slots, content-addressed by a two-step SHA-256 digest
//! - **Codec**: Byte-exact pack/unpack compatible with other implementations
//! - **Envelope**: A `u16` format tag, optionally followed by a zlib stream
//!
//! ## Usage
//!
//! ```rust
//! use ledger_tx::core::{Asset, Event, Keypair, Transaction, Witness};
//! use ledger_tx::{deserialize, serialize, Format};
//!
//! let mut asset = Asset::new(32);
//! asset.set_owner(b"alice");
//! asset.set_body_string("hello").unwrap();
//!
//! let mut event = Event::new(32);
//! event.attach(b"group", asset);
//!
//! let mut tx = Transaction::new(32);
//! tx.add_event(event);
//! tx.set_witness(Witness::new(32)).add_witness(b"alice").unwrap();
//!
//! let keypair = Keypair::generate();
//! let signature = tx.sign(&keypair).unwrap();
//! tx.add_signature(b"alice", signature).unwrap();
//!
//! let wire = serialize(&mut tx, Format::Zlib).unwrap();
//! let mut received = deserialize(&wire).unwrap();
//! received.verify_all().unwrap();
//! ```
//!
//! ## Re-exports
//!
//! - `ledger_tx::core` - The transaction model and codec

pub mod envelope;
pub mod error;

pub use ledger_tx_core as core;

pub use envelope::{deserialize, serialize, Format, Serializer, SerializerConfig};
pub use error::{Error, Result};

// Commonly used core types
pub use ledger_tx_core::{
    Asset, CoreError, CrossRef, Event, Identifier, KeyType, Keypair, Pointer, Reference,
    Relation, Signature, Transaction, Witness, DEFAULT_ID_LENGTH,
};
