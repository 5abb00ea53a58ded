//! # Ledger Tx Testkit
//!
//! Testing utilities for ledger transactions.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Interop vectors**: Envelopes produced by another implementation, with
//!   the ids they must decode to
//! - **Golden vectors**: Deterministic transactions built here, for other
//!   implementations to check against
//! - **Generators**: Proptest strategies for every entity
//! - **Fixtures**: Signers that assemble typical transactions
//!
//! ## Interop Vectors
//!
//! ```rust
//! use ledger_tx_testkit::vectors::interop_vectors;
//!
//! for vector in interop_vectors() {
//!     let bytes = hex::decode(vector.envelope_hex).unwrap();
//!     let tx = ledger_tx::deserialize(&bytes).unwrap();
//!     assert_eq!(tx.transaction_id().unwrap().to_hex(), vector.expected_txid);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use ledger_tx_testkit::generators::{TxParams, transaction_from_params};
//!
//! proptest! {
//!     #[test]
//!     fn txid_is_deterministic(params: TxParams) {
//!         let mut t1 = transaction_from_params(&params).unwrap();
//!         let mut t2 = transaction_from_params(&params).unwrap();
//!         prop_assert_eq!(t1.digest().unwrap(), t2.digest().unwrap());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use ledger_tx_testkit::fixtures::TestFixture;
//!
//! let alice = TestFixture::new();
//! let mut tx = alice.make_transaction("hello").unwrap();
//! alice.sign(&mut tx).unwrap();
//! tx.verify_all().unwrap();
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{multi_party_fixtures, TestFixture};
