//! Property tests over the envelope.

use ledger_tx::{deserialize, serialize, Format, Serializer, SerializerConfig};
use ledger_tx_testkit::generators::{transaction_from_params, TxParams};
use proptest::prelude::*;

fn envelope_format() -> impl Strategy<Value = Format> {
    prop_oneof![Just(Format::Plain), Just(Format::Zlib)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_envelope_preserves_txid(params: TxParams, format in envelope_format()) {
        let mut tx = transaction_from_params(&params).unwrap();
        let wire = serialize(&mut tx, format).unwrap();
        prop_assert_eq!(u16::from_le_bytes([wire[0], wire[1]]), format.tag());

        let mut received = deserialize(&wire).unwrap();
        prop_assert_eq!(received.transaction_id(), tx.transaction_id());
        prop_assert!(received.verify_all().is_ok());
    }

    #[test]
    fn test_compression_level_does_not_change_payload(
        params: TxParams,
        level in 0u32..=9,
    ) {
        let mut tx = transaction_from_params(&params).unwrap();
        let serializer = Serializer::new(SerializerConfig {
            compression_level: level,
            ..SerializerConfig::default()
        });
        let wire = serializer.serialize(&mut tx, Format::Zlib).unwrap();
        let (format, packed) = serializer.decode_envelope(&wire).unwrap();
        prop_assert_eq!(format, Format::Zlib);
        prop_assert_eq!(packed, tx.pack().unwrap());
    }

    #[test]
    fn test_garbage_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = deserialize(&bytes);
    }
}
