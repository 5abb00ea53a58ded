//! Envelope: a format tag in front of the packed transaction.
//!
//! ```text
//! u16 format_tag || payload
//! ```
//!
//! | tag      | payload                         |
//! |----------|---------------------------------|
//! | `0x0000` | `Transaction::pack()` bytes     |
//! | `0x0010` | zlib stream of the packed bytes |

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use ledger_tx_core::Transaction;

use crate::error::{Error, Result};

/// Envelope format tag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Format {
    #[default]
    Plain = 0x0000,
    Zlib = 0x0010,
}

impl Format {
    pub const fn tag(self) -> u16 {
        self as u16
    }

    pub fn from_tag(tag: u16) -> Result<Self> {
        match tag {
            0x0000 => Ok(Format::Plain),
            0x0010 => Ok(Format::Zlib),
            other => Err(Error::UnsupportedFormat(other)),
        }
    }
}

/// Serializer configuration.
#[derive(Debug, Clone)]
pub struct SerializerConfig {
    /// zlib level, 0 (store) to 9 (best).
    pub compression_level: u32,
    /// Upper bound on decompressed payload size.
    pub max_decompressed_size: usize,
    /// Format used by [`Serializer::serialize_default`].
    pub default_format: Format,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            compression_level: 6,
            max_decompressed_size: 64 * 1024 * 1024,
            default_format: Format::Plain,
        }
    }
}

/// Wraps packed transactions in envelopes and back.
#[derive(Debug, Clone, Default)]
pub struct Serializer {
    config: SerializerConfig,
}

impl Serializer {
    pub fn new(config: SerializerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SerializerConfig {
        &self.config
    }

    /// Pack `tx` (digesting it if needed) and wrap it.
    pub fn serialize(&self, tx: &mut Transaction, format: Format) -> Result<Vec<u8>> {
        let packed = tx.pack()?;
        self.encode_envelope(&packed, format)
    }

    pub fn serialize_default(&self, tx: &mut Transaction) -> Result<Vec<u8>> {
        self.serialize(tx, self.config.default_format)
    }

    /// Wrap already packed transaction bytes.
    pub fn encode_envelope(&self, packed: &[u8], format: Format) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(2 + packed.len());
        out.extend_from_slice(&format.tag().to_le_bytes());
        match format {
            Format::Plain => out.extend_from_slice(packed),
            Format::Zlib => {
                let level = Compression::new(self.config.compression_level.min(9));
                let mut encoder = ZlibEncoder::new(out, level);
                encoder
                    .write_all(packed)
                    .map_err(|e| Error::Compression(e.to_string()))?;
                out = encoder
                    .finish()
                    .map_err(|e| Error::Compression(e.to_string()))?;
            }
        }
        tracing::trace!(
            format = ?format,
            packed = packed.len(),
            wire = out.len(),
            "serialized transaction"
        );
        Ok(out)
    }

    /// Strip the envelope, returning the format and the packed bytes.
    pub fn decode_envelope(&self, bytes: &[u8]) -> Result<(Format, Vec<u8>)> {
        if bytes.len() < 2 {
            return Err(Error::Truncated(bytes.len()));
        }
        let (tag, payload) = bytes.split_at(2);
        let format = Format::from_tag(u16::from_le_bytes([tag[0], tag[1]]))?;
        let packed = match format {
            Format::Plain => payload.to_vec(),
            Format::Zlib => self.inflate(payload)?,
        };
        Ok((format, packed))
    }

    /// Strip the envelope and unpack the transaction.
    pub fn deserialize(&self, bytes: &[u8]) -> Result<Transaction> {
        let (format, packed) = self.decode_envelope(bytes)?;
        tracing::trace!(format = ?format, packed = packed.len(), "deserializing transaction");
        Ok(Transaction::unpack(&packed)?)
    }

    fn inflate(&self, payload: &[u8]) -> Result<Vec<u8>> {
        let limit = self.config.max_decompressed_size;
        let mut out = Vec::new();
        ZlibDecoder::new(payload)
            .take(limit as u64 + 1)
            .read_to_end(&mut out)
            .map_err(|e| Error::Compression(e.to_string()))?;
        if out.len() > limit {
            tracing::warn!(limit, "decompressed envelope exceeds limit");
            return Err(Error::PayloadTooLarge { limit });
        }
        Ok(out)
    }
}

/// Serialize with the default configuration.
pub fn serialize(tx: &mut Transaction, format: Format) -> Result<Vec<u8>> {
    Serializer::default().serialize(tx, format)
}

/// Deserialize with the default configuration.
pub fn deserialize(bytes: &[u8]) -> Result<Transaction> {
    Serializer::default().deserialize(bytes)
}
