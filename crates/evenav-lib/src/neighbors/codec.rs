//! Binary encoding for neighbor row columns.
//!
//! Layout of an encoded blob:
//!
//! | bytes | field |
//! |---|---|
//! | 0..2 | magic `b"JN"` |
//! | 2 | version |
//! | 3 | flags (bit 0: zstd payload, bit 1: 64-bit ids) |
//! | 4..8 | element count, u32 LE |
//! | 8.. | payload, fixed-width little-endian elements |
//!
//! Ids are written as u32 when every id fits, otherwise as i64. Distances are
//! always f32.

use crate::db::SystemId;
use crate::error::{Error, Result};

const MAGIC: &[u8; 2] = b"JN";
const VERSION: u8 = 1;
const FLAG_ZSTD: u8 = 0x01;
const FLAG_WIDE_IDS: u8 = 0x02;
const HEADER_SIZE: usize = 8;
const COMPRESSION_LEVEL: i32 = 3;

/// Payload compression applied by the encoders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Compression {
    #[default]
    None,
    Zstd,
}

/// Encode a list of system ids.
pub fn encode_ids(ids: &[SystemId], compression: Compression) -> Result<Vec<u8>> {
    let narrow = ids.iter().all(|&id| (0..=i64::from(u32::MAX)).contains(&id));
    let mut payload = Vec::with_capacity(ids.len() * if narrow { 4 } else { 8 });
    for &id in ids {
        if narrow {
            payload.extend_from_slice(&(id as u32).to_le_bytes());
        } else {
            payload.extend_from_slice(&id.to_le_bytes());
        }
    }
    let flags = if narrow { 0 } else { FLAG_WIDE_IDS };
    finish(flags, ids.len(), payload, compression)
}

/// Decode a blob produced by [`encode_ids`].
pub fn decode_ids(bytes: &[u8]) -> Result<Vec<SystemId>> {
    let (flags, count, payload) = open(bytes)?;
    if flags & FLAG_WIDE_IDS != 0 {
        check_length(&payload, count, 8)?;
        Ok(payload
            .chunks_exact(8)
            .map(|c| i64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
            .collect())
    } else {
        check_length(&payload, count, 4)?;
        Ok(payload
            .chunks_exact(4)
            .map(|c| i64::from(u32::from_le_bytes([c[0], c[1], c[2], c[3]])))
            .collect())
    }
}

/// Encode a list of distances in light-years.
pub fn encode_distances(distances: &[f32], compression: Compression) -> Result<Vec<u8>> {
    let mut payload = Vec::with_capacity(distances.len() * 4);
    for distance in distances {
        payload.extend_from_slice(&distance.to_le_bytes());
    }
    finish(0, distances.len(), payload, compression)
}

/// Decode a blob produced by [`encode_distances`].
pub fn decode_distances(bytes: &[u8]) -> Result<Vec<f32>> {
    let (flags, count, payload) = open(bytes)?;
    if flags & FLAG_WIDE_IDS != 0 {
        return Err(codec_error("distance blob carries the wide-id flag"));
    }
    check_length(&payload, count, 4)?;
    Ok(payload
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

fn finish(
    mut flags: u8,
    count: usize,
    payload: Vec<u8>,
    compression: Compression,
) -> Result<Vec<u8>> {
    let count = u32::try_from(count)
        .map_err(|_| codec_error(format!("{count} elements exceed the u32 count field")))?;

    let body = match compression {
        Compression::None => payload,
        Compression::Zstd => {
            flags |= FLAG_ZSTD;
            zstd::encode_all(payload.as_slice(), COMPRESSION_LEVEL)
                .map_err(|e| codec_error(format!("zstd compression failed: {e}")))?
        }
    };

    let mut out = Vec::with_capacity(HEADER_SIZE + body.len());
    out.extend_from_slice(MAGIC);
    out.push(VERSION);
    out.push(flags);
    out.extend_from_slice(&count.to_le_bytes());
    out.extend_from_slice(&body);
    Ok(out)
}

fn open(bytes: &[u8]) -> Result<(u8, usize, Vec<u8>)> {
    if bytes.len() < HEADER_SIZE {
        return Err(codec_error(format!(
            "blob of {} bytes is shorter than the {HEADER_SIZE}-byte header",
            bytes.len()
        )));
    }
    if &bytes[0..2] != MAGIC {
        return Err(codec_error("invalid magic bytes"));
    }
    if bytes[2] != VERSION {
        return Err(codec_error(format!(
            "unsupported version {} (expected {VERSION})",
            bytes[2]
        )));
    }
    let flags = bytes[3];
    if flags & !(FLAG_ZSTD | FLAG_WIDE_IDS) != 0 {
        return Err(codec_error(format!("unknown flags {flags:#04x}")));
    }
    let count = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;

    let body = &bytes[HEADER_SIZE..];
    let payload = if flags & FLAG_ZSTD != 0 {
        zstd::decode_all(body).map_err(|e| codec_error(format!("zstd decompression failed: {e}")))?
    } else {
        body.to_vec()
    };
    Ok((flags, count, payload))
}

fn check_length(payload: &[u8], count: usize, width: usize) -> Result<()> {
    let expected = count.checked_mul(width).ok_or_else(|| codec_error("count overflow"))?;
    if payload.len() != expected {
        return Err(codec_error(format!(
            "payload holds {} bytes, expected {expected} for {count} elements",
            payload.len()
        )));
    }
    Ok(())
}

fn codec_error(message: impl Into<String>) -> Error {
    Error::NeighborCodec {
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn small_ids_use_narrow_width() {
        let encoded = encode_ids(&[1, 2, 30_000_142], Compression::None).expect("encodes");
        assert_eq!(encoded.len(), HEADER_SIZE + 12);
        assert_eq!(encoded[3] & FLAG_WIDE_IDS, 0);
    }

    #[test]
    fn large_or_negative_ids_use_wide_width() {
        let ids = [1, i64::from(u32::MAX) + 1, -5];
        let encoded = encode_ids(&ids, Compression::None).expect("encodes");
        assert_eq!(encoded.len(), HEADER_SIZE + 24);
        assert_eq!(decode_ids(&encoded).expect("decodes"), ids.to_vec());
    }

    #[test]
    fn empty_lists_encode_to_header_only() {
        let encoded = encode_ids(&[], Compression::None).expect("encodes");
        assert_eq!(encoded.len(), HEADER_SIZE);
        assert!(decode_ids(&encoded).expect("decodes").is_empty());
    }

    #[test]
    fn truncated_blob_is_rejected() {
        let mut encoded = encode_ids(&[1, 2, 3], Compression::None).expect("encodes");
        encoded.pop();
        assert!(matches!(
            decode_ids(&encoded),
            Err(Error::NeighborCodec { .. })
        ));
        assert!(matches!(decode_ids(&[b'J']), Err(Error::NeighborCodec { .. })));
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut encoded = encode_distances(&[1.0], Compression::None).expect("encodes");
        encoded[0] = b'X';
        assert!(decode_distances(&encoded).is_err());
    }

    #[test]
    fn corrupt_compressed_payload_is_rejected() {
        let mut encoded = encode_ids(&[5; 64], Compression::Zstd).expect("encodes");
        let len = encoded.len();
        encoded.truncate(len - 3);
        assert!(decode_ids(&encoded).is_err());
    }

    proptest! {
        #[test]
        fn ids_round_trip(ids in proptest::collection::vec(any::<i64>(), 0..200), zstd in any::<bool>()) {
            let compression = if zstd { Compression::Zstd } else { Compression::None };
            let encoded = encode_ids(&ids, compression).expect("encodes");
            prop_assert_eq!(decode_ids(&encoded).expect("decodes"), ids);
        }

        #[test]
        fn narrow_ids_round_trip(ids in proptest::collection::vec(0i64..=u32::MAX as i64, 0..200), zstd in any::<bool>()) {
            let compression = if zstd { Compression::Zstd } else { Compression::None };
            let encoded = encode_ids(&ids, compression).expect("encodes");
            prop_assert_eq!(decode_ids(&encoded).expect("decodes"), ids);
        }

        #[test]
        fn distances_round_trip(distances in proptest::collection::vec(0.0f32..10.0, 0..200), zstd in any::<bool>()) {
            let compression = if zstd { Compression::Zstd } else { Compression::None };
            let encoded = encode_distances(&distances, compression).expect("encodes");
            prop_assert_eq!(decode_distances(&encoded).expect("decodes"), distances);
        }
    }
}
