// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Payload frame construction and parsing.
//!
//! The frame is the self-describing container that is spread over the video
//! one bit per block:
//!
//! ```text
//! [11 bytes] marker "VCiph_START"
//! [4 bytes ] payload length L (big-endian u32)
//! [L bytes ] payload
//! ```
//!
//! Bits are taken most-significant first within each byte. The marker is part
//! of the wire format; changing it breaks every existing stego stream.

use crate::stego::error::StegoError;

/// Frame marker.
pub const MARKER: &[u8] = b"VCiph_START";

/// Size of the big-endian payload length field.
pub const LEN_FIELD_BYTES: usize = 4;

/// Marker + length field.
pub const HEADER_BYTES: usize = MARKER.len() + LEN_FIELD_BYTES; // 15

/// Header size in carrier bits.
pub const HEADER_BITS: usize = HEADER_BYTES * 8; // 120

/// Largest payload the length field can describe.
pub const MAX_PAYLOAD_LEN: usize = u32::MAX as usize;

/// Total frame size in bits for a payload of `payload_len` bytes.
pub fn frame_bits(payload_len: usize) -> usize {
    HEADER_BITS.saturating_add(payload_len.saturating_mul(8))
}

/// Build a frame: marker, big-endian length, payload.
///
/// The caller must ensure `payload.len() <= MAX_PAYLOAD_LEN`; see
/// [`check_payload_len`].
pub fn build_frame(payload: &[u8]) -> Vec<u8> {
    debug_assert!(payload.len() <= MAX_PAYLOAD_LEN, "payload length exceeds u32");

    let mut frame = Vec::with_capacity(HEADER_BYTES + payload.len());
    frame.extend_from_slice(MARKER);
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(payload);
    frame
}

/// Reject payloads that do not fit the length field.
pub fn check_payload_len(len: usize) -> Result<(), StegoError> {
    if len > MAX_PAYLOAD_LEN {
        return Err(StegoError::PayloadTooLarge { len });
    }
    Ok(())
}

/// Serialize a payload into its frame bitstream (one `u8` per bit, 0 or 1).
pub fn serialize(payload: &[u8]) -> Vec<u8> {
    bytes_to_bits(&build_frame(payload))
}

/// Expand bytes into bits, most significant bit first.
pub fn bytes_to_bits(bytes: &[u8]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(bytes.len() * 8);
    for &byte in bytes {
        for shift in (0..8).rev() {
            bits.push((byte >> shift) & 1);
        }
    }
    bits
}

/// Pack bits (MSB first) back into bytes.
///
/// # Errors
/// [`StegoError::UnalignedBitstream`] if `bits.len()` is not a multiple of 8.
pub fn bits_to_bytes(bits: &[u8]) -> Result<Vec<u8>, StegoError> {
    if bits.len() % 8 != 0 {
        return Err(StegoError::UnalignedBitstream { bits: bits.len() });
    }
    Ok(bits
        .chunks_exact(8)
        .map(|chunk| chunk.iter().fold(0u8, |acc, &b| (acc << 1) | (b & 1)))
        .collect())
}

/// Validate the marker and read the declared payload length.
///
/// Only the first [`HEADER_BYTES`] of `data` are inspected.
///
/// # Errors
/// - [`StegoError::IncompleteHeader`] if `data` is shorter than the header.
/// - [`StegoError::MarkerMismatch`] if the marker bytes differ.
pub fn parse_header(data: &[u8]) -> Result<usize, StegoError> {
    if data.len() < HEADER_BYTES {
        return Err(StegoError::IncompleteHeader {
            needed: HEADER_BYTES,
            available: data.len(),
        });
    }

    let found = &data[..MARKER.len()];
    if found != MARKER {
        return Err(StegoError::MarkerMismatch {
            expected: MARKER.to_vec(),
            found: found.to_vec(),
        });
    }

    let mut len_bytes = [0u8; LEN_FIELD_BYTES];
    len_bytes.copy_from_slice(&data[MARKER.len()..HEADER_BYTES]);
    Ok(u32::from_be_bytes(len_bytes) as usize)
}

/// Parse a frame from bytes and return its payload.
///
/// Bytes beyond the declared payload are ignored.
///
/// # Errors
/// Everything [`parse_header`] reports, plus [`StegoError::TruncatedPayload`]
/// when fewer payload bytes follow the header than it declares.
pub fn parse_frame(data: &[u8]) -> Result<Vec<u8>, StegoError> {
    let declared = parse_header(data)?;
    let body = &data[HEADER_BYTES..];
    if body.len() < declared {
        return Err(StegoError::TruncatedPayload {
            declared,
            available: body.len(),
        });
    }
    Ok(body[..declared].to_vec())
}

/// Parse a frame bitstream and return its payload.
pub fn parse(bits: &[u8]) -> Result<Vec<u8>, StegoError> {
    parse_frame(&bits_to_bytes(bits)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_constants() {
        assert_eq!(MARKER.len(), 11);
        assert_eq!(HEADER_BYTES, 15);
        assert_eq!(HEADER_BITS, 120);
        assert_eq!(frame_bits(3), 144);
        assert_eq!(frame_bits(0), 120);
    }

    #[test]
    fn build_frame_layout() {
        let frame = build_frame(&[0x41, 0x42, 0x43]);
        assert_eq!(&frame[..11], b"VCiph_START");
        assert_eq!(&frame[11..15], &[0, 0, 0, 3]);
        assert_eq!(&frame[15..], &[0x41, 0x42, 0x43]);
    }

    #[test]
    fn bits_are_msb_first() {
        assert_eq!(bytes_to_bits(&[0b1010_0001]), vec![1, 0, 1, 0, 0, 0, 0, 1]);
        assert_eq!(bits_to_bytes(&[0, 1, 0, 0, 0, 0, 0, 1]).unwrap(), vec![0x41]);
    }

    #[test]
    fn serialize_length() {
        let bits = serialize(&[0x41, 0x42, 0x43]);
        assert_eq!(bits.len(), 144);
        assert!(bits.iter().all(|&b| b <= 1));
        // 'V' = 0x56 = 0101_0110
        assert_eq!(&bits[..8], &[0, 1, 0, 1, 0, 1, 1, 0]);
    }

    #[test]
    fn parse_roundtrip() {
        let payload = b"some hidden bytes \x00\xff";
        assert_eq!(parse(&serialize(payload)).unwrap(), payload);
        assert_eq!(parse(&serialize(&[])).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn trailing_bits_are_ignored() {
        let mut bits = serialize(b"abc");
        bits.extend_from_slice(&[1; 64]);
        assert_eq!(parse(&bits).unwrap(), b"abc");
    }

    #[test]
    fn unaligned_bitstream() {
        let mut bits = serialize(b"abc");
        bits.pop();
        match parse(&bits) {
            Err(StegoError::UnalignedBitstream { bits: 143 }) => {}
            other => panic!("expected UnalignedBitstream, got {other:?}"),
        }
    }

    #[test]
    fn incomplete_header() {
        let frame = build_frame(b"abc");
        match parse_frame(&frame[..14]) {
            Err(StegoError::IncompleteHeader { needed: 15, available: 14 }) => {}
            other => panic!("expected IncompleteHeader, got {other:?}"),
        }
    }

    #[test]
    fn marker_is_case_sensitive() {
        let mut frame = build_frame(b"abc");
        frame[0] = b'v';
        match parse_frame(&frame) {
            Err(StegoError::MarkerMismatch { expected, found }) => {
                assert_eq!(expected, MARKER);
                assert_eq!(found, b"vCiph_START");
            }
            other => panic!("expected MarkerMismatch, got {other:?}"),
        }
    }

    #[test]
    fn truncated_payload() {
        let frame = build_frame(b"abcdef");
        match parse_frame(&frame[..frame.len() - 2]) {
            Err(StegoError::TruncatedPayload { declared: 6, available: 4 }) => {}
            other => panic!("expected TruncatedPayload, got {other:?}"),
        }
    }

    #[test]
    fn huge_declared_length_is_truncated_not_panic() {
        let mut frame = build_frame(b"");
        frame[11..15].copy_from_slice(&u32::MAX.to_be_bytes());
        assert_eq!(parse_header(&frame).unwrap(), u32::MAX as usize);
        assert!(matches!(
            parse_frame(&frame),
            Err(StegoError::TruncatedPayload { available: 0, .. })
        ));
    }

    #[test]
    fn payload_len_limit() {
        assert!(check_payload_len(0).is_ok());
        assert!(check_payload_len(MAX_PAYLOAD_LEN).is_ok());
        if let Some(too_big) = MAX_PAYLOAD_LEN.checked_add(1) {
            assert!(matches!(
                check_payload_len(too_big),
                Err(StegoError::PayloadTooLarge { .. })
            ));
        }
    }

    #[test]
    fn error_messages_carry_counts() {
        let err = StegoError::TruncatedPayload { declared: 10, available: 3 };
        assert_eq!(err.to_string(), "payload incomplete: expected 10 bytes, got 3");

        let err = parse_frame(&[0u8; 15]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "marker not found: expected 56436970685f5354415254, got 0000000000000000000000"
        );
    }
}
