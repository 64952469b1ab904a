// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Error types for the steganography pipeline.
//!
//! [`StegoError`] covers every fatal condition from bitstream parsing to
//! frame I/O. Running out of carrier capacity while embedding is not an
//! error: it is reported through
//! [`PartialEmbedWarning`](crate::stego::embed::PartialEmbedWarning).

use thiserror::Error;

use crate::video::VideoError;

/// Errors that can occur during embedding or extraction.
#[derive(Debug, Error)]
pub enum StegoError {
    /// The leading bytes of the recovered stream are not the frame marker.
    /// Either the video carries no payload or it was read in a different
    /// block order / with different parameters.
    #[error("marker not found: expected {}, got {}", hex::encode(.expected), hex::encode(.found))]
    MarkerMismatch { expected: Vec<u8>, found: Vec<u8> },
    /// Fewer bytes than a full header (marker + length).
    #[error("incomplete header: need {needed} bytes, have {available}")]
    IncompleteHeader { needed: usize, available: usize },
    /// Header parsed, but fewer payload bytes follow than it declares.
    #[error("payload incomplete: expected {declared} bytes, got {available}")]
    TruncatedPayload { declared: usize, available: usize },
    /// The frame sequence ended before enough bits were recovered.
    /// `required_bits` is the header size while the header is still unread.
    #[error("video ended after {read_bits} of {required_bits} bits")]
    StreamTruncated { required_bits: usize, read_bits: usize },
    /// A bitstream handed to the parser is not a whole number of bytes.
    #[error("bitstream length {bits} is not a multiple of 8")]
    UnalignedBitstream { bits: usize },
    /// The payload does not fit the 4-byte length field.
    #[error("payload of {len} bytes exceeds the 4 GiB frame limit")]
    PayloadTooLarge { len: usize },
    /// Embedding parameters are unusable.
    #[error("invalid parameters: {0}")]
    InvalidParams(&'static str),
    /// Reading or writing frames failed.
    #[error(transparent)]
    Video(#[from] VideoError),
}
