// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Blind single-pass extraction.
//!
//! Blocks are decoded in canonical order and appended to an accumulator. As
//! soon as the accumulator holds a full header, the marker is checked and the
//! declared payload length fixes the total number of bits to read. Scanning
//! stops at exactly that many bits; a wrong marker stops it right away.
//!
//! Blocks are only transformed when their bit is needed: at most the rest of
//! the header before the length is known, at most the rest of the frame
//! afterwards.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::stego::error::StegoError;
use crate::stego::frame::{self, HEADER_BITS};
use crate::stego::qim::{decide_bit, soft_decision};
use crate::stego::QimParams;
use crate::video::blocks::{blocks, BlockPos};
use crate::video::{dct, Frame, FrameSource, Plane};

/// Payload recovered from a stego video.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub payload: Vec<u8>,
    /// Bits consumed from the video (header + payload).
    pub bits_read: usize,
    /// Frames that contributed at least one block.
    pub frames_scanned: usize,
    /// Smallest distance to the decision boundary seen on any block.
    /// Values close to 0 mean the stream barely survived.
    pub min_margin: f64,
}

/// Stateful extractor for one stream.
///
/// An error from [`push_bit`](Self::push_bit) or [`scan_frame`](Self::scan_frame)
/// is final; discard the extractor afterwards.
pub struct Extractor {
    params: QimParams,
    bits: Vec<u8>,
    required_bits: Option<usize>,
    frames_scanned: usize,
    blocks_decoded: usize,
    min_margin: f64,
}

impl Extractor {
    /// # Errors
    /// [`StegoError::InvalidParams`] if `params` do not validate.
    pub fn new(params: QimParams) -> Result<Self, StegoError> {
        params.validate()?;
        Ok(Self {
            params,
            bits: Vec::with_capacity(HEADER_BITS),
            required_bits: None,
            frames_scanned: 0,
            blocks_decoded: 0,
            min_margin: f64::INFINITY,
        })
    }

    /// Total bits to read, known once the header has been seen.
    pub fn required_bits(&self) -> Option<usize> {
        self.required_bits
    }

    /// Bits accumulated so far.
    pub fn bits_read(&self) -> usize {
        self.bits.len()
    }

    /// Blocks transformed so far.
    pub fn blocks_decoded(&self) -> usize {
        self.blocks_decoded
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.required_bits, Some(n) if self.bits.len() >= n)
    }

    /// Append one decided bit. Returns `true` once extraction is complete.
    ///
    /// # Errors
    /// [`StegoError::MarkerMismatch`] when the header completes with a wrong marker.
    pub fn push_bit(&mut self, bit: u8) -> Result<bool, StegoError> {
        if self.is_complete() {
            return Ok(true);
        }
        self.bits.push(bit & 1);

        if self.required_bits.is_none() && self.bits.len() == HEADER_BITS {
            let header = frame::bits_to_bytes(&self.bits)?;
            match frame::parse_header(&header) {
                Ok(payload_len) => {
                    let total = frame::frame_bits(payload_len);
                    tracing::debug!("marker verified");
                    tracing::info!(payload_bytes = payload_len, total_bits = total, "header parsed");
                    self.required_bits = Some(total);
                }
                Err(e) => {
                    tracing::warn!("marker not found at the start of the stream, stopping");
                    return Err(e);
                }
            }
        }

        Ok(self.is_complete())
    }

    /// Decode blocks of one frame until the frame ends or extraction completes.
    /// Returns `true` once extraction is complete.
    pub fn scan_frame(&mut self, frame: &Frame) -> Result<bool, StegoError> {
        if self.is_complete() {
            return Ok(true);
        }
        self.frames_scanned += 1;

        let mut positions = blocks(frame.width(), frame.height());
        while !self.is_complete() {
            let batch: Vec<BlockPos> = positions.by_ref().take(self.bits_wanted()).collect();
            if batch.is_empty() {
                break;
            }
            self.blocks_decoded += batch.len();
            for (bit, margin) in decode_blocks(&frame.luma, &batch, &self.params) {
                self.min_margin = self.min_margin.min(margin);
                self.push_bit(bit)?;
            }
        }

        tracing::trace!(
            frame = self.frames_scanned - 1,
            bits = self.bits.len(),
            "frame scanned"
        );
        Ok(self.is_complete())
    }

    /// Bits that can be decoded before the next decision point: the rest of
    /// the header, or the rest of the payload once its length is known.
    fn bits_wanted(&self) -> usize {
        self.required_bits
            .unwrap_or(HEADER_BITS)
            .saturating_sub(self.bits.len())
    }

    /// Close the run and parse the payload.
    ///
    /// # Errors
    /// [`StegoError::StreamTruncated`] if the header or payload is incomplete.
    pub fn finish(self) -> Result<Extracted, StegoError> {
        let required = match self.required_bits {
            Some(n) if self.bits.len() >= n => n,
            other => {
                let required_bits = other.unwrap_or(HEADER_BITS);
                tracing::warn!(
                    read_bits = self.bits.len(),
                    required_bits,
                    "video ended before extraction could be completed"
                );
                return Err(StegoError::StreamTruncated {
                    required_bits,
                    read_bits: self.bits.len(),
                });
            }
        };

        let payload = frame::parse(&self.bits[..required])?;
        tracing::info!(
            bits = required,
            payload_bytes = payload.len(),
            frames = self.frames_scanned,
            "extraction complete"
        );

        Ok(Extracted {
            payload,
            bits_read: required,
            frames_scanned: self.frames_scanned,
            min_margin: self.min_margin,
        })
    }
}

/// Decide one block: (bit, margin).
fn decode_block(plane: &Plane, pos: BlockPos, params: &QimParams) -> (u8, f64) {
    let c = dct::forward(&plane.read_block(pos.x, pos.y))[params.coeff_index()];
    (decide_bit(c, params.step), soft_decision(c, params.step).abs())
}

/// Decisions for `positions`, in the given order.
#[cfg(not(feature = "parallel"))]
fn decode_blocks(plane: &Plane, positions: &[BlockPos], params: &QimParams) -> Vec<(u8, f64)> {
    positions
        .iter()
        .map(|&pos| decode_block(plane, pos, params))
        .collect()
}

#[cfg(feature = "parallel")]
fn decode_blocks(plane: &Plane, positions: &[BlockPos], params: &QimParams) -> Vec<(u8, f64)> {
    positions
        .par_iter()
        .map(|&pos| decode_block(plane, pos, params))
        .collect()
}

/// Extract a payload from frames read from `source`.
///
/// Stops pulling frames as soon as the payload is complete.
///
/// # Errors
/// - [`StegoError::MarkerMismatch`] if the stream carries no frame marker.
/// - [`StegoError::StreamTruncated`] if the video ends too early.
/// - [`StegoError::Video`] if reading frames fails.
pub fn extract_stream<S: FrameSource>(mut source: S, params: &QimParams) -> Result<Extracted, StegoError> {
    let mut extractor = Extractor::new(*params)?;
    while !extractor.is_complete() {
        let Some(frame) = source.next_frame()? else {
            break;
        };
        extractor.scan_frame(&frame)?;
    }
    extractor.finish()
}

/// Extract a payload from an in-memory frame sequence.
pub fn extract_frames(frames: &[Frame], params: &QimParams) -> Result<Extracted, StegoError> {
    let mut extractor = Extractor::new(*params)?;
    for frame in frames {
        if extractor.scan_frame(frame)? {
            break;
        }
    }
    extractor.finish()
}
