// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Embedding: spread a framed payload over consecutive luminance blocks.
//!
//! Each complete 8×8 block of each frame, in canonical order, takes the next
//! bit of the frame bitstream. The designated DCT coefficient is snapped
//! onto the QIM lattice for that bit, the block is transformed back and
//! stored as 8-bit samples. Once the bitstream is exhausted the rest of the
//! video is passed through byte-for-byte.
//!
//! Storing the block as integers disturbs the coefficient again. Each block
//! is therefore re-measured after rounding; if the bit no longer decodes,
//! the next points of the same lattice are tried (nearest first) until one
//! survives rounding.

use std::fmt;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::stego::error::StegoError;
use crate::stego::frame::{self, HEADER_BYTES};
use crate::stego::qim::{decide_bit, lattice_candidates};
use crate::stego::QimParams;
use crate::video::blocks::{blocks, blocks_per_frame};
use crate::video::{dct, read_block, to_sample, write_block, Frame, FrameSink, FrameSource, Plane};

/// Extra lattice points tried on each side when rounding flips a bit.
pub const MAX_LATTICE_STEPS: usize = 4;

/// Result of one [`BitCursor::advance`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// Next bit to embed.
    Bit(u8),
    /// The bitstream ran out on this call.
    Exhausted,
    /// The bitstream ran out earlier; everything from here passes through.
    PassThrough,
}

/// Read position in the frame bitstream, owned by one embedding run.
#[derive(Debug, Clone)]
pub struct BitCursor {
    bits: Vec<u8>,
    pos: usize,
    exhausted: bool,
}

impl BitCursor {
    pub fn new(bits: Vec<u8>) -> Self {
        Self { bits, pos: 0, exhausted: false }
    }

    /// Hand out the next bit, or report exhaustion exactly once.
    pub fn advance(&mut self) -> CursorState {
        if self.exhausted {
            return CursorState::PassThrough;
        }
        match self.bits.get(self.pos) {
            Some(&bit) => {
                self.pos += 1;
                CursorState::Bit(bit)
            }
            None => {
                self.exhausted = true;
                CursorState::Exhausted
            }
        }
    }

    /// Bits handed out so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.bits.len() - self.pos
    }
}

/// How one block ended up after embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockOutcome {
    /// Nearest lattice point survived rounding.
    Exact,
    /// A farther lattice point had to be used.
    Adjusted,
    /// No candidate survived; the nearest one was written anyway.
    Unverified,
}

/// Embedding ran out of carrier blocks before the bitstream was exhausted.
///
/// The output video is still complete and valid, but the payload cannot be
/// recovered from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartialEmbedWarning {
    pub bits_embedded: usize,
    pub bits_required: usize,
}

impl fmt::Display for PartialEmbedWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "end of video reached but only {} of {} bits were embedded",
            self.bits_embedded, self.bits_required
        )
    }
}

/// Summary of one embedding run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedReport {
    /// Frame bitstream length (header + payload) in bits.
    pub bits_required: usize,
    /// Bits actually written into the video.
    pub bits_embedded: usize,
    /// Frames that went through the embedder.
    pub frames_total: usize,
    /// Frames with at least one embedded bit.
    pub frames_modified: usize,
    /// Blocks where the nearest lattice point did not survive rounding.
    pub adjusted_blocks: usize,
    /// Blocks where no lattice point survived rounding.
    pub unverified_blocks: usize,
}

impl EmbedReport {
    /// `true` if the whole bitstream made it into the video.
    pub fn is_complete(&self) -> bool {
        self.bits_embedded == self.bits_required
    }

    /// The partial-embedding warning, if capacity ran out.
    pub fn warning(&self) -> Option<PartialEmbedWarning> {
        if self.is_complete() {
            None
        } else {
            Some(PartialEmbedWarning {
                bits_embedded: self.bits_embedded,
                bits_required: self.bits_required,
            })
        }
    }
}

/// Stateful embedder for one payload.
///
/// Feed every frame of the video, in order, through [`embed_frame`](Self::embed_frame)
/// and write each one out afterwards, whether or not it was modified.
pub struct Embedder {
    params: QimParams,
    cursor: BitCursor,
    frames_total: usize,
    frames_modified: usize,
    adjusted_blocks: usize,
    unverified_blocks: usize,
}

impl Embedder {
    /// Frame `payload` and prepare to embed it.
    ///
    /// # Errors
    /// - [`StegoError::InvalidParams`] if `params` do not validate.
    /// - [`StegoError::PayloadTooLarge`] if the payload exceeds the length field.
    pub fn new(payload: &[u8], params: QimParams) -> Result<Self, StegoError> {
        params.validate()?;
        frame::check_payload_len(payload.len())?;

        let bits = frame::serialize(payload);
        tracing::info!(
            payload_bytes = payload.len(),
            header_bytes = HEADER_BYTES,
            bitstream_bits = bits.len(),
            "payload framed"
        );

        Ok(Self {
            params,
            cursor: BitCursor::new(bits),
            frames_total: 0,
            frames_modified: 0,
            adjusted_blocks: 0,
            unverified_blocks: 0,
        })
    }

    /// `true` once every bit has been embedded.
    pub fn is_complete(&self) -> bool {
        self.cursor.remaining() == 0
    }

    pub fn bits_required(&self) -> usize {
        self.cursor.len()
    }

    pub fn bits_embedded(&self) -> usize {
        self.cursor.position()
    }

    /// Embed as many bits as fit into this frame's luminance plane.
    ///
    /// Returns the number of bits embedded. Frames after the end of the
    /// bitstream are left untouched.
    pub fn embed_frame(&mut self, frame: &mut Frame) -> usize {
        self.frames_total += 1;
        let (width, height) = (frame.width(), frame.height());

        let mut batch = Vec::with_capacity(blocks_per_frame(width, height).min(self.cursor.remaining()));
        for _ in blocks(width, height) {
            match self.cursor.advance() {
                CursorState::Bit(bit) => batch.push(bit),
                CursorState::Exhausted => {
                    tracing::info!(
                        bits = self.cursor.position(),
                        frames = self.frames_total,
                        "embedding complete"
                    );
                    break;
                }
                CursorState::PassThrough => break,
            }
        }

        if batch.is_empty() {
            return 0;
        }

        let outcomes = embed_blocks(&mut frame.luma, &batch, &self.params);
        for outcome in outcomes {
            match outcome {
                BlockOutcome::Exact => {}
                BlockOutcome::Adjusted => self.adjusted_blocks += 1,
                BlockOutcome::Unverified => self.unverified_blocks += 1,
            }
        }
        self.frames_modified += 1;

        tracing::debug!(
            frame = self.frames_total - 1,
            bits = batch.len(),
            remaining = self.cursor.remaining(),
            "frame embedded"
        );
        batch.len()
    }

    /// Close the run and report.
    pub fn finish(self) -> EmbedReport {
        let report = EmbedReport {
            bits_required: self.cursor.len(),
            bits_embedded: self.cursor.position(),
            frames_total: self.frames_total,
            frames_modified: self.frames_modified,
            adjusted_blocks: self.adjusted_blocks,
            unverified_blocks: self.unverified_blocks,
        };

        if let Some(warning) = report.warning() {
            tracing::warn!(
                bits_embedded = warning.bits_embedded,
                bits_required = warning.bits_required,
                "{warning}"
            );
        } else {
            tracing::info!(
                bits = report.bits_embedded,
                frames = report.frames_modified,
                "payload embedded"
            );
        }
        if report.unverified_blocks > 0 {
            tracing::warn!(
                blocks = report.unverified_blocks,
                "some blocks could not be verified after rounding"
            );
        }

        report
    }
}

/// Embed `bits` into the first `bits.len()` blocks of `plane`, in canonical order.
#[cfg(not(feature = "parallel"))]
fn embed_blocks(plane: &mut Plane, bits: &[u8], params: &QimParams) -> Vec<BlockOutcome> {
    let width = plane.width();
    let positions = blocks(width, plane.height());
    positions
        .zip(bits)
        .map(|(pos, &bit)| embed_bit(plane.samples_mut(), width, pos.x, pos.y, bit, params))
        .collect()
}

/// Parallel variant: one rayon task per 8-row band. Bands are disjoint and
/// bit `i` still lands in block `i`, so the result is identical.
#[cfg(feature = "parallel")]
fn embed_blocks(plane: &mut Plane, bits: &[u8], params: &QimParams) -> Vec<BlockOutcome> {
    use crate::video::blocks::BLOCK_SIZE;

    let width = plane.width();
    let per_band = width / BLOCK_SIZE;
    if per_band == 0 {
        return Vec::new();
    }

    let bands: Vec<Vec<BlockOutcome>> = plane
        .samples_mut()
        .par_chunks_mut(width * BLOCK_SIZE)
        .zip(bits.par_chunks(per_band))
        .map(|(band, band_bits)| {
            band_bits
                .iter()
                .enumerate()
                .map(|(col, &bit)| embed_bit(band, width, col * BLOCK_SIZE, 0, bit, params))
                .collect()
        })
        .collect();

    bands.into_iter().flatten().collect()
}

/// Embed one bit into the block at `(x, y)` of a row-major sample buffer.
fn embed_bit(
    samples: &mut [u8],
    stride: usize,
    x: usize,
    y: usize,
    bit: u8,
    params: &QimParams,
) -> BlockOutcome {
    let idx = params.coeff_index();
    let mut coeffs = dct::forward(&read_block(samples, stride, x, y));
    let c = coeffs[idx];

    let mut nearest = None;
    for (attempt, target) in lattice_candidates(c, params.step, bit, MAX_LATTICE_STEPS).enumerate() {
        coeffs[idx] = target;
        let stored = dct::inverse(&coeffs).map(|v| to_sample(v) as f64);
        let measured = dct::forward(&stored)[idx];

        if decide_bit(measured, params.step) == bit {
            write_block(samples, stride, x, y, &stored);
            return if attempt == 0 {
                BlockOutcome::Exact
            } else {
                BlockOutcome::Adjusted
            };
        }
        nearest.get_or_insert(stored);
    }

    if let Some(stored) = nearest {
        write_block(samples, stride, x, y, &stored);
    }
    BlockOutcome::Unverified
}

/// Embed `payload` into a video read from `source`, writing every frame to `sink`.
///
/// Frames are written in arrival order, modified or not. Running out of
/// frames is not an error; check [`EmbedReport::warning`].
pub fn embed_stream<S, K>(
    mut source: S,
    mut sink: K,
    payload: &[u8],
    params: &QimParams,
) -> Result<EmbedReport, StegoError>
where
    S: FrameSource,
    K: FrameSink,
{
    let mut embedder = Embedder::new(payload, *params)?;
    while let Some(mut frame) = source.next_frame()? {
        embedder.embed_frame(&mut frame);
        sink.write_frame(&frame)?;
    }
    sink.finish()?;
    Ok(embedder.finish())
}

/// Embed `payload` into an in-memory frame sequence.
pub fn embed_frames(frames: &mut [Frame], payload: &[u8], params: &QimParams) -> Result<EmbedReport, StegoError> {
    let mut embedder = Embedder::new(payload, *params)?;
    for frame in frames.iter_mut() {
        embedder.embed_frame(frame);
    }
    Ok(embedder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stego::qim::decide_bit;
    use crate::video::Plane;

    fn textured_plane(width: usize, height: usize) -> Plane {
        let mut plane = Plane::filled(width, height, 0);
        for y in 0..height {
            for x in 0..width {
                let v = 128.0 + 40.0 * ((x as f64) * 0.9).sin() * ((y as f64) * 0.6).cos()
                    + ((x * 7 + y * 13) % 11) as f64;
                plane.set(x, y, v.round() as u8);
            }
        }
        plane
    }

    fn measured_bit(plane: &Plane, x: usize, y: usize, params: &QimParams) -> u8 {
        let c = dct::forward(&plane.read_block(x, y))[params.coeff_index()];
        decide_bit(c, params.step)
    }

    #[test]
    fn cursor_tri_state() {
        let mut cursor = BitCursor::new(vec![1, 0]);
        assert_eq!(cursor.advance(), CursorState::Bit(1));
        assert_eq!(cursor.advance(), CursorState::Bit(0));
        assert_eq!(cursor.remaining(), 0);
        assert_eq!(cursor.advance(), CursorState::Exhausted);
        assert_eq!(cursor.advance(), CursorState::PassThrough);
        assert_eq!(cursor.advance(), CursorState::PassThrough);
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn embedded_bits_survive_rounding() {
        let params = QimParams::default();
        for bit in 0..=1 {
            let mut plane = textured_plane(64, 64);
            for pos in blocks(64, 64) {
                let outcome = embed_bit(plane.samples_mut(), 64, pos.x, pos.y, bit, &params);
                assert_ne!(outcome, BlockOutcome::Unverified);
            }
            for pos in blocks(64, 64) {
                assert_eq!(measured_bit(&plane, pos.x, pos.y, &params), bit);
            }
        }
    }

    #[test]
    fn flat_blocks_need_adjustment_for_one_bits() {
        // A flat block has coefficient 0. Snapping it to 2 moves samples by
        // less than half a level, which rounding undoes; a farther point is used.
        let params = QimParams::default();
        let mut plane = Plane::filled(8, 8, 128);
        let outcome = embed_bit(plane.samples_mut(), 8, 0, 0, 1, &params);
        assert_eq!(outcome, BlockOutcome::Adjusted);
        assert_eq!(measured_bit(&plane, 0, 0, &params), 1);

        let mut plane = Plane::filled(8, 8, 128);
        let outcome = embed_bit(plane.samples_mut(), 8, 0, 0, 0, &params);
        assert_eq!(outcome, BlockOutcome::Exact);
        assert_eq!(plane, Plane::filled(8, 8, 128));
    }

    #[test]
    fn embed_frame_consumes_one_bit_per_block() {
        let mut embedder = Embedder::new(&[0xAB; 10], QimParams::default()).unwrap();
        assert_eq!(embedder.bits_required(), 200);

        let mut frame = Frame::mono(textured_plane(64, 48));
        assert_eq!(embedder.embed_frame(&mut frame), 48);
        assert_eq!(embedder.bits_embedded(), 48);
        assert!(!embedder.is_complete());
    }

    #[test]
    fn frames_after_exhaustion_pass_through() {
        let mut frames: Vec<Frame> = (0..5).map(|_| Frame::mono(textured_plane(64, 48))).collect();
        let original = frames.clone();

        // 144 bits → frames 0..2 full, then 0 bits for frames 3 and 4.
        let report = embed_frames(&mut frames, b"ABC", &QimParams::default()).unwrap();
        assert!(report.is_complete());
        assert_eq!(report.bits_embedded, 144);
        assert_eq!(report.frames_total, 5);
        assert_eq!(report.frames_modified, 3);
        assert_eq!(report.unverified_blocks, 0);
        assert_eq!(frames[3], original[3]);
        assert_eq!(frames[4], original[4]);
    }

    #[test]
    fn blocks_after_last_bit_are_untouched() {
        // 60x40 → 7 x 5 = 35 blocks per frame; 144 bits → 4 full frames + 4 blocks.
        let mut frames: Vec<Frame> = (0..5).map(|_| Frame::mono(textured_plane(60, 40))).collect();
        let original = frames.clone();
        let report = embed_frames(&mut frames, b"ABC", &QimParams::default()).unwrap();
        assert!(report.is_complete());

        let last = &frames[4].luma;
        let orig = &original[4].luma;
        for (i, pos) in blocks(60, 40).enumerate() {
            if i >= 4 {
                assert_eq!(last.read_block(pos.x, pos.y), orig.read_block(pos.x, pos.y), "block {i}");
            }
        }
        // Ragged right margin (columns 56..60) is never written.
        for y in 0..40 {
            for x in 56..60 {
                assert_eq!(frames[0].luma.get(x, y), original[0].luma.get(x, y));
            }
        }
    }

    #[test]
    fn capacity_shortfall_is_a_warning() {
        let mut frames: Vec<Frame> = (0..2).map(|_| Frame::mono(textured_plane(64, 48))).collect();
        let report = embed_frames(&mut frames, b"ABC", &QimParams::default()).unwrap();
        assert!(!report.is_complete());
        assert_eq!(
            report.warning(),
            Some(PartialEmbedWarning { bits_embedded: 96, bits_required: 144 })
        );
        assert_eq!(
            report.warning().unwrap().to_string(),
            "end of video reached but only 96 of 144 bits were embedded"
        );
    }

    #[test]
    fn chroma_is_never_touched() {
        let chroma = vec![Plane::filled(32, 24, 90), Plane::filled(32, 24, 160)];
        let mut frames = vec![Frame { luma: textured_plane(64, 48), chroma: chroma.clone() }; 3];
        embed_frames(&mut frames, b"ABC", &QimParams::default()).unwrap();
        for f in &frames {
            assert_eq!(f.chroma, chroma);
        }
    }

    #[test]
    fn invalid_params_are_rejected() {
        let params = QimParams { step: 0.0, ..QimParams::default() };
        assert!(matches!(
            Embedder::new(b"x", params),
            Err(StegoError::InvalidParams(_))
        ));
    }
}
