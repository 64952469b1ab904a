// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Carrier capacity estimation.
//!
//! Every complete 8×8 luminance block carries exactly one bit, so capacity is
//! a pure function of frame geometry and frame count. A payload of `L` bytes
//! needs `(15 + L) * 8` bits including the frame header.

use crate::stego::frame::{self, HEADER_BITS, MAX_PAYLOAD_LEN};
use crate::video::blocks::blocks_per_frame;

/// Carrier bits in one `width` × `height` frame.
pub fn frame_capacity_bits(width: usize, height: usize) -> usize {
    blocks_per_frame(width, height)
}

/// Carrier bits across `frames` frames of the same size.
pub fn stream_capacity_bits(width: usize, height: usize, frames: usize) -> usize {
    frame_capacity_bits(width, height).saturating_mul(frames)
}

/// Bits needed to embed a payload of `payload_len` bytes, header included.
pub fn required_bits(payload_len: usize) -> usize {
    frame::frame_bits(payload_len)
}

/// Largest payload (in bytes) that fits in `frames` frames.
///
/// Returns 0 if not even the header fits.
pub fn max_payload_len(width: usize, height: usize, frames: usize) -> usize {
    let total = stream_capacity_bits(width, height, frames);
    if total < HEADER_BITS {
        return 0;
    }
    ((total - HEADER_BITS) / 8).min(MAX_PAYLOAD_LEN)
}

/// Number of frames needed to carry a payload of `payload_len` bytes, or
/// `None` if the frames are too small to carry anything.
pub fn frames_needed(width: usize, height: usize, payload_len: usize) -> Option<usize> {
    let per_frame = frame_capacity_bits(width, height);
    if per_frame == 0 {
        return None;
    }
    Some(required_bits(payload_len).div_ceil(per_frame))
}
