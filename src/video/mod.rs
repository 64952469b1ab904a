// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Raw video frames and the sample-level plumbing around them.
//!
//! The steganography layer only ever sees [`Frame`]s: a luminance [`Plane`]
//! that may be modified, plus chroma planes that are carried through
//! untouched. Frames come from a [`FrameSource`] and go to a [`FrameSink`];
//! [`y4m`] provides both for uncompressed YUV4MPEG2 streams, and in-memory
//! collections implement them for tests and embedding into decoded buffers.

pub mod blocks;
pub mod dct;
pub mod error;
pub mod y4m;

use std::collections::VecDeque;

use self::blocks::BLOCK_SIZE;
pub use self::error::VideoError;

/// One 8-bit sample plane in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plane {
    width: usize,
    height: usize,
    samples: Vec<u8>,
}

impl Plane {
    /// Create a plane filled with `value`.
    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            samples: vec![value; width * height],
        }
    }

    /// Wrap an existing sample buffer.
    ///
    /// # Errors
    /// [`VideoError::InvalidDimensions`] if `samples.len() != width * height`.
    pub fn from_samples(width: usize, height: usize, samples: Vec<u8>) -> Result<Self, VideoError> {
        if width.checked_mul(height) != Some(samples.len()) {
            return Err(VideoError::InvalidDimensions { width, height });
        }
        Ok(Self { width, height, samples })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [u8] {
        &mut self.samples
    }

    pub fn into_samples(self) -> Vec<u8> {
        self.samples
    }

    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.samples[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        self.samples[y * self.width + x] = value;
    }

    /// Copy the 8×8 block with top-left corner `(x, y)` out as reals.
    pub fn read_block(&self, x: usize, y: usize) -> [f64; 64] {
        read_block(&self.samples, self.width, x, y)
    }

    /// Round, clamp into 0..=255 and store an 8×8 block at `(x, y)`.
    pub fn write_block(&mut self, x: usize, y: usize, block: &[f64; 64]) {
        write_block(&mut self.samples, self.width, x, y, block)
    }
}

/// Read an 8×8 block from a row-major sample buffer with the given stride.
pub(crate) fn read_block(samples: &[u8], stride: usize, x: usize, y: usize) -> [f64; 64] {
    let mut block = [0.0f64; 64];
    for row in 0..BLOCK_SIZE {
        let start = (y + row) * stride + x;
        for (col, &s) in samples[start..start + BLOCK_SIZE].iter().enumerate() {
            block[row * 8 + col] = s as f64;
        }
    }
    block
}

/// Write an 8×8 block into a row-major sample buffer with the given stride.
pub(crate) fn write_block(samples: &mut [u8], stride: usize, x: usize, y: usize, block: &[f64; 64]) {
    for row in 0..BLOCK_SIZE {
        let start = (y + row) * stride + x;
        for (col, s) in samples[start..start + BLOCK_SIZE].iter_mut().enumerate() {
            *s = to_sample(block[row * 8 + col]);
        }
    }
}

/// Round to nearest and clamp into the 8-bit sample range.
pub(crate) fn to_sample(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// One decoded video frame.
///
/// `chroma` holds the two colour-difference planes (Cb, Cr) or nothing for
/// monochrome streams. They are never modified by this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub luma: Plane,
    pub chroma: Vec<Plane>,
}

impl Frame {
    /// Frame with a luminance plane only.
    pub fn mono(luma: Plane) -> Self {
        Self { luma, chroma: Vec::new() }
    }

    pub fn width(&self) -> usize {
        self.luma.width()
    }

    pub fn height(&self) -> usize {
        self.luma.height()
    }
}

/// Supplier of decoded frames in presentation order.
pub trait FrameSource {
    /// Next frame, or `Ok(None)` at end of stream.
    fn next_frame(&mut self) -> Result<Option<Frame>, VideoError>;
}

/// Consumer of frames, in the order they are handed over.
pub trait FrameSink {
    fn write_frame(&mut self, frame: &Frame) -> Result<(), VideoError>;

    /// Flush whatever the sink buffers. Called once after the last frame.
    fn finish(&mut self) -> Result<(), VideoError> {
        Ok(())
    }
}

impl FrameSource for VecDeque<Frame> {
    fn next_frame(&mut self) -> Result<Option<Frame>, VideoError> {
        Ok(self.pop_front())
    }
}

impl FrameSink for Vec<Frame> {
    fn write_frame(&mut self, frame: &Frame) -> Result<(), VideoError> {
        self.push(frame.clone());
        Ok(())
    }
}

impl<S: FrameSource + ?Sized> FrameSource for &mut S {
    fn next_frame(&mut self) -> Result<Option<Frame>, VideoError> {
        (**self).next_frame()
    }
}

impl<K: FrameSink + ?Sized> FrameSink for &mut K {
    fn write_frame(&mut self, frame: &Frame) -> Result<(), VideoError> {
        (**self).write_frame(frame)
    }

    fn finish(&mut self) -> Result<(), VideoError> {
        (**self).finish()
    }
}
