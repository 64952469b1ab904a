// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Error types for frame sources and sinks.

use thiserror::Error;

/// Errors that can occur while reading or writing raw video frames.
#[derive(Debug, Error)]
pub enum VideoError {
    /// Underlying reader or writer failed.
    #[error("video I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The stream header is missing or malformed.
    #[error("invalid stream header: {0}")]
    InvalidHeader(String),
    /// The stream uses a chroma layout or bit depth that is not supported.
    #[error("unsupported colorspace: {0}")]
    UnsupportedColorspace(String),
    /// Width or height is zero or does not match the sample buffer.
    #[error("invalid frame dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// The stream ended in the middle of a frame.
    #[error("frame truncated: expected {expected} bytes, got {actual}")]
    TruncatedFrame { expected: usize, actual: usize },
    /// A frame handed to a sink does not match the stream geometry.
    #[error("frame size {actual_width}x{actual_height} does not match stream size {width}x{height}")]
    FrameSizeMismatch {
        width: usize,
        height: usize,
        actual_width: usize,
        actual_height: usize,
    },
}

pub type Result<T> = std::result::Result<T, VideoError>;
