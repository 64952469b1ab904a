// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! # vciph-core
//!
//! Hides an arbitrary byte payload in the luminance of an uncompressed video
//! and recovers it blindly. One bit is carried per complete 8×8 luma block by
//! quantization index modulation (QIM) of a single mid-frequency DCT
//! coefficient. Chroma planes are never touched.
//!
//! - `video`: planes, frames, the 8×8 DCT, block traversal and a Y4M
//!   reader/writer.
//! - `stego`: payload framing, the QIM bit codec, the embedder and the
//!   extractor.
//!
//! The `parallel` feature spreads per-frame block work over rayon threads.
//! Output is bit-identical to the sequential build.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use vciph_core::{embed_frames, extract_frames, QimParams};
//!
//! let params = QimParams::default();
//! let report = embed_frames(&mut frames, b"hello", &params).unwrap();
//! assert!(report.is_complete());
//! let out = extract_frames(&frames, &params).unwrap();
//! assert_eq!(out.payload, b"hello");
//! ```

pub mod stego;
pub mod video;

pub use stego::capacity::{frames_needed, max_payload_len};
pub use stego::{
    embed_frames, embed_stream, extract_frames, extract_stream, EmbedReport, Embedder, Extracted,
    Extractor, PartialEmbedWarning, QimParams, StegoError,
};
pub use video::error::VideoError;
pub use video::y4m::{Y4mReader, Y4mWriter};
pub use video::{Frame, FrameSink, FrameSource, Plane};
