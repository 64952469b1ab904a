// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Steganographic embedding and extraction on video luminance.
//!
//! A payload is wrapped in a self-describing frame (marker + length), turned
//! into a bitstream and spread one bit per 8×8 luminance block, frame after
//! frame. Each bit is carried by QIM on one mid-frequency DCT coefficient.
//! Extraction is blind: it needs no side information besides [`QimParams`],
//! which must match the ones used for embedding.
//!
//! The scheme is fragile by nature. It survives 8-bit storage of the samples
//! but not lossy re-encoding, scaling or cropping.

pub mod capacity;
pub mod embed;
pub mod error;
pub mod extract;
pub mod frame;
pub mod qim;

pub use embed::{embed_frames, embed_stream, EmbedReport, Embedder, PartialEmbedWarning};
pub use error::StegoError;
pub use extract::{extract_frames, extract_stream, Extracted, Extractor};

/// Default quantization step.
pub const DEFAULT_QUANT_STEP: f64 = 4.0;

/// Default carrier coefficient: row 2, column 1 of the 8×8 DCT block
/// (vertical frequency 2, horizontal frequency 1).
pub const DEFAULT_COEFF_ROW: usize = 2;
pub const DEFAULT_COEFF_COL: usize = 1;

/// Embedding parameters. Embedder and extractor must agree on all of them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QimParams {
    /// Lattice spacing `q`. Larger steps tolerate more noise and cost more
    /// distortion.
    pub step: f64,
    /// Row (vertical frequency) of the carrier coefficient.
    pub coeff_row: usize,
    /// Column (horizontal frequency) of the carrier coefficient.
    pub coeff_col: usize,
}

impl Default for QimParams {
    fn default() -> Self {
        Self {
            step: DEFAULT_QUANT_STEP,
            coeff_row: DEFAULT_COEFF_ROW,
            coeff_col: DEFAULT_COEFF_COL,
        }
    }
}

impl QimParams {
    pub fn with_step(step: f64) -> Self {
        Self { step, ..Self::default() }
    }

    /// # Errors
    /// [`StegoError::InvalidParams`] if the step is not a finite positive
    /// number or the coefficient lies outside the 8×8 block.
    pub fn validate(&self) -> Result<(), StegoError> {
        if !self.step.is_finite() || self.step <= 0.0 {
            return Err(StegoError::InvalidParams("quantization step must be finite and positive"));
        }
        if self.coeff_row >= 8 || self.coeff_col >= 8 {
            return Err(StegoError::InvalidParams("coefficient position must be inside the 8x8 block"));
        }
        if self.coeff_row == 0 && self.coeff_col == 0 {
            return Err(StegoError::InvalidParams("the DC coefficient cannot carry bits"));
        }
        Ok(())
    }

    /// Row-major index of the carrier coefficient in a 64-entry block.
    pub fn coeff_index(&self) -> usize {
        self.coeff_row * 8 + self.coeff_col
    }
}
