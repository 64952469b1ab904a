// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Orthonormal 8×8 DCT for luminance blocks.
//!
//! [`forward`] is the type-II DCT and [`inverse`] the type-III DCT, both with
//! orthonormal scaling so that `inverse(forward(x)) == x` up to rounding.
//! Blocks and coefficient grids are `[f64; 64]` in row-major order: index
//! `row * 8 + col`, where the row selects the vertical frequency.
//! No level shift and no quantization are applied.

use std::sync::OnceLock;

/// Pre-computed 8×8 cosine table.
/// `COSINE[u][x] = cos((2*x + 1) * u * PI / 16)`
static COSINE: OnceLock<[[f64; 8]; 8]> = OnceLock::new();

/// Normalization constants: C(0) = 1/sqrt(8), C(u>0) = 1/2.
static NORM: OnceLock<[f64; 8]> = OnceLock::new();

fn cosine_table() -> &'static [[f64; 8]; 8] {
    COSINE.get_or_init(|| {
        let mut table = [[0.0f64; 8]; 8];
        for (u, row) in table.iter_mut().enumerate() {
            for (x, entry) in row.iter_mut().enumerate() {
                *entry = ((2 * x + 1) as f64 * u as f64 * std::f64::consts::PI / 16.0).cos();
            }
        }
        table
    })
}

fn norm_table() -> &'static [f64; 8] {
    NORM.get_or_init(|| {
        let mut n = [0.5f64; 8];
        n[0] = 1.0 / (8.0f64).sqrt();
        n
    })
}

/// Forward 8×8 DCT: 64 samples → 64 coefficients.
pub fn forward(block: &[f64; 64]) -> [f64; 64] {
    let cos = cosine_table();
    let c = norm_table();

    // Rows first.
    let mut temp = [0.0f64; 64];
    for row in 0..8 {
        for u in 0..8 {
            let mut sum = 0.0;
            for x in 0..8 {
                sum += block[row * 8 + x] * cos[u][x];
            }
            temp[row * 8 + u] = c[u] * sum;
        }
    }

    // Then columns.
    let mut coeffs = [0.0f64; 64];
    for col in 0..8 {
        for v in 0..8 {
            let mut sum = 0.0;
            for y in 0..8 {
                sum += temp[y * 8 + col] * cos[v][y];
            }
            coeffs[v * 8 + col] = c[v] * sum;
        }
    }

    coeffs
}

/// Inverse 8×8 DCT: 64 coefficients → 64 samples.
pub fn inverse(coeffs: &[f64; 64]) -> [f64; 64] {
    let cos = cosine_table();
    let c = norm_table();

    // Columns first.
    let mut temp = [0.0f64; 64];
    for col in 0..8 {
        for y in 0..8 {
            let mut sum = 0.0;
            for v in 0..8 {
                sum += c[v] * coeffs[v * 8 + col] * cos[v][y];
            }
            temp[y * 8 + col] = sum;
        }
    }

    // Then rows.
    let mut block = [0.0f64; 64];
    for row in 0..8 {
        for x in 0..8 {
            let mut sum = 0.0;
            for u in 0..8 {
                sum += c[u] * temp[row * 8 + u] * cos[u][x];
            }
            block[row * 8 + x] = sum;
        }
    }

    block
}
