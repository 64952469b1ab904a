// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Scalar QIM (Quantization Index Modulation) on a single DCT coefficient.
//!
//! Two interleaved lattices, each with spacing `step`:
//!
//! - Q_0: `{ n * step }` carries bit 0
//! - Q_1: `{ n * step + step / 2 }` carries bit 1
//!
//! Embedding snaps the coefficient to the nearest point of the lattice for
//! the bit. Decoding picks whichever lattice has the closer point, so any
//! disturbance smaller than `step / 4` leaves the decision unchanged.

/// Nearest point of the Q_`bit` lattice to `c`.
///
/// - bit 0: `round(c / step) * step`
/// - bit 1: `round((c - step/2) / step) * step + step/2`
///
/// `round` is round-half-to-even, so a `c` exactly between two points
/// snaps to the one with the even lattice index.
pub fn quantize_for_bit(c: f64, step: f64, bit: u8) -> f64 {
    debug_assert!(bit <= 1);
    if bit == 0 {
        (c / step).round_ties_even() * step
    } else {
        let half = step / 2.0;
        ((c - half) / step).round_ties_even() * step + half
    }
}

/// Absolute distances from `c` to the nearest Q_0 and Q_1 points.
fn lattice_distances(c: f64, step: f64) -> (f64, f64) {
    let d0 = (c - quantize_for_bit(c, step, 0)).abs();
    let d1 = (c - quantize_for_bit(c, step, 1)).abs();
    (d0, d1)
}

/// Hard decision: the bit whose lattice point is closer to `c`.
///
/// Exact ties decode as 0.
pub fn decide_bit(c: f64, step: f64) -> u8 {
    let (d0, d1) = lattice_distances(c, step);
    if d0 <= d1 {
        0
    } else {
        1
    }
}

/// Soft decision: `d1 - d0`.
///
/// Positive favors bit 0, negative favors bit 1. The magnitude is the
/// decision margin, at most `step / 2`.
pub fn soft_decision(c: f64, step: f64) -> f64 {
    let (d0, d1) = lattice_distances(c, step);
    d1 - d0
}

/// Candidate lattice points for `bit`, nearest to `c` first.
///
/// Yields the nearest Q_`bit` point, then alternates outward by one step on
/// each side, `max_steps` times per side.
pub fn lattice_candidates(c: f64, step: f64, bit: u8, max_steps: usize) -> impl Iterator<Item = f64> {
    let base = quantize_for_bit(c, step, bit);
    // Toward c first: the neighbour on c's side is closer than the other one.
    let toward = if c >= base { 1.0 } else { -1.0 };
    std::iter::once(base).chain((1..=max_steps).flat_map(move |k| {
        let k = k as f64;
        [base + toward * k * step, base - toward * k * step]
    }))
}
