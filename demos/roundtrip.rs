// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Example: embed random bytes into a synthetic 4:2:0 video, extract them
//! again and compare SHA-256 digests.
//!
//! ```text
//! roundtrip [width] [height] [payload-bytes]
//! ```
use std::time::Instant;

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::{Digest, Sha256};
use vciph_core::stego::capacity::frames_needed;
use vciph_core::{embed_frames, extract_frames, Frame, Plane, QimParams};

fn synthetic_frame(rng: &mut ChaCha20Rng, width: usize, height: usize, t: usize) -> Frame {
    let mut luma = Plane::filled(width, height, 0);
    for y in 0..height {
        for x in 0..width {
            let wave = 50.0 * ((x as f64 * 0.05 + t as f64 * 0.3).sin() * (y as f64 * 0.07).cos());
            let grain: f64 = rng.gen_range(-6.0..6.0);
            luma.set(x, y, (128.0 + wave + grain).round().clamp(0.0, 255.0) as u8);
        }
    }
    let (cw, ch) = (width.div_ceil(2), height.div_ceil(2));
    Frame {
        luma,
        chroma: vec![Plane::filled(cw, ch, 110), Plane::filled(cw, ch, 140)],
    }
}

fn main() {
    tracing::subscriber::set_global_default(
        tracing_subscriber::fmt().with_target(false).finish(),
    )
    .expect("Could not install log subscriber");

    let args: Vec<usize> = std::env::args()
        .skip(1)
        .map(|a| a.parse().expect("arguments must be numbers"))
        .collect();
    let width = args.first().copied().unwrap_or(640);
    let height = args.get(1).copied().unwrap_or(360);
    let payload_len = args.get(2).copied().unwrap_or(4096);

    let mut rng = ChaCha20Rng::seed_from_u64(0x5EED);
    let mut payload = vec![0u8; payload_len];
    rng.fill_bytes(&mut payload);

    let count = frames_needed(width, height, payload_len).expect("Frames too small for any block");
    let mut frames: Vec<Frame> = (0..count + 1).map(|t| synthetic_frame(&mut rng, width, height, t)).collect();
    let params = QimParams::default();

    let start = Instant::now();
    let report = embed_frames(&mut frames, &payload, &params).expect("Embedding failed");
    let embed_time = start.elapsed();

    let start = Instant::now();
    let out = extract_frames(&frames, &params).expect("Extraction failed");
    let extract_time = start.elapsed();

    let before = Sha256::digest(&payload);
    let after = Sha256::digest(&out.payload);

    println!("{width}x{height}, {} frames, payload {payload_len} bytes", frames.len());
    println!(
        "Embed:   {:?} ({} bits, {} adjusted, {} unverified)",
        embed_time, report.bits_embedded, report.adjusted_blocks, report.unverified_blocks
    );
    println!("Extract: {:?} ({} frames scanned, min margin {:.3})", extract_time, out.frames_scanned, out.min_margin);
    println!("SHA-256 in:  {}", hex::encode(before));
    println!("SHA-256 out: {}", hex::encode(after));

    if before != after {
        eprintln!("MISMATCH");
        std::process::exit(1);
    }
    println!("OK");
}
