// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Property-based tests for the bit codec, framing and the full pipeline.

use proptest::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use vciph_core::stego::frame::{self, MARKER};
use vciph_core::stego::qim::{decide_bit, quantize_for_bit, soft_decision};
use vciph_core::{embed_frames, extract_frames, Extractor, Frame, Plane, QimParams, StegoError};

// =============================================================================
// Bit codec
// =============================================================================

proptest! {
    /// A quantized coefficient decodes to the bit it was quantized for.
    #[test]
    fn quantized_coefficient_decodes(c in -2000.0f64..2000.0, bit in 0u8..=1, step in 1.0f64..32.0) {
        let q = quantize_for_bit(c, step, bit);
        prop_assert_eq!(decide_bit(q, step), bit);
        prop_assert!((q - c).abs() <= step / 2.0 + 1e-9);
    }

    /// Disturbances strictly below a quarter step never flip the decision.
    #[test]
    fn noise_below_quarter_step_is_tolerated(c in -2000.0f64..2000.0, bit in 0u8..=1, e in -0.99f64..0.99) {
        let step = 4.0;
        let q = quantize_for_bit(c, step, bit);
        prop_assert_eq!(decide_bit(q + e, step), bit);
    }

    /// The soft decision agrees with the hard one and is bounded by half a step.
    #[test]
    fn soft_decision_matches_hard(c in -500.0f64..500.0) {
        let step = 4.0;
        let s = soft_decision(c, step);
        prop_assert!(s.abs() <= step / 2.0 + 1e-9);
        if s > 0.0 {
            prop_assert_eq!(decide_bit(c, step), 0);
        } else if s < 0.0 {
            prop_assert_eq!(decide_bit(c, step), 1);
        }
    }
}

// =============================================================================
// Framing
// =============================================================================

proptest! {
    #[test]
    fn framing_roundtrip(payload in prop::collection::vec(any::<u8>(), 0..256)) {
        let bits = frame::serialize(&payload);
        prop_assert_eq!(bits.len(), 120 + payload.len() * 8);
        prop_assert_eq!(frame::parse(&bits).unwrap(), payload);
    }

    /// Any marker that differs from the real one is rejected.
    #[test]
    fn foreign_marker_is_rejected(marker in prop::collection::vec(any::<u8>(), 11), len in 0u32..64) {
        prop_assume!(marker.as_slice() != MARKER);
        let mut data = marker.clone();
        data.extend_from_slice(&len.to_be_bytes());
        data.resize(15 + len as usize, 0);
        match frame::parse_frame(&data) {
            Err(StegoError::MarkerMismatch { found, .. }) => prop_assert_eq!(found, marker),
            other => prop_assert!(false, "expected MarkerMismatch, got {:?}", other),
        }
    }

    /// A bitstream cut short anywhere never yields a payload.
    #[test]
    fn truncated_bitstream_is_reported(payload in prop::collection::vec(any::<u8>(), 1..64), cut in 0.0f64..1.0) {
        let bits = frame::serialize(&payload);
        let keep = ((bits.len() as f64) * cut) as usize;
        prop_assume!(keep < bits.len());

        let mut extractor = Extractor::new(QimParams::default()).unwrap();
        for &bit in &bits[..keep] {
            prop_assert!(!extractor.push_bit(bit).unwrap());
        }
        let is_truncated = matches!(extractor.finish(), Err(StegoError::StreamTruncated { .. }));
        prop_assert!(is_truncated);
    }
}

// =============================================================================
// Embedding pipeline
// =============================================================================

fn noise_frames(seed: u64, width: usize, height: usize, count: usize) -> Vec<Frame> {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let samples = (0..width * height).map(|_| rng.gen_range(48..208u8)).collect();
            Frame::mono(Plane::from_samples(width, height, samples).unwrap())
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn embed_extract_roundtrip(seed in any::<u64>(), payload in prop::collection::vec(any::<u8>(), 0..16)) {
        // 48 blocks per frame; 16 bytes need at most 248 bits.
        let mut frames = noise_frames(seed, 64, 48, 6);
        let params = QimParams::default();

        let report = embed_frames(&mut frames, &payload, &params).unwrap();
        prop_assert!(report.is_complete());

        let out = extract_frames(&frames, &params).unwrap();
        prop_assert_eq!(out.payload, payload);
    }
}
