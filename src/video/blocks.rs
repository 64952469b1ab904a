// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Canonical block order for one luminance plane.
//!
//! Blocks are visited band by band from the top, left to right within each
//! band. The embedder and the extractor must walk frames in exactly this
//! order, otherwise every bit after the first divergence is misassigned.
//!
//! Only complete 8×8 blocks are produced. When the width or height is not a
//! multiple of 8, the ragged right and bottom margins carry no bits and are
//! never touched.

/// Side length of a transform block in samples.
pub const BLOCK_SIZE: usize = 8;

/// Top-left sample coordinate of one 8×8 block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockPos {
    /// Sample row of the block's top edge.
    pub y: usize,
    /// Sample column of the block's left edge.
    pub x: usize,
}

/// Iterator over the complete blocks of a `width` × `height` plane.
///
/// Cheap to construct; create a fresh one per frame.
#[derive(Debug, Clone)]
pub struct BlockIter {
    width: usize,
    height: usize,
    y: usize,
    x: usize,
}

impl BlockIter {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, y: 0, x: 0 }
    }
}

impl Iterator for BlockIter {
    type Item = BlockPos;

    fn next(&mut self) -> Option<BlockPos> {
        if self.width < BLOCK_SIZE {
            return None;
        }
        if self.x + BLOCK_SIZE > self.width {
            self.x = 0;
            self.y += BLOCK_SIZE;
        }
        if self.y + BLOCK_SIZE > self.height {
            return None;
        }

        let pos = BlockPos { y: self.y, x: self.x };
        self.x += BLOCK_SIZE;
        Some(pos)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = remaining_blocks(self.width, self.height, self.y, self.x);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for BlockIter {}

fn remaining_blocks(width: usize, height: usize, y: usize, x: usize) -> usize {
    let per_band = width / BLOCK_SIZE;
    if per_band == 0 || y + BLOCK_SIZE > height {
        return 0;
    }
    let bands_after = (height - y) / BLOCK_SIZE - 1;
    let left_in_band = per_band.saturating_sub(x / BLOCK_SIZE);
    left_in_band + bands_after * per_band
}

/// Iterate the complete 8×8 blocks of a plane in canonical order.
pub fn blocks(width: usize, height: usize) -> BlockIter {
    BlockIter::new(width, height)
}

/// Number of complete blocks (and therefore carrier bits) in one plane.
pub fn blocks_per_frame(width: usize, height: usize) -> usize {
    (width / BLOCK_SIZE) * (height / BLOCK_SIZE)
}
