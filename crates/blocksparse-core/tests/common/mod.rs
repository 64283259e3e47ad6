//! Shared utilities for integration tests

#![allow(dead_code)]

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Row-major tile mask with each tile set with probability `density`
pub fn random_mask(rows: usize, cols: usize, density: f64, seed: u64) -> Vec<bool> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..rows * cols).map(|_| rng.gen_bool(density)).collect()
}

/// Vector lengths around the SIMD width
pub fn edge_case_lengths() -> Vec<usize> {
    vec![
        0,  // Empty
        1,  // Single element
        7,  // AVX2 width - 1
        8,  // AVX2 width
        9,  // AVX2 width + 1
        31, // One short of a tile edge
        32, // Tile edge
        33, // Tile edge + 1
        100,
    ]
}

/// Uniform data in `[-1, 1)` from a fixed seed
pub fn random_vec(len: usize, seed: u64) -> Vec<f32> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen_range(-1.0..1.0)).collect()
}
