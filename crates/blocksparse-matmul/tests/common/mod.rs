//! Shared utilities for integration tests

#![allow(dead_code)]

use blocksparse_core::{SparseLayout, Tensor};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Tolerance for f32 kernels against the f64-accumulating reference,
/// relative for values above one
pub const TOLERANCE: f32 = 1e-3;

/// Tensor of uniform values in `[-1, 1)` from a fixed seed
pub fn random_tensor(shape: Vec<usize>, seed: u64) -> Tensor {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    Tensor::from_fn(shape, |_| rng.gen_range(-1.0..1.0))
}

/// Layout over `rows × cols` tiles keeping each tile with probability
/// `density`
pub fn random_layout(rows: usize, cols: usize, density: f64, seed: u64) -> SparseLayout {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mask: Vec<bool> = (0..rows * cols).map(|_| rng.gen_bool(density)).collect();
    SparseLayout::from_mask(rows, cols, &mask).unwrap()
}

/// Assert two tensors have the same shape and close values
pub fn assert_tensors_close(actual: &Tensor, expected: &Tensor, context: &str) {
    assert_eq!(
        actual.shape(),
        expected.shape(),
        "shape mismatch for {context}"
    );
    for (i, (a, e)) in actual.data().iter().zip(expected.data()).enumerate() {
        assert!(
            (a - e).abs() <= TOLERANCE * e.abs().max(1.0),
            "{context}: element {i} differs, got {a}, expected {e}"
        );
    }
}
