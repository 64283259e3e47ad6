//! AVX2 dot product for f32

use super::utils::horizontal_sum_ps;
use std::arch::x86_64::*;

/// AVX2 implementation of dot product over the common length
#[target_feature(enable = "avx2", enable = "fma")]
pub unsafe fn dot_product_f32(a: &[f32], b: &[f32]) -> f32 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }

    let chunks = n / 8;
    let mut sum_vec = _mm256_setzero_ps();

    // Main loop - process 8 elements at a time
    for i in 0..chunks {
        let offset = i * 8;
        let a_vec = _mm256_loadu_ps(a.as_ptr().add(offset));
        let b_vec = _mm256_loadu_ps(b.as_ptr().add(offset));
        sum_vec = _mm256_fmadd_ps(a_vec, b_vec, sum_vec);
    }

    let mut sum = horizontal_sum_ps(sum_vec);

    // Handle remainder
    for i in chunks * 8..n {
        sum += a[i] * b[i];
    }

    sum
}
