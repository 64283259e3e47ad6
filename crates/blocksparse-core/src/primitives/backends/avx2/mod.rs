//! AVX2 backend implementation
//!
//! f32 kernels built on `std::arch` intrinsics, one module per operation.
//! The intrinsics are only compiled with the `avx2` feature on x86_64; on
//! other builds the backend exists but cannot be constructed.

#[cfg(all(target_arch = "x86_64", feature = "avx2"))]
mod axpy;
#[cfg(all(target_arch = "x86_64", feature = "avx2"))]
mod dot_product;
#[cfg(all(target_arch = "x86_64", feature = "avx2"))]
mod utils;

use crate::primitives::ComputePrimitives;

/// AVX2 backend for x86_64 processors
#[derive(Clone, Copy, Debug)]
pub struct Avx2Backend;

impl Avx2Backend {
    /// Create a new AVX2 backend
    ///
    /// # Panics
    /// Panics if the CPU doesn't support AVX2 and FMA instructions
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        #[cfg(all(target_arch = "x86_64", feature = "avx2"))]
        {
            if !Self::is_available() {
                panic!("AVX2 backend requested but CPU doesn't support AVX2/FMA instructions");
            }
            Self
        }
        #[cfg(not(all(target_arch = "x86_64", feature = "avx2")))]
        {
            panic!("AVX2 backend not available: not compiled with AVX2 support");
        }
    }

    /// Check if AVX2 is available on this CPU
    pub fn is_available() -> bool {
        #[cfg(all(target_arch = "x86_64", feature = "avx2"))]
        {
            is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma")
        }
        #[cfg(not(all(target_arch = "x86_64", feature = "avx2")))]
        {
            false
        }
    }
}

#[cfg(all(target_arch = "x86_64", feature = "avx2"))]
impl ComputePrimitives for Avx2Backend {
    fn backend_name(&self) -> &'static str {
        "avx2"
    }

    fn simd_width(&self) -> usize {
        8
    }

    fn dot_product(&self, a: &[f32], b: &[f32]) -> f32 {
        // Safety: We checked CPU support in new()
        unsafe { dot_product::dot_product_f32(a, b) }
    }

    fn axpy(&self, alpha: f32, x: &[f32], y: &mut [f32]) {
        // Safety: We checked CPU support in new()
        unsafe { axpy::axpy_f32(alpha, x, y) }
    }
}

// Fallback for non-AVX2 builds
#[cfg(not(all(target_arch = "x86_64", feature = "avx2")))]
impl ComputePrimitives for Avx2Backend {
    fn backend_name(&self) -> &'static str {
        "avx2 (unavailable)"
    }
}
