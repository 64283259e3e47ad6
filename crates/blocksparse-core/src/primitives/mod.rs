//! Computational primitives with compile-time dispatch
//!
//! The block-sparse kernels reduce every tile product to two vector
//! operations: dot products and `y += alpha * x` updates. This
//! module provides them behind one trait with interchangeable backends.
//!
//! # Architecture
//!
//! - Single `ComputePrimitives` trait for all operations
//! - Concrete backend types: `ScalarBackend`, `Avx2Backend`
//! - Compile-time backend selection with runtime validation
//! - No heap allocation or dynamic dispatch
//!
//! # Usage
//!
//! ```rust,ignore
//! // Explicit backend selection - panics if not supported
//! let backend = Avx2Backend::new();
//! let d = backend.dot_product(&a, &b);
//!
//! // Use with execution engines
//! let engine = SequentialEngine::new(ScalarBackend::new());
//! ```

pub mod backends;
pub mod traits;

pub use backends::{Avx2Backend, ScalarBackend};
pub use traits::ComputePrimitives;

/// Create a scalar backend (always available)
pub fn scalar_backend() -> ScalarBackend {
    ScalarBackend::new()
}

/// Create an AVX2 backend (panics if not supported)
#[cfg(all(target_arch = "x86_64", feature = "avx2"))]
pub fn avx2_backend() -> Avx2Backend {
    Avx2Backend::new()
}

/// Get the best available backend name
pub fn best_backend_name() -> &'static str {
    #[cfg(all(target_arch = "x86_64", feature = "avx2"))]
    {
        if Avx2Backend::is_available() {
            return "avx2";
        }
    }
    "scalar"
}
