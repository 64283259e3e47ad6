//! Scalar backend implementation
//!
//! Plain loops without any SIMD instructions; always available.

use crate::primitives::ComputePrimitives;

/// Scalar backend
#[derive(Clone, Copy, Debug, Default)]
pub struct ScalarBackend;

impl ScalarBackend {
    pub fn new() -> Self {
        Self
    }
}

impl ComputePrimitives for ScalarBackend {
    fn backend_name(&self) -> &'static str {
        "scalar"
    }

    // All operations use the default implementations from the trait
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_operations() {
        let backend = ScalarBackend::new();
        assert_eq!(backend.backend_name(), "scalar");
        assert_eq!(backend.simd_width(), 1);

        let a = [1.0, 2.0, 3.0];
        let b = [4.0, 5.0, 6.0, 100.0];
        assert_eq!(backend.dot_product(&a, &b), 32.0);

        let mut y = [1.0, 1.0, 1.0];
        backend.axpy(2.0, &a, &mut y);
        assert_eq!(y, [3.0, 5.0, 7.0]);
    }

    #[test]
    fn test_empty_inputs() {
        let backend = ScalarBackend::new();
        assert_eq!(backend.dot_product(&[], &[]), 0.0);
        let mut y: [f32; 0] = [];
        backend.axpy(3.0, &[], &mut y);
    }
}
