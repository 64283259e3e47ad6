//! Compute primitives trait

/// Low-level vector operations used by the tile kernels
///
/// Default bodies are plain scalar loops; SIMD backends override them.
/// Every implementation must be deterministic for a fixed input so that
/// repeated calls produce bit-identical results.
pub trait ComputePrimitives: Clone + Send + Sync {
    /// Get the name of this backend
    fn backend_name(&self) -> &'static str;

    /// Get the SIMD width (number of f32 lanes processed in parallel)
    fn simd_width(&self) -> usize {
        1
    }

    /// Compute dot product of two vectors over their common length
    fn dot_product(&self, a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b.iter()).fold(0.0, |acc, (&x, &y)| acc + x * y)
    }

    /// `y[i] += alpha * x[i]` over the common length
    fn axpy(&self, alpha: f32, x: &[f32], y: &mut [f32]) {
        for (yi, &xi) in y.iter_mut().zip(x.iter()) {
            *yi += alpha * xi;
        }
    }
}
