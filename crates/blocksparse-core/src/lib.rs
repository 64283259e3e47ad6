//! Core types for batched block-sparse matrix multiplication
//!
//! This crate provides the foundation the matmul kernels are built on:
//!
//! 1. **Tile Index** - which 32×32 tiles of a matrix are stored, with O(1)
//!    lookup of every tile in a tile-row or tile-column
//! 2. **Primitives** - vector operations with scalar and SIMD backends
//! 3. **Execution Engines** - sequential or Rayon-parallel scheduling of
//!    independent work units
//!
//! # Example
//!
//! ```rust
//! use blocksparse_core::{SparseLayout, TILE};
//!
//! // Causal pattern over a 4x4 tile grid (128x128 values)
//! let layout = SparseLayout::lower_triangular(4).unwrap();
//! assert_eq!(layout.n_blocks(), 10);
//!
//! // Every stored tile in tile-row 2
//! let row = layout.row_index().lookup(2).unwrap();
//! assert_eq!(row, &[[2, 0], [2, 1], [2, 2]]);
//! assert_eq!(TILE, 32);
//! ```

pub mod error;
pub mod execution;
pub mod layout;
pub mod primitives;
pub mod tensor;
pub mod tile;

// Re-export core types
pub use error::{Error, Result};

pub use execution::{
    auto_engine, scalar_sequential, simd_sequential, ExecutionEngine, ExecutionStrategy,
    SequentialEngine,
};
#[cfg(feature = "parallel")]
pub use execution::{scalar_parallel, simd_parallel, ParallelEngine};

pub use primitives::{best_backend_name, scalar_backend, Avx2Backend, ComputePrimitives, ScalarBackend};

#[cfg(all(target_arch = "x86_64", feature = "avx2"))]
pub use primitives::avx2_backend;

pub use layout::SparseLayout;
pub use tensor::Tensor;
pub use tile::{coordinate_pairs, load_tile, tiles_for, Orientation, TileIndex, TILE, TILE_AREA};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        ComputePrimitives, ExecutionEngine, Orientation, Result, ScalarBackend, SparseLayout,
        Tensor, TileIndex, TILE,
    };

    pub use crate::error::Error;

    // Common engine configurations
    #[cfg(feature = "parallel")]
    pub use crate::execution::simd_parallel;
    pub use crate::execution::{
        scalar_sequential, simd_sequential, ExecutionStrategy, SequentialEngine,
    };
}
