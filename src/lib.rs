//! Batched block-sparse matrix multiplication on 32×32 tiles
//!
//! Facade over the workspace crates:
//!
//! - [`blocksparse_core`]: tile index, sparse layouts, tensors, primitives
//!   and engines
//! - [`blocksparse_matmul`]: SDD/DSD/DDS kernels, batch adapter and
//!   gradients
//!
//! # Example
//!
//! ```rust
//! use blocksparse::prelude::*;
//!
//! let layout = SparseLayout::lower_triangular(2).unwrap();
//! let op = BlockSparseMatmul::new(auto_engine());
//!
//! let x = Tensor::from_fn(vec![2, 64, 16], |i| (i % 5) as f32);
//! let scores = op.forward(&x, &x, Mode::Sdd, &layout, false, true).unwrap();
//! assert_eq!(scores.shape(), &[2, 3, 32, 32]);
//! ```

pub use blocksparse_core;
pub use blocksparse_matmul;

pub use blocksparse_core::{
    auto_engine, Error, ExecutionEngine, Orientation, Result, SparseLayout, Tensor, TileIndex,
    TILE,
};
pub use blocksparse_matmul::{
    batched_sparse_matmul, batched_sparse_matmul_backward, BlockSparseMatmul, Gradients,
    MatmulConfig, Mode,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use blocksparse_core::prelude::*;
    pub use blocksparse_core::auto_engine;
    pub use blocksparse_matmul::{
        batched_sparse_matmul, batched_sparse_matmul_backward, BlockSparseMatmul, Gradients,
        MatmulConfig, Mode,
    };
}
