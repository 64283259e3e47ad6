//! Batched block-sparse matrix multiplication
//!
//! Computes `C = op(A) · op(B)` where exactly one of the three matrices is
//! block-sparse on 32×32 tiles:
//!
//! - [`Mode::Sdd`]: dense × dense, only the listed tiles of `C` are computed
//! - [`Mode::Dsd`]: block-sparse `A` times dense `B`
//! - [`Mode::Dds`]: dense `A` times block-sparse `B`
//!
//! Sparse operands are `[..., n_blocks, 32, 32]` tensors whose tiles follow
//! the row-major order of a [`SparseLayout`]. Leading batch dimensions are
//! carried through unchanged.
//!
//! # Example
//!
//! ```rust
//! use blocksparse_core::{scalar_sequential, SparseLayout, Tensor};
//! use blocksparse_matmul::{batched_sparse_matmul, Mode};
//!
//! let layout = SparseLayout::lower_triangular(2).unwrap();
//! let q = Tensor::from_fn(vec![64, 32], |_| 1.0);
//! let k = Tensor::from_fn(vec![64, 32], |_| 1.0);
//!
//! // Causal scores: only the three tiles on or below the diagonal
//! let scores = batched_sparse_matmul(&scalar_sequential(), &q, &k, Mode::Sdd, &layout, false, true)
//!     .unwrap();
//! assert_eq!(scores.shape(), &[3, 32, 32]);
//! assert!(scores.data().iter().all(|&v| v == 32.0));
//! ```

pub mod adapter;
pub mod backward;
pub mod config;
pub mod kernels;
pub mod mode;
pub mod reference;

pub use adapter::{batched_sparse_matmul, BlockSparseMatmul};
pub use backward::{batched_sparse_matmul_backward, Gradients};
pub use config::MatmulConfig;
pub use kernels::{dds, dsd, sdd, DenseBatch, SparseBatch};
pub use mode::{Mode, Operand};

// Re-export commonly used types from core
pub use blocksparse_core::{Error, Result, SparseLayout, Tensor, TileIndex, TILE};
