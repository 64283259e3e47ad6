//! Batch/shape adapter
//!
//! Flattens leading batch dimensions, picks the kernel for a mode and the
//! index orientation it consumes, and restores the caller's batch
//! dimensions on the result. Nothing here touches tile values.

use crate::config::MatmulConfig;
use crate::kernels::{self, DenseBatch, SparseBatch};
use crate::mode::Mode;
use blocksparse_core::{
    tiles_for, Error, ExecutionEngine, Orientation, Result, SequentialEngine, SparseLayout, Tensor,
    TILE,
};
use tracing::{debug, instrument};

/// Leading batch dimensions of one operand
#[derive(Clone, Debug, PartialEq, Eq)]
struct BatchShape {
    dims: Vec<usize>,
}

impl BatchShape {
    /// Split a dense `[..., rows, cols]` operand
    fn dense(t: &Tensor, name: &str) -> Result<(Self, usize, usize)> {
        match t.shape() {
            [dims @ .., rows, cols] => Ok((Self { dims: dims.to_vec() }, *rows, *cols)),
            _ => Err(Error::shape_mismatch(
                name,
                format!("dense operand needs at least 2 dimensions, got {:?}", t.shape()),
            )),
        }
    }

    /// Split a sparse `[..., n_blocks, 32, 32]` operand
    fn sparse(t: &Tensor, n_blocks: usize, name: &str) -> Result<Self> {
        match t.shape() {
            [dims @ .., blocks, TILE, TILE] if *blocks == n_blocks => Ok(Self {
                dims: dims.to_vec(),
            }),
            other => Err(Error::shape_mismatch(
                name,
                format!("sparse operand must be [..., {n_blocks}, 32, 32], got {other:?}"),
            )),
        }
    }

    fn size(&self) -> usize {
        self.dims.iter().product()
    }

    fn with_trailing(&self, trailing: &[usize]) -> Vec<usize> {
        let mut shape = self.dims.clone();
        shape.extend_from_slice(trailing);
        shape
    }
}

/// Index orientation the sparse operand of `mode` is read through
fn sparse_orientation(mode: Mode, trans_a: bool, trans_b: bool) -> Orientation {
    match mode {
        Mode::Sdd => Orientation::Row,
        Mode::Dsd if trans_a => Orientation::Col,
        Mode::Dsd => Orientation::Row,
        Mode::Dds if trans_b => Orientation::Row,
        Mode::Dds => Orientation::Col,
    }
}

/// Independent work units of a call: output tiles for SDD, output
/// tile-rows or tile-columns otherwise, times the batch count
fn work_units(
    a: &Tensor,
    b: &Tensor,
    mode: Mode,
    layout: &SparseLayout,
    trans_a: bool,
    trans_b: bool,
) -> usize {
    let index = layout.index_for(sparse_orientation(mode, trans_a, trans_b));
    match mode {
        Mode::Sdd => a.leading_size(2) * layout.n_blocks(),
        Mode::Dsd => b.leading_size(2) * index.n_lines(),
        Mode::Dds => a.leading_size(2) * index.n_lines(),
    }
}

/// Batched block-sparse `C = op(A) · op(B)`
///
/// Shapes by mode, with `...` any number of batch dimensions:
/// - `sdd`: `a` `[..., M, K]`, `b` `[..., K, N]`, result
///   `[..., n_blocks, 32, 32]` in the layout's row-major tile order
/// - `dsd`: `a` `[..., n_blocks, 32, 32]`, `b` `[..., K, N]`, result
///   `[..., M, N]` with `M` the tile-rows of `op(A)` times 32
/// - `dds`: `a` `[..., M, K]`, `b` `[..., n_blocks, 32, 32]`, result
///   `[..., M, N]` with `N` the tile-columns of `op(B)` times 32
///
/// Transpose flags apply to the stored matrices (dense) or to every tile
/// (sparse). The result keeps the batch dimensions of the dense operand
/// (`b` for `dsd`, `a` otherwise); both operands must flatten to the same
/// batch count.
#[instrument(level = "debug", skip_all, fields(mode = %mode, trans_a = trans_a, trans_b = trans_b))]
pub fn batched_sparse_matmul<E: ExecutionEngine>(
    engine: &E,
    a: &Tensor,
    b: &Tensor,
    mode: Mode,
    layout: &SparseLayout,
    trans_a: bool,
    trans_b: bool,
) -> Result<Tensor> {
    let index = layout.index_for(sparse_orientation(mode, trans_a, trans_b));

    match mode {
        Mode::Sdd => {
            let (batch, a_rows, a_cols) = BatchShape::dense(a, "sdd operand A")?;
            let (b_batch, b_rows, b_cols) = BatchShape::dense(b, "sdd operand B")?;
            let ad = DenseBatch::new(a.data(), batch.size(), a_rows, a_cols, trans_a)?;
            let bd = DenseBatch::new(b.data(), b_batch.size(), b_rows, b_cols, trans_b)?;
            let (m, n) = (ad.op_rows(), bd.op_cols());
            if (tiles_for(m), tiles_for(n)) != (layout.tile_rows(), layout.tile_cols()) {
                return Err(Error::shape_mismatch(
                    "sdd output",
                    format!(
                        "{m}x{n} product does not cover the {}x{} tile layout",
                        layout.tile_rows(),
                        layout.tile_cols()
                    ),
                ));
            }
            debug!(batch = batch.size(), m, n, blocks = layout.n_blocks(), "dispatching sdd");
            let out = kernels::sdd(engine, &ad, &bd, layout.coordinates())?;
            Tensor::new(batch.with_trailing(&[layout.n_blocks(), TILE, TILE]), out)
        }
        Mode::Dsd => {
            let a_batch = BatchShape::sparse(a, layout.n_blocks(), "dsd operand A")?;
            let (batch, b_rows, b_cols) = BatchShape::dense(b, "dsd operand B")?;
            let sa = SparseBatch::new(a.data(), a_batch.size(), layout.n_blocks(), trans_a)?;
            let bd = DenseBatch::new(b.data(), batch.size(), b_rows, b_cols, trans_b)?;
            let (m, n) = (index.n_lines() * TILE, bd.op_cols());
            debug!(batch = batch.size(), m, n, blocks = layout.n_blocks(), "dispatching dsd");
            let out = kernels::dsd(engine, &sa, index, &bd)?;
            Tensor::new(batch.with_trailing(&[m, n]), out)
        }
        Mode::Dds => {
            let (batch, a_rows, a_cols) = BatchShape::dense(a, "dds operand A")?;
            let b_batch = BatchShape::sparse(b, layout.n_blocks(), "dds operand B")?;
            let ad = DenseBatch::new(a.data(), batch.size(), a_rows, a_cols, trans_a)?;
            let sb = SparseBatch::new(b.data(), b_batch.size(), layout.n_blocks(), trans_b)?;
            let (m, n) = (ad.op_rows(), index.n_lines() * TILE);
            debug!(batch = batch.size(), m, n, blocks = layout.n_blocks(), "dispatching dds");
            let out = kernels::dds(engine, &ad, &sb, index)?;
            Tensor::new(batch.with_trailing(&[m, n]), out)
        }
    }
}

/// Block-sparse matmul bound to an engine and a [`MatmulConfig`]
#[derive(Clone, Debug)]
pub struct BlockSparseMatmul<E: ExecutionEngine> {
    engine: E,
    config: MatmulConfig,
}

impl<E: ExecutionEngine> BlockSparseMatmul<E> {
    /// Create with the default configuration
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            config: MatmulConfig::default(),
        }
    }

    /// Create with a validated configuration
    pub fn with_config(engine: E, config: MatmulConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { engine, config })
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn config(&self) -> &MatmulConfig {
        &self.config
    }

    /// Forward product; small calls stay on the calling thread per the
    /// configured strategy
    pub fn forward(
        &self,
        a: &Tensor,
        b: &Tensor,
        mode: Mode,
        layout: &SparseLayout,
        trans_a: bool,
        trans_b: bool,
    ) -> Result<Tensor> {
        let units = work_units(a, b, mode, layout, trans_a, trans_b);
        if self.runs_locally(units) {
            debug!(units, "running forward sequentially");
            let local = SequentialEngine::new(self.engine.primitives().clone());
            batched_sparse_matmul(&local, a, b, mode, layout, trans_a, trans_b)
        } else {
            batched_sparse_matmul(&self.engine, a, b, mode, layout, trans_a, trans_b)
        }
    }

    /// Gradients of the forward product; see
    /// [`batched_sparse_matmul_backward`](crate::batched_sparse_matmul_backward)
    #[allow(clippy::too_many_arguments)]
    pub fn backward(
        &self,
        grad_c: &Tensor,
        a: &Tensor,
        b: &Tensor,
        mode: Mode,
        layout: &SparseLayout,
        trans_a: bool,
        trans_b: bool,
        needs_grad: [bool; 2],
    ) -> Result<crate::Gradients> {
        use crate::backward::batched_sparse_matmul_backward;

        let units = work_units(a, b, mode, layout, trans_a, trans_b);
        if self.runs_locally(units) {
            debug!(units, "running backward sequentially");
            let local = SequentialEngine::new(self.engine.primitives().clone());
            batched_sparse_matmul_backward(
                &local, grad_c, a, b, mode, layout, trans_a, trans_b, needs_grad,
            )
        } else {
            batched_sparse_matmul_backward(
                &self.engine, grad_c, a, b, mode, layout, trans_a, trans_b, needs_grad,
            )
        }
    }

    /// A parallel engine hands calls below the configured size to a
    /// sequential engine over the same primitives
    fn runs_locally(&self, units: usize) -> bool {
        self.engine.is_parallel() && self.config.runs_sequential(units)
    }
}
