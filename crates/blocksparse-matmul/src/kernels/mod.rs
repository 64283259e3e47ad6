//! Block-sparse matmul kernels
//!
//! Kernels operate on canonical flattened shapes only:
//! - dense operands: `[batch, rows, cols]`, row-major
//! - sparse operands: `[batch, n_blocks, 32, 32]`
//!
//! Transpose flags never materialize a transposed copy of a dense operand;
//! they select which stored axis plays the row role inside the inner loops.
//! A transposed sparse operand transposes each 32×32 tile as it is loaded.
//!
//! All validation runs before the output buffer is allocated, so a kernel
//! either returns a complete result or an error.

mod dds;
mod dsd;
mod sdd;

pub use dds::dds;
pub use dsd::dsd;
pub use sdd::sdd;

use blocksparse_core::{tiles_for, Error, Orientation, Result, TileIndex, TILE_AREA};

/// One stored (untransposed) matrix of a dense batch
#[derive(Clone, Copy, Debug)]
pub(crate) struct Matrix<'a> {
    data: &'a [f32],
    cols: usize,
}

impl<'a> Matrix<'a> {
    /// Stored row `i`
    #[inline]
    pub(crate) fn row(&self, i: usize) -> &'a [f32] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    #[inline]
    pub(crate) fn at(&self, i: usize, j: usize) -> f32 {
        self.data[i * self.cols + j]
    }
}

/// Borrowed dense operand of shape `[batch, rows, cols]`
///
/// `rows`/`cols` describe storage; with `trans` set the operand takes part
/// in the product as its transpose.
#[derive(Clone, Copy, Debug)]
pub struct DenseBatch<'a> {
    data: &'a [f32],
    batch: usize,
    rows: usize,
    cols: usize,
    trans: bool,
}

impl<'a> DenseBatch<'a> {
    pub fn new(data: &'a [f32], batch: usize, rows: usize, cols: usize, trans: bool) -> Result<Self> {
        let expected = batch * rows * cols;
        if data.len() != expected {
            return Err(Error::shape_mismatch(
                "dense operand",
                format!(
                    "[{batch}, {rows}, {cols}] needs {expected} values, got {}",
                    data.len()
                ),
            ));
        }
        Ok(Self {
            data,
            batch,
            rows,
            cols,
            trans,
        })
    }

    pub fn batch(&self) -> usize {
        self.batch
    }

    pub fn is_transposed(&self) -> bool {
        self.trans
    }

    /// Rows of the operand as it enters the product
    pub fn op_rows(&self) -> usize {
        if self.trans {
            self.cols
        } else {
            self.rows
        }
    }

    /// Columns of the operand as it enters the product
    pub fn op_cols(&self) -> usize {
        if self.trans {
            self.rows
        } else {
            self.cols
        }
    }

    pub(crate) fn matrix(&self, batch: usize) -> Matrix<'a> {
        let plane = self.rows * self.cols;
        Matrix {
            data: &self.data[batch * plane..(batch + 1) * plane],
            cols: self.cols,
        }
    }
}

/// Borrowed block-sparse operand of shape `[batch, n_blocks, 32, 32]`
#[derive(Clone, Copy, Debug)]
pub struct SparseBatch<'a> {
    data: &'a [f32],
    batch: usize,
    n_blocks: usize,
    trans: bool,
}

impl<'a> SparseBatch<'a> {
    pub fn new(data: &'a [f32], batch: usize, n_blocks: usize, trans: bool) -> Result<Self> {
        let expected = batch * n_blocks * TILE_AREA;
        if data.len() != expected {
            return Err(Error::shape_mismatch(
                "sparse operand",
                format!(
                    "[{batch}, {n_blocks}, 32, 32] needs {expected} values, got {}",
                    data.len()
                ),
            ));
        }
        Ok(Self {
            data,
            batch,
            n_blocks,
            trans,
        })
    }

    pub fn batch(&self) -> usize {
        self.batch
    }

    pub fn n_blocks(&self) -> usize {
        self.n_blocks
    }

    pub fn is_transposed(&self) -> bool {
        self.trans
    }

    /// Payload of tile `slot` in batch `batch`
    #[inline]
    pub(crate) fn tile(&self, batch: usize, slot: usize) -> &'a [f32] {
        let start = (batch * self.n_blocks + slot) * TILE_AREA;
        &self.data[start..start + TILE_AREA]
    }
}

pub(crate) fn check_batches(context: &str, a: usize, b: usize) -> Result<()> {
    if a != b {
        return Err(Error::shape_mismatch(
            context,
            format!("operands have {a} and {b} batches"),
        ));
    }
    Ok(())
}

/// The sparse operand must be consumed through the index orientation that
/// groups tiles by output line
pub(crate) fn check_orientation(
    context: &str,
    index: &TileIndex,
    expected: Orientation,
) -> Result<()> {
    if index.orientation() != expected {
        return Err(Error::invalid_tile_index(format!(
            "{context} needs a {expected:?}-oriented index, got {:?}",
            index.orientation()
        )));
    }
    Ok(())
}

/// Payload count of the sparse tensor must match the index
pub(crate) fn check_payloads(context: &str, sparse: &SparseBatch, index: &TileIndex) -> Result<()> {
    if sparse.n_blocks() != index.n_blocks() {
        return Err(Error::shape_mismatch(
            context,
            format!(
                "sparse tensor holds {} tiles, index lists {}",
                sparse.n_blocks(),
                index.n_blocks()
            ),
        ));
    }
    Ok(())
}

/// The dense contraction extent must cover exactly the index's cross tiles;
/// a ragged final tile is allowed
pub(crate) fn check_contraction(context: &str, index: &TileIndex, k: usize) -> Result<()> {
    if tiles_for(k) != index.cross_tiles() {
        return Err(Error::shape_mismatch(
            context,
            format!(
                "contraction extent {k} spans {} tiles, sparse operand has {}",
                tiles_for(k),
                index.cross_tiles()
            ),
        ));
    }
    Ok(())
}
