//! Dense × dense → block-sparse
//!
//! Only the tiles named by the coordinate list are computed. Each
//! (batch, tile) pair is an independent work unit that owns one 32×32
//! chunk of the output.

use super::{check_batches, DenseBatch, Matrix};
use blocksparse_core::{
    tiles_for, ComputePrimitives, Error, ExecutionEngine, Result, TILE, TILE_AREA,
};

/// Compute the listed tiles of `op(A) · op(B)`
///
/// Returns a flat `[batch, coords.len(), 32, 32]` buffer; tile `t` of each
/// batch holds the product at `coords[t]`. Rows or columns of a tile that
/// fall past a ragged `M` or `N` are zero.
pub fn sdd<E: ExecutionEngine>(
    engine: &E,
    a: &DenseBatch,
    b: &DenseBatch,
    coords: &[[u16; 2]],
) -> Result<Vec<f32>> {
    check_batches("sdd", a.batch(), b.batch())?;
    let (m, k, n) = (a.op_rows(), a.op_cols(), b.op_cols());
    if b.op_rows() != k {
        return Err(Error::shape_mismatch(
            "sdd",
            format!("A contributes K = {k}, B contributes K = {}", b.op_rows()),
        ));
    }
    let (row_tiles, col_tiles) = (tiles_for(m), tiles_for(n));
    if let Some(&[r, c]) = coords
        .iter()
        .find(|&&[r, c]| r as usize >= row_tiles || c as usize >= col_tiles)
    {
        return Err(Error::shape_mismatch(
            "sdd",
            format!("tile ({r}, {c}) outside the {row_tiles}x{col_tiles} output grid"),
        ));
    }

    let n_tiles = coords.len();
    let mut out = vec![0.0f32; a.batch() * n_tiles * TILE_AREA];
    let primitives = engine.primitives();
    engine.for_each_chunk_mut(&mut out, TILE_AREA, |unit, tile| {
        let batch = unit / n_tiles;
        let [r, c] = coords[unit % n_tiles];
        let block = Block {
            row0: r as usize * TILE,
            col0: c as usize * TILE,
            rows: TILE.min(m - r as usize * TILE),
            cols: TILE.min(n - c as usize * TILE),
            k,
        };
        block.compute(primitives, a, b, batch, tile);
    });
    Ok(out)
}

/// One output tile clipped to the matrix extent
struct Block {
    row0: usize,
    col0: usize,
    rows: usize,
    cols: usize,
    k: usize,
}

impl Block {
    fn compute<P: ComputePrimitives>(
        &self,
        primitives: &P,
        a: &DenseBatch,
        b: &DenseBatch,
        batch: usize,
        tile: &mut [f32],
    ) {
        let (am, bm) = (a.matrix(batch), b.matrix(batch));
        let cols = self.col0..self.col0 + self.cols;

        match (a.is_transposed(), b.is_transposed()) {
            // op(B) rows are stored rows: accumulate scaled B rows
            (trans_a, false) => {
                for i in 0..self.rows {
                    let out = &mut tile[i * TILE..i * TILE + self.cols];
                    for kk in 0..self.k {
                        let alpha = op_at(&am, trans_a, self.row0 + i, kk);
                        primitives.axpy(alpha, &bm.row(kk)[cols.clone()], out);
                    }
                }
            }
            // Both contraction axes are contiguous
            (false, true) => {
                for i in 0..self.rows {
                    let a_row = am.row(self.row0 + i);
                    for j in 0..self.cols {
                        tile[i * TILE + j] = primitives.dot_product(a_row, bm.row(self.col0 + j));
                    }
                }
            }
            (true, true) => {
                for i in 0..self.rows {
                    for j in 0..self.cols {
                        tile[i * TILE + j] = (0..self.k).fold(0.0, |acc, kk| {
                            acc + am.at(kk, self.row0 + i) * bm.at(self.col0 + j, kk)
                        });
                    }
                }
            }
        }
    }
}

/// Element `(i, j)` of `op(M)`
#[inline]
pub(crate) fn op_at(m: &Matrix, trans: bool, i: usize, j: usize) -> f32 {
    if trans {
        m.at(j, i)
    } else {
        m.at(i, j)
    }
}
