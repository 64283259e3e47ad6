//! Naive reference implementations
//!
//! These implementations are intentionally simple and unoptimized.
//! They materialize every sparse operand as a dense matrix and multiply with
//! a triple loop, accumulating in `f64`. They serve as a reference for
//! verifying the tile kernels.
//!
//! DO NOT USE IN PRODUCTION - these are for testing and debugging only!

use blocksparse_core::{tiles_for, Error, Result, SparseLayout, Tensor, TILE, TILE_AREA};

/// Batched dense `op(A) · op(B)`
///
/// Both operands are `[..., rows, cols]` with equal flattened batch counts;
/// the result keeps `a`'s batch dimensions.
pub fn dense_matmul(a: &Tensor, b: &Tensor, trans_a: bool, trans_b: bool) -> Result<Tensor> {
    let (a_rows, a_cols) = last_two(a)?;
    let (b_rows, b_cols) = last_two(b)?;
    let (m, k) = if trans_a { (a_cols, a_rows) } else { (a_rows, a_cols) };
    let (kb, n) = if trans_b { (b_cols, b_rows) } else { (b_rows, b_cols) };
    if k != kb {
        return Err(Error::size_mismatch(k, kb, "reference contraction"));
    }
    let batches = a.leading_size(2);
    if batches != b.leading_size(2) {
        return Err(Error::size_mismatch(batches, b.leading_size(2), "reference batch"));
    }

    let at = |batch: usize, i: usize, j: usize| {
        let (r, c) = if trans_a { (j, i) } else { (i, j) };
        a.data()[(batch * a_rows + r) * a_cols + c] as f64
    };
    let bt = |batch: usize, i: usize, j: usize| {
        let (r, c) = if trans_b { (j, i) } else { (i, j) };
        b.data()[(batch * b_rows + r) * b_cols + c] as f64
    };

    let mut data = Vec::with_capacity(batches * m * n);
    for batch in 0..batches {
        for i in 0..m {
            for j in 0..n {
                let mut acc = 0.0f64;
                for kk in 0..k {
                    acc += at(batch, i, kk) * bt(batch, kk, j);
                }
                data.push(acc as f32);
            }
        }
    }

    let mut shape = a.shape()[..a.rank() - 2].to_vec();
    shape.extend_from_slice(&[m, n]);
    Tensor::new(shape, data)
}

/// Scatter `[..., n_blocks, 32, 32]` payloads into dense
/// `[..., tile_rows * 32, tile_cols * 32]` matrices
pub fn densify(sparse: &Tensor, layout: &SparseLayout) -> Result<Tensor> {
    check_sparse(sparse, layout)?;
    let (rows, cols) = (layout.tile_rows() * TILE, layout.tile_cols() * TILE);
    let batches = sparse.leading_size(3);
    let mut data = vec![0.0f32; batches * rows * cols];

    for batch in 0..batches {
        let plane = &mut data[batch * rows * cols..(batch + 1) * rows * cols];
        for (t, &[r, c]) in layout.coordinates().iter().enumerate() {
            let start = (batch * layout.n_blocks() + t) * TILE_AREA;
            let tile = &sparse.data()[start..start + TILE_AREA];
            for (i, src) in tile.chunks_exact(TILE).enumerate() {
                let offset = (r as usize * TILE + i) * cols + c as usize * TILE;
                plane[offset..offset + TILE].copy_from_slice(src);
            }
        }
    }

    let mut shape = sparse.shape()[..sparse.rank() - 3].to_vec();
    shape.extend_from_slice(&[rows, cols]);
    Tensor::new(shape, data)
}

/// Gather the tiles listed by `layout` out of dense `[..., R, C]` matrices
///
/// `R` and `C` may be ragged; values past them read as zero.
pub fn sparsify(dense: &Tensor, layout: &SparseLayout) -> Result<Tensor> {
    let (rows, cols) = last_two(dense)?;
    if tiles_for(rows) != layout.tile_rows() || tiles_for(cols) != layout.tile_cols() {
        return Err(Error::shape_mismatch(
            "sparsify",
            format!(
                "{rows}x{cols} matrix does not cover a {}x{} tile grid",
                layout.tile_rows(),
                layout.tile_cols()
            ),
        ));
    }
    let batches = dense.leading_size(2);
    let mut data = vec![0.0f32; batches * layout.n_blocks() * TILE_AREA];

    for batch in 0..batches {
        let plane = &dense.data()[batch * rows * cols..(batch + 1) * rows * cols];
        for (t, &[r, c]) in layout.coordinates().iter().enumerate() {
            let tile = &mut data[(batch * layout.n_blocks() + t) * TILE_AREA..][..TILE_AREA];
            let (r0, c0) = (r as usize * TILE, c as usize * TILE);
            for i in 0..TILE.min(rows - r0) {
                let width = TILE.min(cols - c0);
                let src = &plane[(r0 + i) * cols + c0..][..width];
                tile[i * TILE..i * TILE + width].copy_from_slice(src);
            }
        }
    }

    let mut shape = dense.shape()[..dense.rank() - 2].to_vec();
    shape.extend_from_slice(&[layout.n_blocks(), TILE, TILE]);
    Tensor::new(shape, data)
}

fn last_two(t: &Tensor) -> Result<(usize, usize)> {
    match t.shape() {
        [.., rows, cols] => Ok((*rows, *cols)),
        _ => Err(Error::shape_mismatch(
            "reference operand",
            format!("need at least 2 dimensions, got {:?}", t.shape()),
        )),
    }
}

fn check_sparse(t: &Tensor, layout: &SparseLayout) -> Result<()> {
    match t.shape() {
        [.., blocks, TILE, TILE] if *blocks == layout.n_blocks() => Ok(()),
        other => Err(Error::shape_mismatch(
            "sparse operand",
            format!(
                "expected [..., {}, 32, 32], got {:?}",
                layout.n_blocks(),
                other
            ),
        )),
    }
}
