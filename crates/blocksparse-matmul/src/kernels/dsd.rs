//! Block-sparse × dense → dense
//!
//! One work unit per (batch, output tile-row). A unit walks the index line
//! for its tile-row in list order and accumulates every stored tile's
//! contribution into its own `32 × N` slab of the output.

use super::{
    check_batches, check_contraction, check_orientation, check_payloads, DenseBatch, Matrix,
    SparseBatch,
};
use blocksparse_core::{
    load_tile, ComputePrimitives, ExecutionEngine, Orientation, Result, TileIndex, TILE,
};

/// `op(A) · op(B)` with `A` block-sparse
///
/// `index` must group tiles by the rows of `op(A)`: row-oriented for a
/// plain `A`, column-oriented for a transposed one. The output is a flat
/// `[batch, n_lines * 32, N]` buffer.
pub fn dsd<E: ExecutionEngine>(
    engine: &E,
    a: &SparseBatch,
    index: &TileIndex,
    b: &DenseBatch,
) -> Result<Vec<f32>> {
    let expected = if a.is_transposed() {
        Orientation::Col
    } else {
        Orientation::Row
    };
    check_orientation("dsd", index, expected)?;
    check_payloads("dsd", a, index)?;
    check_batches("dsd", a.batch(), b.batch())?;
    let (k, n) = (b.op_rows(), b.op_cols());
    check_contraction("dsd", index, k)?;

    let lines = index.n_lines();
    let mut out = vec![0.0f32; a.batch() * lines * TILE * n];
    let primitives = engine.primitives();
    engine.for_each_chunk_mut(&mut out, TILE * n, |unit, slab| {
        let (batch, line) = (unit / lines, unit % lines);
        let bm = b.matrix(batch);
        for (coord, slot) in index.entries(line) {
            let k0 = index.orientation().cross_of(coord) * TILE;
            let k_len = TILE.min(k - k0);
            let tile = load_tile(a.tile(batch, slot), a.is_transposed());
            accumulate(primitives, &tile, k0, k_len, &bm, b.is_transposed(), slab, n);
        }
    });
    Ok(out)
}

/// `slab += tile[:, ..k_len] · op(B)[k0..k0 + k_len, :]`
#[allow(clippy::too_many_arguments)]
fn accumulate<P: ComputePrimitives>(
    primitives: &P,
    tile: &[f32],
    k0: usize,
    k_len: usize,
    bm: &Matrix,
    trans_b: bool,
    slab: &mut [f32],
    n: usize,
) {
    for (i, out) in slab.chunks_exact_mut(n).enumerate() {
        let t_row = &tile[i * TILE..i * TILE + k_len];
        if trans_b {
            // op(B)[k, j] = B[j, k]: contiguous along k
            for (j, o) in out.iter_mut().enumerate() {
                *o += primitives.dot_product(t_row, &bm.row(j)[k0..k0 + k_len]);
            }
        } else {
            for (kk, &alpha) in t_row.iter().enumerate() {
                primitives.axpy(alpha, bm.row(k0 + kk), out);
            }
        }
    }
}
