//! Dense × block-sparse → dense
//!
//! Mirror of DSD across the diagonal. Output tile-columns are strided in a
//! row-major result, so each (batch, tile-column) unit accumulates into a
//! private `M × 32` panel which is scattered into place afterwards.

use super::sdd::op_at;
use super::{
    check_batches, check_contraction, check_orientation, check_payloads, DenseBatch, SparseBatch,
};
use blocksparse_core::{
    load_tile, ComputePrimitives, ExecutionEngine, Orientation, Result, TileIndex, TILE,
};

/// `op(A) · op(B)` with `B` block-sparse
///
/// `index` must group tiles by the columns of `op(B)`: column-oriented for
/// a plain `B`, row-oriented for a transposed one. The output is a flat
/// `[batch, M, n_lines * 32]` buffer.
pub fn dds<E: ExecutionEngine>(
    engine: &E,
    a: &DenseBatch,
    b: &SparseBatch,
    index: &TileIndex,
) -> Result<Vec<f32>> {
    let expected = if b.is_transposed() {
        Orientation::Row
    } else {
        Orientation::Col
    };
    check_orientation("dds", index, expected)?;
    check_payloads("dds", b, index)?;
    check_batches("dds", a.batch(), b.batch())?;
    let (m, k) = (a.op_rows(), a.op_cols());
    check_contraction("dds", index, k)?;

    let lines = index.n_lines();
    let n = lines * TILE;
    let primitives = engine.primitives();
    let panels = engine.execute_batch(a.batch() * lines, |unit| {
        let (batch, line) = (unit / lines, unit % lines);
        let mut panel = vec![0.0f32; m * TILE];
        for (coord, slot) in index.entries(line) {
            let k0 = index.orientation().cross_of(coord) * TILE;
            let k_len = TILE.min(k - k0);
            let tile = load_tile(b.tile(batch, slot), b.is_transposed());
            accumulate(primitives, a, batch, &tile, k0, k_len, &mut panel);
        }
        panel
    });

    let mut out = vec![0.0f32; a.batch() * m * n];
    for (unit, panel) in panels.iter().enumerate() {
        let (batch, line) = (unit / lines, unit % lines);
        let base = batch * m * n + line * TILE;
        for (i, row) in panel.chunks_exact(TILE).enumerate() {
            out[base + i * n..base + i * n + TILE].copy_from_slice(row);
        }
    }
    Ok(out)
}

/// `panel += op(A)[:, k0..k0 + k_len] · tile[..k_len, :]`
fn accumulate<P: ComputePrimitives>(
    primitives: &P,
    a: &DenseBatch,
    batch: usize,
    tile: &[f32],
    k0: usize,
    k_len: usize,
    panel: &mut [f32],
) {
    let am = a.matrix(batch);
    for (i, out) in panel.chunks_exact_mut(TILE).enumerate() {
        for kk in 0..k_len {
            let alpha = op_at(&am, a.is_transposed(), i, k0 + kk);
            primitives.axpy(alpha, &tile[kk * TILE..(kk + 1) * TILE], out);
        }
    }
}
