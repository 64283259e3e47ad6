//! Gradients of block-sparse matmul
//!
//! Both gradients are again block-sparse products: each one re-runs the
//! forward kernel with the roles of `C`, `A` and `B` permuted, so the
//! sparse matrix keeps its layout and gradients of a sparse operand come
//! out as tiles on that same layout.

use crate::adapter::batched_sparse_matmul;
use crate::mode::{Mode, Operand};
use blocksparse_core::{ExecutionEngine, Result, SparseLayout, Tensor};
use tracing::instrument;

/// Positions of `C`, `A`, `B` in [`Mode::operands`]
const C: usize = 0;
const A: usize = 1;
const B: usize = 2;

/// Gradients with respect to the two inputs of a forward product
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Gradients {
    /// Same shape as `a`; `None` unless requested
    pub da: Option<Tensor>,
    /// Same shape as `b`; `None` unless requested
    pub db: Option<Tensor>,
}

/// Gradients of `C = op(A) · op(B)` given `grad_c = dL/dC`
///
/// `needs_grad` selects which of `[da, db]` to compute. Arguments are the
/// ones passed to the forward call.
#[allow(clippy::too_many_arguments)]
#[instrument(level = "debug", skip_all, fields(mode = %mode, trans_a = trans_a, trans_b = trans_b))]
pub fn batched_sparse_matmul_backward<E: ExecutionEngine>(
    engine: &E,
    grad_c: &Tensor,
    a: &Tensor,
    b: &Tensor,
    mode: Mode,
    layout: &SparseLayout,
    trans_a: bool,
    trans_b: bool,
    needs_grad: [bool; 2],
) -> Result<Gradients> {
    let kinds = mode.operands();
    let mut grads = Gradients::default();

    if needs_grad[0] {
        let da = if trans_a {
            // dA = op(B) · dC^T
            let mode = mode.permuted([A, B, C])?;
            batched_sparse_matmul(engine, b, grad_c, mode, layout, trans_b, true)?
        } else {
            // dA = dC · op(B)^T
            let mode = mode.permuted([A, C, B])?;
            batched_sparse_matmul(engine, grad_c, b, mode, layout, false, !trans_b)?
        };
        grads.da = Some(fit_to(da, a, kinds[A])?);
    }

    if needs_grad[1] {
        let db = if trans_b {
            // dB = dC^T · op(A)
            let mode = mode.permuted([B, C, A])?;
            batched_sparse_matmul(engine, grad_c, a, mode, layout, true, trans_a)?
        } else {
            // dB = op(A)^T · dC
            let mode = mode.permuted([B, A, C])?;
            batched_sparse_matmul(engine, a, grad_c, mode, layout, !trans_a, false)?
        };
        grads.db = Some(fit_to(db, b, kinds[B])?);
    }

    Ok(grads)
}

/// Dense gradients produced through a tile index cover whole tiles; trim
/// them back to a ragged operand's extent and restore its batch shape
fn fit_to(grad: Tensor, like: &Tensor, kind: Operand) -> Result<Tensor> {
    let grad = match (kind, like.shape()) {
        (Operand::Dense, [.., rows, cols]) => grad.crop_last_two(*rows, *cols)?,
        _ => grad,
    };
    grad.reshape(like.shape().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference;
    use approx::assert_relative_eq;
    use blocksparse_core::scalar_sequential;

    #[test]
    fn test_dsd_gradients_match_dense() {
        let layout = SparseLayout::lower_triangular(2).unwrap();
        let engine = scalar_sequential();
        let a = Tensor::from_fn(vec![1, 3, 32, 32], |i| ((i % 7) as f32 - 3.0) * 0.1);
        let b = Tensor::from_fn(vec![1, 64, 5], |i| ((i % 5) as f32 - 2.0) * 0.2);
        let dc = Tensor::from_fn(vec![1, 64, 5], |i| ((i % 3) as f32 - 1.0) * 0.3);

        let grads =
            batched_sparse_matmul_backward(&engine, &dc, &a, &b, Mode::Dsd, &layout, false, false, [true, true])
                .unwrap();

        let dense_a = reference::densify(&a, &layout).unwrap();
        let da = reference::dense_matmul(&dc, &b, false, true).unwrap();
        let expected_da = reference::sparsify(&da, &layout).unwrap();
        let expected_db = reference::dense_matmul(&dense_a, &dc, true, false).unwrap();

        let got_da = grads.da.unwrap();
        assert_eq!(got_da.shape(), a.shape());
        for (g, e) in got_da.data().iter().zip(expected_da.data()) {
            assert_relative_eq!(*g, *e, epsilon = 1e-4);
        }
        let got_db = grads.db.unwrap();
        assert_eq!(got_db.shape(), b.shape());
        for (g, e) in got_db.data().iter().zip(expected_db.data()) {
            assert_relative_eq!(*g, *e, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_ragged_dense_gradient_is_trimmed() {
        // SDD with M = 40: dA comes back through a 2-tile-row index and is
        // trimmed to 40 rows
        let layout = SparseLayout::dense(2, 1).unwrap();
        let engine = scalar_sequential();
        let a = Tensor::from_fn(vec![40, 8], |i| (i % 4) as f32);
        let b = Tensor::from_fn(vec![8, 32], |i| (i % 3) as f32);
        let dc = Tensor::from_fn(vec![2, 32, 32], |_| 1.0);

        let grads =
            batched_sparse_matmul_backward(&engine, &dc, &a, &b, Mode::Sdd, &layout, false, false, [true, false])
                .unwrap();
        assert!(grads.db.is_none());
        let da = grads.da.unwrap();
        assert_eq!(da.shape(), &[40, 8]);
        // Every dC entry is 1, so dA[i, k] is the row sum of B's row k
        for k in 0..8 {
            let row_sum: f32 = (0..32).map(|j| b.data()[k * 32 + j]).sum();
            assert_eq!(da.data()[k], row_sum);
        }
    }

    #[test]
    fn test_no_gradients_requested() {
        let layout = SparseLayout::dense(1, 1).unwrap();
        let t = Tensor::zeros(vec![32, 32]);
        let sparse = Tensor::zeros(vec![1, 32, 32]);
        let grads = batched_sparse_matmul_backward(
            &scalar_sequential(),
            &t,
            &sparse,
            &t,
            Mode::Dsd,
            &layout,
            false,
            false,
            [false, false],
        )
        .unwrap();
        assert_eq!(grads, Gradients::default());
    }
}
