//! Concrete scenarios and engine/config behaviour

mod common;

use approx::assert_relative_eq;
use blocksparse_core::{
    scalar_sequential, Error, Orientation, SparseLayout, Tensor, TileIndex, TILE, TILE_AREA,
};
use blocksparse_matmul::{
    batched_sparse_matmul, dsd, BlockSparseMatmul, DenseBatch, MatmulConfig, Mode, SparseBatch,
};
use common::*;

#[test]
fn test_sdd_all_ones_gives_64() {
    let layout = SparseLayout::dense(1, 1).unwrap();
    let a = Tensor::from_fn(vec![1, 32, 64], |_| 1.0);
    let b = Tensor::from_fn(vec![1, 64, 32], |_| 1.0);
    let c = batched_sparse_matmul(&scalar_sequential(), &a, &b, Mode::Sdd, &layout, false, false)
        .unwrap();
    assert_eq!(c.shape(), &[1, 1, 32, 32]);
    assert!(c.data().iter().all(|&v| v == 64.0));
}

#[test]
fn test_dsd_identity_tile_with_empty_row() {
    // Lookup table [0, 1, 1]: tile-row 0 has one tile at column 0, row 1 none
    let index = TileIndex::new(Orientation::Row, 1, vec![0, 0], vec![0, 1, 1]).unwrap();
    let scale = 2.5;
    let mut payload = vec![0.0f32; TILE_AREA];
    for i in 0..TILE {
        payload[i * TILE + i] = scale;
    }
    let n = 6;
    let b = vec![1.0f32; TILE * n];

    let a = SparseBatch::new(&payload, 1, 1, false).unwrap();
    let bd = DenseBatch::new(&b, 1, TILE, n, false).unwrap();
    let out = dsd(&scalar_sequential(), &a, &index, &bd).unwrap();

    let (top, bottom) = out.split_at(TILE * n);
    assert!(top.iter().all(|&v| v == scale));
    assert!(bottom.iter().all(|&v| v == 0.0));
}

#[test]
fn test_unlisted_sdd_tiles_are_never_written() {
    // Upper-triangular product would be nonzero, but only the causal tiles
    // are listed
    let layout = SparseLayout::lower_triangular(3).unwrap();
    let a = random_tensor(vec![96, 16], 1);
    let b = random_tensor(vec![16, 96], 2);
    let c = batched_sparse_matmul(&scalar_sequential(), &a, &b, Mode::Sdd, &layout, false, false)
        .unwrap();
    assert_eq!(c.shape(), &[6, 32, 32]);

    // Tile 3 in row-major causal order is (2, 0)
    let expected: f32 = (0..16).map(|k| a.data()[64 * 16 + k] * b.data()[k * 96]).sum();
    assert_relative_eq!(c.data()[3 * TILE_AREA], expected, epsilon = 1e-4);
}

#[test]
fn test_mode_parsing_at_the_boundary() {
    let mode: Mode = "dds".parse().unwrap();
    assert_eq!(mode, Mode::Dds);
    assert!(matches!("sds".parse::<Mode>(), Err(Error::UnsupportedMode(_))));
}

#[test]
fn test_errors_leave_no_output() {
    let layout = SparseLayout::lower_triangular(2).unwrap();
    let sparse = Tensor::zeros(vec![3, 32, 32]);
    // K = 96 does not match the 2 tile-columns of the sparse operand
    let b = Tensor::zeros(vec![96, 4]);
    let err = batched_sparse_matmul(&scalar_sequential(), &sparse, &b, Mode::Dsd, &layout, false, false)
        .unwrap_err();
    assert!(matches!(err, Error::ShapeMismatch { .. }));
}

#[test]
fn test_sequential_config_matches_default() {
    let layout = SparseLayout::lower_triangular(4).unwrap();
    let a = random_tensor(vec![2, 10, 32, 32], 3);
    let b = random_tensor(vec![2, 128, 24], 4);

    let default = BlockSparseMatmul::new(scalar_sequential());
    let sequential =
        BlockSparseMatmul::with_config(scalar_sequential(), MatmulConfig::sequential()).unwrap();
    let x = default.forward(&a, &b, Mode::Dsd, &layout, false, false).unwrap();
    let y = sequential.forward(&a, &b, Mode::Dsd, &layout, false, false).unwrap();
    assert_eq!(x, y);

    let bad = MatmulConfig::default().with_num_threads(0);
    assert!(BlockSparseMatmul::with_config(scalar_sequential(), bad).is_err());
}

#[cfg(feature = "parallel")]
mod parallel {
    use super::*;
    use blocksparse_core::{scalar_parallel, ExecutionEngine, ScalarBackend};

    #[test]
    fn test_parallel_engine_is_bit_identical() {
        let layout = SparseLayout::lower_triangular(4).unwrap();
        let a = random_tensor(vec![3, 128, 40], 5);
        let b = random_tensor(vec![3, 40, 128], 6);
        let sparse = random_tensor(vec![3, 10, 32, 32], 7);

        let par = BlockSparseMatmul::with_config(scalar_parallel(), MatmulConfig::parallel()).unwrap();
        let seq = BlockSparseMatmul::new(scalar_sequential());
        let b_t = b.transpose_last_two().unwrap();
        for (x, y, mode) in [
            (&a, &b, Mode::Sdd),
            (&sparse, &b_t, Mode::Dsd),
            (&b, &sparse, Mode::Dds),
        ] {
            let p = par.forward(x, y, mode, &layout, false, false).unwrap();
            let s = seq.forward(x, y, mode, &layout, false, false).unwrap();
            assert_eq!(p, s, "{mode}");
        }
    }

    #[test]
    fn test_config_built_pool() {
        let config = MatmulConfig::parallel().with_num_threads(2);
        let engine = config.parallel_engine(ScalarBackend).unwrap();
        assert_eq!(engine.num_threads(), 2);

        let layout = SparseLayout::dense(2, 2).unwrap();
        let a = random_tensor(vec![64, 64], 8);
        let op = BlockSparseMatmul::with_config(engine, config).unwrap();
        let c = op.forward(&a, &a, Mode::Sdd, &layout, false, true).unwrap();
        assert_eq!(c.shape(), &[4, 32, 32]);
    }

    #[test]
    fn test_auto_strategy_small_calls() {
        // Two work units, below the default threshold of 8
        let layout = SparseLayout::dense(1, 2).unwrap();
        let a = random_tensor(vec![32, 32], 9);
        let b = random_tensor(vec![32, 64], 10);
        let auto = BlockSparseMatmul::new(scalar_parallel());
        let c = auto.forward(&a, &b, Mode::Sdd, &layout, false, false).unwrap();
        let expected =
            batched_sparse_matmul(&scalar_sequential(), &a, &b, Mode::Sdd, &layout, false, false)
                .unwrap();
        assert_eq!(c, expected);
    }
}
