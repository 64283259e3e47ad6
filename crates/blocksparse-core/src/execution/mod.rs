//! Execution engines for controlling computation strategy
//!
//! This module provides the execution engine abstraction that unifies
//! primitive selection (SIMD vs scalar) with execution strategy
//! (sequential vs parallel).
//!
//! Kernels hand the engine independent work units: either indices whose
//! results are collected (`execute_batch`) or disjoint mutable chunks of an
//! output buffer (`for_each_chunk_mut`). An engine never sees shared
//! mutable state, so the parallel engine needs no synchronization.

use crate::primitives::ComputePrimitives;
#[cfg(feature = "parallel")]
use crate::Result;
use serde::{Deserialize, Serialize};

/// Execution strategy for batch operations
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStrategy {
    /// Process items sequentially
    Sequential,
    /// Process items in parallel
    Parallel,
    /// Automatically choose based on workload
    Auto,
}

/// Trait for execution engines that control how computations are performed
///
/// An execution engine combines:
/// - Primitive operations (scalar vs SIMD)
/// - Execution strategy (sequential vs parallel)
/// - Thread pool selection (global Rayon pool vs a dedicated one)
pub trait ExecutionEngine: Clone + Send + Sync {
    /// The type of primitives used by this engine
    type Primitives: ComputePrimitives;

    /// Get the primitives for low-level operations
    fn primitives(&self) -> &Self::Primitives;

    /// Run `f(0..count)` and collect the results in index order
    fn execute_batch<F, R>(&self, count: usize, f: F) -> Vec<R>
    where
        F: Fn(usize) -> R + Sync + Send,
        R: Send;

    /// Split `data` into `chunk_size` pieces and run `f(chunk_index, chunk)`
    /// on each; chunks are disjoint so they may run concurrently
    fn for_each_chunk_mut<F>(&self, data: &mut [f32], chunk_size: usize, f: F)
    where
        F: Fn(usize, &mut [f32]) + Sync + Send;

    /// Get the execution strategy
    fn strategy(&self) -> ExecutionStrategy;

    /// Check if parallel execution is available
    fn is_parallel(&self) -> bool {
        matches!(
            self.strategy(),
            ExecutionStrategy::Parallel | ExecutionStrategy::Auto
        )
    }

    /// Get the number of threads available
    fn num_threads(&self) -> usize;
}

/// Sequential execution engine
///
/// Executes all operations sequentially in the current thread.
#[derive(Clone, Debug)]
pub struct SequentialEngine<P: ComputePrimitives> {
    primitives: P,
}

impl<P: ComputePrimitives> SequentialEngine<P> {
    /// Create a new sequential engine with the given primitives
    pub fn new(primitives: P) -> Self {
        Self { primitives }
    }
}

impl<P: ComputePrimitives> ExecutionEngine for SequentialEngine<P> {
    type Primitives = P;

    fn primitives(&self) -> &Self::Primitives {
        &self.primitives
    }

    fn execute_batch<F, R>(&self, count: usize, f: F) -> Vec<R>
    where
        F: Fn(usize) -> R + Sync + Send,
        R: Send,
    {
        (0..count).map(f).collect()
    }

    fn for_each_chunk_mut<F>(&self, data: &mut [f32], chunk_size: usize, f: F)
    where
        F: Fn(usize, &mut [f32]) + Sync + Send,
    {
        if chunk_size == 0 {
            return;
        }
        data.chunks_mut(chunk_size)
            .enumerate()
            .for_each(|(i, chunk)| f(i, chunk));
    }

    fn strategy(&self) -> ExecutionStrategy {
        ExecutionStrategy::Sequential
    }

    fn num_threads(&self) -> usize {
        1
    }
}

/// Parallel execution engine using Rayon
///
/// Executes operations in parallel using Rayon's thread pool.
#[cfg(feature = "parallel")]
#[derive(Clone, Debug)]
pub struct ParallelEngine<P: ComputePrimitives> {
    primitives: P,
    thread_pool: Option<std::sync::Arc<rayon::ThreadPool>>,
}

#[cfg(feature = "parallel")]
impl<P: ComputePrimitives> ParallelEngine<P> {
    /// Create a new parallel engine with default thread pool
    pub fn new(primitives: P) -> Self {
        Self {
            primitives,
            thread_pool: None,
        }
    }

    /// Create a new parallel engine with a custom thread pool
    pub fn with_thread_pool(primitives: P, pool: std::sync::Arc<rayon::ThreadPool>) -> Self {
        Self {
            primitives,
            thread_pool: Some(pool),
        }
    }

    /// Create with a specific number of threads
    pub fn with_num_threads(primitives: P, num_threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()
            .map_err(|e| crate::Error::Execution(format!("Failed to create thread pool: {e}")))?;
        log::debug!(
            "Created {}-thread pool for {} primitives",
            num_threads,
            primitives.backend_name()
        );

        Ok(Self {
            primitives,
            thread_pool: Some(std::sync::Arc::new(pool)),
        })
    }
}

#[cfg(feature = "parallel")]
impl<P: ComputePrimitives> ExecutionEngine for ParallelEngine<P> {
    type Primitives = P;

    fn primitives(&self) -> &Self::Primitives {
        &self.primitives
    }

    fn execute_batch<F, R>(&self, count: usize, f: F) -> Vec<R>
    where
        F: Fn(usize) -> R + Sync + Send,
        R: Send,
    {
        use rayon::prelude::*;

        if let Some(pool) = &self.thread_pool {
            pool.install(|| (0..count).into_par_iter().map(f).collect())
        } else {
            (0..count).into_par_iter().map(f).collect()
        }
    }

    fn for_each_chunk_mut<F>(&self, data: &mut [f32], chunk_size: usize, f: F)
    where
        F: Fn(usize, &mut [f32]) + Sync + Send,
    {
        use rayon::prelude::*;

        if chunk_size == 0 {
            return;
        }
        if let Some(pool) = &self.thread_pool {
            pool.install(|| {
                data.par_chunks_mut(chunk_size)
                    .enumerate()
                    .for_each(|(i, chunk)| f(i, chunk))
            })
        } else {
            data.par_chunks_mut(chunk_size)
                .enumerate()
                .for_each(|(i, chunk)| f(i, chunk))
        }
    }

    fn strategy(&self) -> ExecutionStrategy {
        ExecutionStrategy::Parallel
    }

    fn num_threads(&self) -> usize {
        if let Some(pool) = &self.thread_pool {
            pool.current_num_threads()
        } else {
            rayon::current_num_threads()
        }
    }
}

/// Create a sequential scalar engine
pub fn scalar_sequential() -> SequentialEngine<crate::primitives::ScalarBackend> {
    SequentialEngine::new(crate::primitives::ScalarBackend)
}

/// Create a sequential SIMD engine
#[cfg(all(target_arch = "x86_64", feature = "avx2"))]
pub fn simd_sequential() -> SequentialEngine<crate::primitives::Avx2Backend> {
    SequentialEngine::new(crate::primitives::Avx2Backend::new())
}

/// Create a sequential SIMD engine (fallback to scalar if AVX2 not available)
#[cfg(not(all(target_arch = "x86_64", feature = "avx2")))]
pub fn simd_sequential() -> SequentialEngine<crate::primitives::ScalarBackend> {
    SequentialEngine::new(crate::primitives::ScalarBackend)
}

/// Create a parallel scalar engine
#[cfg(feature = "parallel")]
pub fn scalar_parallel() -> ParallelEngine<crate::primitives::ScalarBackend> {
    ParallelEngine::new(crate::primitives::ScalarBackend)
}

/// Create a parallel SIMD engine
#[cfg(all(feature = "parallel", target_arch = "x86_64", feature = "avx2"))]
pub fn simd_parallel() -> ParallelEngine<crate::primitives::Avx2Backend> {
    ParallelEngine::new(crate::primitives::Avx2Backend::new())
}

/// Create a parallel SIMD engine (fallback to scalar if AVX2 not available)
#[cfg(all(feature = "parallel", not(all(target_arch = "x86_64", feature = "avx2"))))]
pub fn simd_parallel() -> ParallelEngine<crate::primitives::ScalarBackend> {
    ParallelEngine::new(crate::primitives::ScalarBackend)
}

/// Create an auto-selected engine based on available features
pub fn auto_engine() -> impl ExecutionEngine {
    log::debug!(
        "Selecting engine: backend={}, cpus={}",
        crate::primitives::best_backend_name(),
        num_cpus::get()
    );
    #[cfg(feature = "parallel")]
    {
        simd_parallel()
    }
    #[cfg(not(feature = "parallel"))]
    {
        simd_sequential()
    }
}
