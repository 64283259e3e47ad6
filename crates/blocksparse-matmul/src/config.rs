//! Configuration for block-sparse matmul calls

use blocksparse_core::{Error, ExecutionStrategy, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How a [`BlockSparseMatmul`](crate::BlockSparseMatmul) schedules its work
///
/// Missing fields take their defaults when deserializing, so a config file
/// only needs to name what it changes:
///
/// ```rust
/// use blocksparse_matmul::MatmulConfig;
/// use blocksparse_core::ExecutionStrategy;
///
/// let config = MatmulConfig::from_json(r#"{"strategy": "sequential"}"#).unwrap();
/// assert_eq!(config.strategy, ExecutionStrategy::Sequential);
/// assert_eq!(config.min_parallel_units, 8);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatmulConfig {
    /// Sequential, parallel, or chosen per call from the work-unit count
    pub strategy: ExecutionStrategy,

    /// Under `Auto`, calls with fewer work units run sequentially
    ///
    /// A work unit is one output tile (SDD), tile-row (DSD) or tile-column
    /// (DDS) of one batch.
    pub min_parallel_units: usize,

    /// Threads for a dedicated pool; `None` uses the global Rayon pool
    pub num_threads: Option<usize>,
}

impl Default for MatmulConfig {
    fn default() -> Self {
        Self {
            strategy: ExecutionStrategy::Auto,
            min_parallel_units: 8,
            num_threads: None,
        }
    }
}

impl MatmulConfig {
    /// Always run on the calling thread
    pub fn sequential() -> Self {
        Self {
            strategy: ExecutionStrategy::Sequential,
            ..Default::default()
        }
    }

    /// Always hand work to the engine
    pub fn parallel() -> Self {
        Self {
            strategy: ExecutionStrategy::Parallel,
            ..Default::default()
        }
    }

    pub fn with_min_parallel_units(mut self, units: usize) -> Self {
        self.min_parallel_units = units;
        self
    }

    pub fn with_num_threads(mut self, threads: usize) -> Self {
        self.num_threads = Some(threads);
        self
    }

    /// Check parameter ranges
    pub fn validate(&self) -> Result<()> {
        if self.num_threads == Some(0) {
            return Err(Error::InvalidParameter(
                "num_threads must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether a call with `units` work units should bypass the engine's
    /// parallelism
    pub fn runs_sequential(&self, units: usize) -> bool {
        match self.strategy {
            ExecutionStrategy::Sequential => true,
            ExecutionStrategy::Parallel => false,
            ExecutionStrategy::Auto => units < self.min_parallel_units,
        }
    }

    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build a parallel engine honoring `num_threads`
    #[cfg(feature = "parallel")]
    pub fn parallel_engine<P: blocksparse_core::ComputePrimitives>(
        &self,
        primitives: P,
    ) -> Result<blocksparse_core::ParallelEngine<P>> {
        self.validate()?;
        match self.num_threads {
            Some(threads) => blocksparse_core::ParallelEngine::with_num_threads(primitives, threads),
            None => Ok(blocksparse_core::ParallelEngine::new(primitives)),
        }
    }
}
