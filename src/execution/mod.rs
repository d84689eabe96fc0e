//! Optional parallel execution of large batches.
//!
//! This module sits "above" [`crate::processing`] and spreads the records of one batch over a
//! dedicated rayon thread pool, in chunks of at least [`ExecutionOptions::chunk_size`] records.
//!
//! Compiled queries are not shareable across threads, so every worker split compiles its own
//! matcher from the (immutable, already validated) [`ProcessorConfig`]. Output order always matches
//! input order, and every dropped record is logged with its own position.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, error};

use crate::config::ProcessorConfig;
use crate::error::ExecutionError;
use crate::processing::batch::{keep_ok, process_record};
use crate::types::{ProcessedRecord, Record};

/// Configuration for the [`ExecutionEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOptions {
    /// Number of worker threads used by the engine.
    ///
    /// If `None`, uses the platform's available parallelism.
    pub num_threads: Option<usize>,
    /// Minimum number of records handed to one worker split.
    pub chunk_size: usize,
    /// Batches smaller than this are processed sequentially on the caller's thread.
    pub parallel_threshold: usize,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        let n = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        Self {
            num_threads: Some(n),
            chunk_size: 1_024,
            parallel_threshold: 4_096,
        }
    }
}

/// A rayon-backed engine for processing one batch across several threads.
pub struct ExecutionEngine {
    pool: ThreadPool,
    opts: ExecutionOptions,
}

impl std::fmt::Debug for ExecutionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionEngine")
            .field("opts", &self.opts)
            .field("threads", &self.pool.current_num_threads())
            .finish()
    }
}

impl ExecutionEngine {
    /// Create a new engine with the given options.
    pub fn new(opts: ExecutionOptions) -> Result<Self, ExecutionError> {
        if opts.chunk_size == 0 {
            return Err(ExecutionError::InvalidOptions("chunk_size must be > 0".to_string()));
        }
        if opts.num_threads == Some(0) {
            return Err(ExecutionError::InvalidOptions(
                "num_threads must be > 0 when set".to_string(),
            ));
        }

        let n_threads = opts
            .num_threads
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
            .max(1);

        let pool = ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .thread_name(|i| format!("json-query-{i}"))
            .build()?;

        Ok(Self { pool, opts })
    }

    /// Options the engine was built with.
    pub fn options(&self) -> &ExecutionOptions {
        &self.opts
    }

    /// Number of worker threads in the pool.
    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Returns true if a batch of `len` records should run on the pool.
    pub fn should_parallelize(&self, len: usize) -> bool {
        len >= self.opts.parallel_threshold && self.num_threads() > 1
    }

    /// Process a batch on the pool.
    ///
    /// Same contract as [`crate::processing::process_batch`]: failed records are logged and
    /// dropped, survivors keep their input order.
    pub fn process(&self, config: &ProcessorConfig, records: Vec<Record>) -> Vec<ProcessedRecord> {
        let received = records.len();
        let chunk_size = self.opts.chunk_size;

        let out: Vec<ProcessedRecord> = self.pool.install(|| {
            records
                .into_par_iter()
                .with_min_len(chunk_size)
                .map_init(
                    || config.compile(),
                    |query, record| match query {
                        Ok(q) => keep_ok(process_record(&**q, record)),
                        Err(e) => {
                            error!(
                                position = %record.position,
                                error = %e,
                                "Query failed to compile on worker"
                            );
                            None
                        }
                    },
                )
                .collect::<Vec<Option<ProcessedRecord>>>()
        })
        .into_iter()
        .flatten()
        .collect();

        debug!(
            received,
            emitted = out.len(),
            dropped = received - out.len(),
            threads = self.num_threads(),
            "Processed batch in parallel"
        );
        out
    }
}
