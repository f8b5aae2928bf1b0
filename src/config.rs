//! Pipeline configuration.
//!
//! A [`PipelineConfig`] is attached to a root [`Context`](crate::Context)
//! and inherited by every context derived from it, so all stages of a
//! pipeline see the same settings.

use std::num::NonZeroUsize;

/// Default fixed output buffer of `flatten`.
pub const DEFAULT_FLATTEN_CAPACITY: usize = 64;

/// Default upper bound for the source output buffer.
pub const DEFAULT_MAX_SOURCE_CAPACITY: usize = 4096;

/// Default multiplier from `map_par` workers to in-flight elements.
pub const DEFAULT_PAR_WINDOW_FACTOR: usize = 2;

/// Configuration shared by all stages of a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Name used to label tracing spans and metrics.
    pub name: String,
    /// Upper bound for the source output buffer (`max(1, len / 2)` otherwise).
    pub max_source_capacity: usize,
    /// Output buffer of `flatten`, whose inner sequence sizes are unknown.
    pub flatten_capacity: usize,
    /// Default worker count for `map_par`.
    pub par_workers: usize,
    /// `map_par` keeps at most `par_workers * par_window_factor` elements in flight.
    pub par_window_factor: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: "pipeline".to_string(),
            max_source_capacity: DEFAULT_MAX_SOURCE_CAPACITY,
            flatten_capacity: DEFAULT_FLATTEN_CAPACITY,
            par_workers: std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
            par_window_factor: DEFAULT_PAR_WINDOW_FACTOR,
        }
    }
}

impl PipelineConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pipeline name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the upper bound of the source output buffer.
    pub fn with_max_source_capacity(mut self, capacity: usize) -> Self {
        self.max_source_capacity = capacity.max(1);
        self
    }

    /// Set the `flatten` output buffer.
    pub fn with_flatten_capacity(mut self, capacity: usize) -> Self {
        self.flatten_capacity = capacity;
        self
    }

    /// Set the default `map_par` worker count (at least one).
    pub fn with_par_workers(mut self, workers: usize) -> Self {
        self.par_workers = workers.max(1);
        self
    }

    /// Set the `map_par` window factor (at least one).
    pub fn with_par_window_factor(mut self, factor: usize) -> Self {
        self.par_window_factor = factor.max(1);
        self
    }

    /// Output buffer of a source over `len` items.
    pub fn source_capacity(&self, len: usize) -> usize {
        (len / 2).clamp(1, self.max_source_capacity.max(1))
    }

    /// In-flight window of a `map_par` stage running `workers` workers.
    pub fn par_window(&self, workers: usize) -> usize {
        let factor = self.par_window_factor.max(1);
        workers.max(1).saturating_mul(factor)
    }
}
