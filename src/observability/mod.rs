//! Observability features: metrics and tracing.
//!
//! - **Metrics**: counters via `metrics-rs`
//! - **Tracing**: one span per stage task via `tracing`
//!
//! ## Metrics
//!
//! | Metric | Type | Description |
//! |--------|------|-------------|
//! | `sluice_elements_emitted` | Counter | Elements sent downstream by a stage |
//! | `sluice_elements_dropped` | Counter | Elements a stage decided not to forward |
//! | `sluice_pipelines_cancelled` | Counter | Pipelines whose cause of termination was a cancellation |
//! | `sluice_stage_faults` | Counter | User callbacks that panicked inside a stage |
//!
//! Nothing is exported unless the application installs a `metrics` recorder.

mod metrics;
mod tracing_support;

pub use metrics::{StageMetrics, init_metrics, record_pipeline_cancelled, record_stage_fault};
pub use tracing_support::{span_stage, trace_stage_finished, trace_stage_started};
