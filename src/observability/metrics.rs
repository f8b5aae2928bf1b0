//! Metrics collection using metrics-rs.

use metrics::{Counter, Unit, counter};
use std::sync::atomic::{AtomicBool, Ordering};

/// Whether metrics have been initialized.
static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

const ELEMENTS_EMITTED: &str = "sluice_elements_emitted";
const ELEMENTS_DROPPED: &str = "sluice_elements_dropped";
const PIPELINES_CANCELLED: &str = "sluice_pipelines_cancelled";
const STAGE_FAULTS: &str = "sluice_stage_faults";

/// Initialize metrics descriptions.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init_metrics() {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        return;
    }

    metrics::describe_counter!(
        ELEMENTS_EMITTED,
        Unit::Count,
        "Total number of elements sent downstream by a stage"
    );
    metrics::describe_counter!(
        ELEMENTS_DROPPED,
        Unit::Count,
        "Total number of elements a stage did not forward"
    );
    metrics::describe_counter!(
        PIPELINES_CANCELLED,
        Unit::Count,
        "Total number of pipelines cancelled before exhaustion"
    );
    metrics::describe_counter!(
        STAGE_FAULTS,
        Unit::Count,
        "Total number of user callbacks that panicked inside a stage"
    );
}

/// Record a pipeline that ended on a cancellation.
#[inline]
pub fn record_pipeline_cancelled(pipeline: &str) {
    counter!(PIPELINES_CANCELLED, "pipeline" => pipeline.to_string())
        .increment(1);
}

/// Record a panicking user callback.
#[inline]
pub fn record_stage_fault(pipeline: &str, stage: &str) {
    counter!(STAGE_FAULTS, "pipeline" => pipeline.to_string(), "stage" => stage.to_string())
        .increment(1);
}

/// Metrics collector for one stage, with labels resolved once.
#[derive(Clone)]
pub struct StageMetrics {
    emitted: Counter,
    dropped: Counter,
}

impl StageMetrics {
    /// Create a collector for `stage` of `pipeline`.
    pub fn new(pipeline: &str, stage: &str) -> Self {
        Self {
            emitted: counter!(
                ELEMENTS_EMITTED,
                "pipeline" => pipeline.to_string(),
                "stage" => stage.to_string()
            ),
            dropped: counter!(
                ELEMENTS_DROPPED,
                "pipeline" => pipeline.to_string(),
                "stage" => stage.to_string()
            ),
        }
    }

    /// Record an element sent downstream.
    #[inline]
    pub fn record_emitted(&self) {
        self.emitted.increment(1);
    }

    /// Record an element the stage decided not to forward.
    #[inline]
    pub fn record_dropped(&self) {
        self.dropped.increment(1);
    }
}
