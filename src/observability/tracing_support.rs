//! Tracing integration for stage tasks.

use tracing::{Level, Span, span};

/// Create the span a stage task runs in.
#[inline]
pub fn span_stage(pipeline: &str, stage: &'static str) -> Span {
    span!(Level::DEBUG, "stage", pipeline = %pipeline, stage = stage)
}

/// Log a stage task starting.
#[inline]
pub fn trace_stage_started(stage: &'static str, capacity: usize) {
    tracing::debug!(stage, capacity, "stage started");
}

/// Log a stage task finishing, with how many elements it emitted.
#[inline]
pub fn trace_stage_finished(stage: &'static str, emitted: u64, cancelled: bool) {
    tracing::debug!(stage, emitted, cancelled, "stage finished");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_creation() {
        let span = span_stage("test-pipeline", "map");
        let _guard = span.enter();
        trace_stage_started("map", 4);
        trace_stage_finished("map", 4, false);
    }
}
