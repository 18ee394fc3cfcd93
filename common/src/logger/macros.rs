use std::future::Future;
use std::time::{Duration, Instant};

use tracing::{Span, field};

use super::TraceId;

/// Root span for one refresh cycle.
pub fn cycle_span(trigger: &'static str, trace_id: &TraceId) -> Span {
    tracing::info_span!(
        "refresh_cycle",
        trigger = %trigger,
        trace_id = %trace_id,
        evaluated = field::Empty,
        omitted = field::Empty
    )
}

/// Child span, inherits the cycle's trace id from its parent.
pub fn child_span(name: &'static str) -> Span {
    tracing::info_span!("child", name = %name)
}

pub async fn warn_if_slow<F, T>(label: &'static str, max: Duration, fut: F) -> T
where
    F: Future<Output = T>,
{
    let start = Instant::now();
    let out = fut.await;
    let elapsed = start.elapsed();
    if elapsed > max {
        tracing::warn!(
            label = label,
            elapsed_ms = elapsed.as_millis() as u64,
            "slow operation detected"
        );
    }
    out
}
