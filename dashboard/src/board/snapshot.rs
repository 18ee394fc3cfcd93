use chrono::{DateTime, Utc};
use market::types::{Evaluation, IndexSummary, Omission};
use serde::Serialize;

/// What started a refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// The single cycle of a run without `--live`.
    OneShot,
    Scheduled,
    Manual,
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::OneShot => "one-shot",
            Trigger::Scheduled => "scheduled",
            Trigger::Manual => "manual",
        }
    }
}

/// Complete result of one refresh cycle, published as a unit.
#[derive(Debug, Clone, Serialize)]
pub struct BoardSnapshot {
    /// Monotonic cycle number, starting at 1.
    pub cycle: u64,
    pub trigger: Trigger,
    pub refreshed_at: DateTime<Utc>,
    pub indices: Vec<IndexSummary>,
    /// Watchlist order, failed instruments left out.
    pub evaluations: Vec<Evaluation>,
    pub omitted: Vec<Omission>,
}

impl BoardSnapshot {
    /// Highest upside first; ties keep watchlist order.
    pub fn top_by_upside(&self, n: usize) -> Vec<&Evaluation> {
        let mut ranked: Vec<&Evaluation> = self.evaluations.iter().collect();
        ranked.sort_by(|a, b| b.valuation.upside_pct.total_cmp(&a.valuation.upside_pct));
        ranked.truncate(n);
        ranked
    }

    /// Instruments for the metrics strip: the highlighted symbols that were
    /// priced this cycle, or the top `top_n` by upside when nothing is highlighted.
    pub fn metrics_strip(&self, highlight: &[String], top_n: usize) -> Vec<&Evaluation> {
        if highlight.is_empty() {
            return self.top_by_upside(top_n);
        }

        highlight
            .iter()
            .filter_map(|sym| self.evaluations.iter().find(|e| &e.instrument.symbol == sym))
            .collect()
    }
}
