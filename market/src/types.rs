use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::instrument::{IndexSpec, Instrument};
use crate::signal::Valuation;

/// Latest observed closes for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub symbol: String,
    /// Most recent close; `None` when the source had no usable price.
    pub price: Option<f64>,
    /// Close of the session before `price`, when the source provides it.
    pub previous_close: Option<f64>,
    pub fetched_at: DateTime<Utc>,
}

/// One row of the board: an instrument, the price it was evaluated at
/// and the derived valuation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub instrument: Instrument,
    pub price: f64,
    pub fetched_at: DateTime<Utc>,
    pub valuation: Valuation,
}

/// Index level with its move against the previous close.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexSummary {
    pub index: IndexSpec,
    pub last: f64,
    pub previous_close: f64,
    pub change: f64,
    pub change_pct: f64,
}

impl IndexSummary {
    /// `None` unless both closes are known and the previous close is positive.
    pub fn from_quote(index: IndexSpec, quote: &Quote) -> Option<Self> {
        let last = quote.price?;
        let previous_close = quote.previous_close.filter(|p| *p > 0.0)?;
        let change = last - previous_close;

        Some(Self {
            index,
            last,
            previous_close,
            change,
            change_pct: (change / previous_close) * 100.0,
        })
    }
}

/// Why an instrument is missing from a cycle's results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Omission {
    pub symbol: String,
    pub reason: String,
}
