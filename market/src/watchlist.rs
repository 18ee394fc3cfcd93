use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::instrument::{IndexSpec, Instrument};

#[derive(Error, Debug)]
pub enum WatchlistError {
    #[error("watchlist parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("watchlist has no instruments")]
    Empty,

    #[error("symbol {0} is listed more than once")]
    DuplicateSymbol(String),

    #[error("target for {symbol} must be positive and finite, got {target}")]
    InvalidTarget { symbol: String, target: f64 },

    #[error("highlighted symbol {0} is not in the instrument list")]
    UnknownHighlight(String),
}

fn default_top_n() -> usize {
    3
}

fn default_title() -> String {
    "Watch Board".to_string()
}

/// What to watch: instruments, index symbols and the highlighted subset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Watchlist {
    /// Board heading.
    #[serde(default = "default_title")]
    pub title: String,

    pub instruments: Vec<Instrument>,

    #[serde(default)]
    pub indices: Vec<IndexSpec>,

    /// Symbols shown in the metrics strip, in this order.
    /// Empty means the strip shows the `top_n` instruments by upside.
    #[serde(default)]
    pub highlight: Vec<String>,

    /// Number of cards in the top-upside list.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Board-wide strategy notes shown under the table, in order.
    #[serde(default)]
    pub review_notes: Vec<String>,
}

impl Watchlist {
    /// Parses and validates a JSON watchlist.
    pub fn from_json(raw: &str) -> Result<Self, WatchlistError> {
        let watchlist: Self = serde_json::from_str(raw)?;
        watchlist.validate()?;
        Ok(watchlist)
    }

    /// Band bounds are checked while parsing; this covers the cross-field rules.
    pub fn validate(&self) -> Result<(), WatchlistError> {
        if self.instruments.is_empty() {
            return Err(WatchlistError::Empty);
        }

        let mut seen = HashSet::new();
        for inst in &self.instruments {
            if !seen.insert(inst.symbol.as_str()) {
                return Err(WatchlistError::DuplicateSymbol(inst.symbol.clone()));
            }
            if !(inst.target.is_finite() && inst.target > 0.0) {
                return Err(WatchlistError::InvalidTarget {
                    symbol: inst.symbol.clone(),
                    target: inst.target,
                });
            }
        }

        if let Some(unknown) = self.highlight.iter().find(|h| !seen.contains(h.as_str())) {
            return Err(WatchlistError::UnknownHighlight(unknown.clone()));
        }

        Ok(())
    }

    pub fn instrument(&self, symbol: &str) -> Option<&Instrument> {
        self.instruments.iter().find(|i| i.symbol == symbol)
    }
}
