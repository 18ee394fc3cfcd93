use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use market::source::{QuoteSource, QuoteSourceError};
use market::types::Quote;

/// Fixed closes per symbol; failing symbols return a 503.
#[derive(Default)]
pub struct MockSource {
    pub closes: HashMap<String, (f64, Option<f64>)>,
    pub failing: HashSet<String>,
    pub delay: Option<Duration>,
    pub calls: AtomicUsize,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_close(mut self, symbol: &str, price: f64) -> Self {
        self.closes.insert(symbol.into(), (price, None));
        self
    }

    pub fn with_closes(mut self, symbol: &str, price: f64, previous: f64) -> Self {
        self.closes.insert(symbol.into(), (price, Some(previous)));
        self
    }

    pub fn failing(mut self, symbol: &str) -> Self {
        self.failing.insert(symbol.into());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteSource for MockSource {
    async fn latest_close(&self, symbol: &str) -> Result<Quote, QuoteSourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.contains(symbol) {
            return Err(QuoteSourceError::Status {
                symbol: symbol.to_string(),
                status: 503,
            });
        }

        let (price, previous_close) = self
            .closes
            .get(symbol)
            .copied()
            .ok_or_else(|| QuoteSourceError::EmptyResult(symbol.to_string()))?;

        Ok(Quote {
            symbol: symbol.to_string(),
            price: Some(price),
            previous_close,
            fetched_at: Utc::now(),
        })
    }
}
