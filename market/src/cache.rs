use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, instrument};

use crate::source::{QuoteSource, QuoteSourceError};
use crate::types::Quote;

struct CachedQuote {
    quote: Quote,
    stored_at: Instant,
}

/// Freshness cache in front of a [`QuoteSource`].
///
/// Guarantees:
/// - A symbol is fetched from the inner source at most once per `ttl`.
/// - Failures are never cached; the next call retries the inner source.
/// - [`CachedQuoteSource::invalidate`] forces the next call per symbol through.
pub struct CachedQuoteSource<S> {
    inner: S,
    ttl: Duration,
    entries: Mutex<HashMap<String, CachedQuote>>,
}

impl<S: QuoteSource> CachedQuoteSource<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drops every cached quote.
    #[instrument(skip(self), target = "cache")]
    pub fn invalidate(&self) {
        let mut entries = self.entries.lock();
        let count = entries.len();
        entries.clear();

        info!(count, "quote cache invalidated");
    }

    fn fresh(&self, symbol: &str) -> Option<Quote> {
        let entries = self.entries.lock();
        let entry = entries.get(symbol)?;
        (entry.stored_at.elapsed() < self.ttl).then(|| entry.quote.clone())
    }
}

#[async_trait]
impl<S: QuoteSource> QuoteSource for CachedQuoteSource<S> {
    async fn latest_close(&self, symbol: &str) -> Result<Quote, QuoteSourceError> {
        if let Some(quote) = self.fresh(symbol) {
            debug!(symbol, "quote cache hit");
            return Ok(quote);
        }

        let quote = self.inner.latest_close(symbol).await?;

        self.entries.lock().insert(
            symbol.to_string(),
            CachedQuote {
                quote: quote.clone(),
                stored_at: Instant::now(),
            },
        );

        Ok(quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingSource {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl QuoteSource for CountingSource {
        async fn latest_close(&self, symbol: &str) -> Result<Quote, QuoteSourceError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(QuoteSourceError::EmptyResult(symbol.to_string()));
            }
            Ok(Quote {
                symbol: symbol.to_string(),
                price: Some(100.0 + n as f64),
                previous_close: None,
                fetched_at: Utc::now(),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn serves_from_cache_within_ttl() {
        let inner = Arc::new(CountingSource::default());
        let cache = CachedQuoteSource::new(inner.clone(), Duration::from_secs(30));

        let a = cache.latest_close("6857.T").await.unwrap();
        tokio::time::advance(Duration::from_secs(10)).await;
        let b = cache.latest_close("6857.T").await.unwrap();

        assert_eq!(a.price, b.price);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn refetches_after_ttl() {
        let inner = Arc::new(CountingSource::default());
        let cache = CachedQuoteSource::new(inner.clone(), Duration::from_secs(30));

        cache.latest_close("6857.T").await.unwrap();
        tokio::time::advance(Duration::from_secs(31)).await;
        let b = cache.latest_close("6857.T").await.unwrap();

        assert_eq!(b.price, Some(101.0));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_forces_refetch() {
        let inner = Arc::new(CountingSource::default());
        let cache = CachedQuoteSource::new(inner.clone(), Duration::from_secs(30));

        cache.latest_close("6857.T").await.unwrap();
        cache.latest_close("9984.T").await.unwrap();
        assert_eq!(cache.len(), 2);

        cache.invalidate();
        assert!(cache.is_empty());

        cache.latest_close("6857.T").await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let inner = Arc::new(CountingSource {
            fail: true,
            ..Default::default()
        });
        let cache = CachedQuoteSource::new(inner.clone(), Duration::from_secs(30));

        assert!(cache.latest_close("X").await.is_err());
        assert!(cache.latest_close("X").await.is_err());

        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }
}
