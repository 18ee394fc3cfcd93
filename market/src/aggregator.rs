//! Quote aggregator.
//!
//! Fetches the latest close for every instrument and index of a watchlist,
//! evaluates instruments, and drops anything that could not be priced.
//! A failure for one symbol never aborts the batch and is never retried.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{Instrument as _, debug, info, warn};

use crate::instrument::{IndexSpec, Instrument};
use crate::signal::{ValuationError, evaluate};
use crate::source::QuoteSource;
use crate::types::{Evaluation, IndexSummary, Omission};

/// Evaluations of one batch, in input order, plus what was left out.
#[derive(Debug, Clone, Default)]
pub struct AggregateOutcome {
    pub evaluations: Vec<Evaluation>,
    pub omitted: Vec<Omission>,
}

pub struct QuoteAggregator<S> {
    source: Arc<S>,
    concurrency: usize,
}

impl<S: QuoteSource> QuoteAggregator<S> {
    /// `concurrency` bounds in-flight requests; values below 1 are raised to 1.
    pub fn new(source: Arc<S>, concurrency: usize) -> Self {
        Self {
            source,
            concurrency: concurrency.max(1),
        }
    }

    /// Fetches and evaluates every instrument.
    ///
    /// Requests run concurrently but results are collected through an
    /// order-preserving buffer, so surviving rows keep their input order.
    pub async fn evaluate_all(&self, instruments: &[Instrument]) -> AggregateOutcome {
        let results: Vec<Result<Evaluation, Omission>> = stream::iter(instruments)
            .map(|inst| {
                let span = tracing::debug_span!("fetch_instrument", symbol = %inst.symbol);
                self.evaluate_one(inst).instrument(span)
            })
            .buffered(self.concurrency)
            .boxed()
            .collect()
            .await;

        let mut outcome = AggregateOutcome::default();
        for result in results {
            match result {
                Ok(evaluation) => outcome.evaluations.push(evaluation),
                Err(omission) => outcome.omitted.push(omission),
            }
        }

        info!(
            requested = instruments.len(),
            evaluated = outcome.evaluations.len(),
            omitted = outcome.omitted.len(),
            "instrument batch evaluated"
        );

        outcome
    }

    async fn evaluate_one(&self, inst: &Instrument) -> Result<Evaluation, Omission> {
        let omit = |reason: String| {
            warn!(symbol = %inst.symbol, %reason, "instrument omitted from cycle");
            Omission {
                symbol: inst.symbol.clone(),
                reason,
            }
        };

        let quote = self
            .source
            .latest_close(&inst.symbol)
            .await
            .map_err(|e| omit(e.to_string()))?;

        let (price, valuation) = quote
            .price
            .ok_or(ValuationError::PriceUnavailable)
            .and_then(|p| evaluate(Some(p), inst.target, inst.buy_band.as_ref()).map(|v| (p, v)))
            .map_err(|e| omit(e.to_string()))?;

        debug!(
            symbol = %inst.symbol,
            price,
            upside_pct = valuation.upside_pct,
            signal = ?valuation.signal,
            "instrument evaluated"
        );

        Ok(Evaluation {
            instrument: inst.clone(),
            price,
            fetched_at: quote.fetched_at,
            valuation,
        })
    }

    /// Fetches index levels. Indices without a previous close or with a
    /// failed fetch are left out of the summary.
    pub async fn summarize_indices(&self, indices: &[IndexSpec]) -> Vec<IndexSummary> {
        let results: Vec<Option<IndexSummary>> = stream::iter(indices)
            .map(|spec| async move {
                match self.source.latest_close(&spec.symbol).await {
                    Ok(quote) => {
                        let summary = IndexSummary::from_quote(spec.clone(), &quote);
                        if summary.is_none() {
                            warn!(
                                symbol = %spec.symbol,
                                "index omitted: previous close unavailable"
                            );
                        }
                        summary
                    }
                    Err(e) => {
                        warn!(symbol = %spec.symbol, error = %e, "index omitted from cycle");
                        None
                    }
                }
            })
            .buffered(self.concurrency)
            .boxed()
            .collect()
            .await;

        results.into_iter().flatten().collect()
    }
}
