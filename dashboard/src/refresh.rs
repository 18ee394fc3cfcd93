//! Refresh service.
//!
//! One cycle fetches every index and instrument of the watchlist, evaluates
//! the instruments and publishes the finished board in one step.
//!
//! Live mode repeats cycles on a fixed interval until the shutdown signal
//! fires. A manual refresh request drops the quote cache, runs a cycle right
//! away and restarts the interval from there.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use common::logger::{TraceId, child_span, cycle_span, warn_if_slow};
use market::aggregator::QuoteAggregator;
use market::cache::CachedQuoteSource;
use market::source::QuoteSource;
use market::watchlist::Watchlist;
use tokio::sync::{mpsc, watch};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{Instrument, Span, info, warn};

use crate::board::{BoardSnapshot, BoardStore, Trigger};

pub struct RefreshService<S> {
    cache: Arc<CachedQuoteSource<S>>,
    aggregator: QuoteAggregator<CachedQuoteSource<S>>,
    watchlist: Arc<Watchlist>,
    store: BoardStore,
    cycles: AtomicU64,
    slow_cycle: Duration,
}

impl<S: QuoteSource + 'static> RefreshService<S> {
    pub fn new(
        cache: Arc<CachedQuoteSource<S>>,
        watchlist: Arc<Watchlist>,
        store: BoardStore,
        fetch_concurrency: usize,
        slow_cycle: Duration,
    ) -> Self {
        Self {
            aggregator: QuoteAggregator::new(Arc::clone(&cache), fetch_concurrency),
            cache,
            watchlist,
            store,
            cycles: AtomicU64::new(0),
            slow_cycle,
        }
    }

    pub fn store(&self) -> &BoardStore {
        &self.store
    }

    /// Runs one full cycle and publishes the result.
    ///
    /// A manual trigger invalidates the quote cache first so that every
    /// symbol is fetched fresh.
    pub async fn run_cycle(&self, trigger: Trigger) -> Arc<BoardSnapshot> {
        let trace_id = TraceId::new();
        let span = cycle_span(trigger.as_str(), &trace_id);

        async {
            if trigger == Trigger::Manual {
                self.cache.invalidate();
            }

            let (indices, outcome) = warn_if_slow("refresh_cycle", self.slow_cycle, async {
                tokio::join!(
                    self.aggregator
                        .summarize_indices(&self.watchlist.indices)
                        .instrument(child_span("indices")),
                    self.aggregator
                        .evaluate_all(&self.watchlist.instruments)
                        .instrument(child_span("instruments")),
                )
            })
            .await;

            let snapshot = Arc::new(BoardSnapshot {
                cycle: self.cycles.fetch_add(1, Ordering::SeqCst) + 1,
                trigger,
                refreshed_at: Utc::now(),
                indices,
                evaluations: outcome.evaluations,
                omitted: outcome.omitted,
            });

            let span = Span::current();
            span.record("evaluated", snapshot.evaluations.len());
            span.record("omitted", snapshot.omitted.len());

            self.store.publish(Arc::clone(&snapshot));

            info!(
                cycle = snapshot.cycle,
                indices = snapshot.indices.len(),
                evaluated = snapshot.evaluations.len(),
                omitted = snapshot.omitted.len(),
                "board published"
            );

            snapshot
        }
        .instrument(span)
        .await
    }

    /// Periodic refresh until `shutdown` flips to `true` or its sender is dropped.
    ///
    /// The first cycle runs immediately. An in-flight cycle is abandoned on
    /// shutdown; nothing is published for it.
    pub async fn run_live(
        self: Arc<Self>,
        every: Duration,
        mut manual_rx: mpsc::Receiver<()>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut manual_open = true;

        info!(
            every_secs = every.as_secs(),
            instruments = self.watchlist.instruments.len(),
            indices = self.watchlist.indices.len(),
            "live refresh started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            let trigger = tokio::select! {
                biased;

                _ = shutdown.changed() => break,

                req = manual_rx.recv(), if manual_open => match req {
                    Some(()) => {
                        ticker.reset();
                        Trigger::Manual
                    }
                    None => {
                        warn!("manual refresh channel closed; continuing on schedule");
                        manual_open = false;
                        continue;
                    }
                },

                _ = ticker.tick() => Trigger::Scheduled,
            };

            tokio::select! {
                biased;

                _ = shutdown.changed() => {
                    warn!(trigger = trigger.as_str(), "shutdown during refresh; cycle abandoned");
                    break;
                }

                _ = self.run_cycle(trigger) => {}
            }
        }

        info!("live refresh stopped");
    }
}
