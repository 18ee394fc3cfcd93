use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use tracing::{debug, instrument};

use crate::source::{QuoteSource, QuoteSourceError};
use crate::types::Quote;
use crate::yahoo::types::ChartEnvelope;

/// Daily bars over a few sessions, enough to cover weekends and holidays.
const CHART_RANGE: &str = "5d";
const CHART_INTERVAL: &str = "1d";

#[derive(Clone)]
pub struct YahooChartClient {
    http: Client,
    url: String,
}

impl YahooChartClient {
    pub fn new(url: String, timeout: Duration) -> Result<Self, QuoteSourceError> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(QuoteSourceError::InvalidBaseUrl(url));
        }

        let http = Client::builder()
            .user_agent(concat!("kabu-board/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            url: url.trim_end_matches('/').to_string(),
        })
    }

    pub fn chart_url(&self, symbol: &str) -> String {
        format!("{}/v8/finance/chart/{}", self.url, encode_symbol(symbol))
    }

    #[instrument(skip(self), fields(symbol = %symbol), level = "debug")]
    pub async fn fetch_chart(&self, symbol: &str) -> Result<ChartEnvelope, QuoteSourceError> {
        let resp = self
            .http
            .get(self.chart_url(symbol))
            .query(&[("range", CHART_RANGE), ("interval", CHART_INTERVAL)])
            .send()
            .await?;

        let status = resp.status();

        // Unknown symbols come back as 404 with an error body worth keeping.
        match resp.json::<ChartEnvelope>().await {
            Ok(envelope) => Ok(envelope),
            Err(_) if !status.is_success() => Err(QuoteSourceError::Status {
                symbol: symbol.to_string(),
                status: status.as_u16(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl QuoteSource for YahooChartClient {
    async fn latest_close(&self, symbol: &str) -> Result<Quote, QuoteSourceError> {
        let envelope = self.fetch_chart(symbol).await?;
        let quote = quote_from_chart(symbol, envelope, Utc::now())?;

        debug!(
            symbol,
            price = ?quote.price,
            previous_close = ?quote.previous_close,
            "yahoo chart fetched"
        );

        Ok(quote)
    }
}

/// Extracts the last two usable daily closes from a chart response.
pub fn quote_from_chart(
    symbol: &str,
    envelope: ChartEnvelope,
    fetched_at: DateTime<Utc>,
) -> Result<Quote, QuoteSourceError> {
    if let Some(err) = envelope.chart.error {
        return Err(QuoteSourceError::UnknownSymbol {
            symbol: symbol.to_string(),
            description: format!("{}: {}", err.code, err.description),
        });
    }

    let result = envelope
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| QuoteSourceError::EmptyResult(symbol.to_string()))?;

    let closes: Vec<f64> = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .filter(|c| c.is_finite() && *c > 0.0)
        .collect();

    let Some((&price, rest)) = closes.split_last() else {
        return Err(QuoteSourceError::EmptyResult(symbol.to_string()));
    };

    Ok(Quote {
        symbol: symbol.to_string(),
        price: Some(price),
        previous_close: rest.last().copied(),
        fetched_at,
    })
}

/// Index symbols carry a caret (`^N225`) which must be escaped in the path.
fn encode_symbol(symbol: &str) -> String {
    symbol.replace('^', "%5E")
}
