use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::Quote;

#[derive(Error, Debug)]
pub enum QuoteSourceError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("quote source returned status {status} for {symbol}")]
    Status { symbol: String, status: u16 },

    #[error("unknown symbol {symbol}: {description}")]
    UnknownSymbol { symbol: String, description: String },

    #[error("no closes returned for {0}")]
    EmptyResult(String),

    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),
}

/// Read-only access to the most recent closes of a symbol.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn latest_close(&self, symbol: &str) -> Result<Quote, QuoteSourceError>;
}

#[async_trait]
impl<S: QuoteSource + ?Sized> QuoteSource for Arc<S> {
    async fn latest_close(&self, symbol: &str) -> Result<Quote, QuoteSourceError> {
        (**self).latest_close(symbol).await
    }
}
