//! Subset of the Yahoo Finance v8 chart response.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ChartEnvelope {
    pub chart: Chart,
}

#[derive(Debug, Deserialize)]
pub struct Chart {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
pub struct ChartError {
    pub code: String,
    #[serde(default)]
    pub description: String,
}

/// Only the close series is read; bar timestamps and market metadata are ignored.
#[derive(Debug, Deserialize)]
pub struct ChartResult {
    pub indicators: Indicators,
}

#[derive(Debug, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<QuoteIndicator>,
}

/// Daily bars; halted sessions show up as `null` entries.
#[derive(Debug, Deserialize)]
pub struct QuoteIndicator {
    #[serde(default)]
    pub close: Vec<Option<f64>>,
}
