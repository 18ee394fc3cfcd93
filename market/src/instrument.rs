use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BandError {
    #[error("buy band bounds must be positive and finite, got {low}~{high}")]
    NonPositive { low: f64, high: f64 },

    #[error("buy band low {low} is above high {high}")]
    Inverted { low: f64, high: f64 },
}

/// Ideal entry price range for an instrument.
///
/// Deserialized from a two element array `[low, high]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 2]", into = "[f64; 2]")]
pub struct BuyBand {
    low: f64,
    high: f64,
}

impl BuyBand {
    pub fn new(low: f64, high: f64) -> Result<Self, BandError> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(low) || !positive(high) {
            return Err(BandError::NonPositive { low, high });
        }
        if low > high {
            return Err(BandError::Inverted { low, high });
        }
        Ok(Self { low, high })
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }
}

impl TryFrom<[f64; 2]> for BuyBand {
    type Error = BandError;

    fn try_from([low, high]: [f64; 2]) -> Result<Self, Self::Error> {
        Self::new(low, high)
    }
}

impl From<BuyBand> for [f64; 2] {
    fn from(band: BuyBand) -> Self {
        [band.low, band.high]
    }
}

impl fmt::Display for BuyBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0}~{:.0}", self.low, self.high)
    }
}

/// A tracked equity with its valuation targets. Reference data, never
/// mutated after the watchlist is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    /// Quote source symbol, e.g. `6857.T`.
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub buy_band: Option<BuyBand>,
    pub target: f64,
    #[serde(default)]
    pub note: String,
}

/// A market index shown in the summary strip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    /// Quote source symbol, e.g. `^N225`.
    pub symbol: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_accepts_equal_bounds() {
        let band = BuyBand::new(100.0, 100.0).unwrap();
        assert_eq!(band.low(), 100.0);
        assert_eq!(band.high(), 100.0);
    }

    #[test]
    fn band_rejects_inverted_bounds() {
        assert_eq!(
            BuyBand::new(10.0, 5.0),
            Err(BandError::Inverted {
                low: 10.0,
                high: 5.0
            })
        );
    }

    #[test]
    fn band_rejects_zero_negative_and_nan() {
        assert!(matches!(
            BuyBand::new(0.0, 5.0),
            Err(BandError::NonPositive { .. })
        ));
        assert!(matches!(
            BuyBand::new(-1.0, 5.0),
            Err(BandError::NonPositive { .. })
        ));
        assert!(matches!(
            BuyBand::new(1.0, f64::NAN),
            Err(BandError::NonPositive { .. })
        ));
    }

    #[test]
    fn band_parses_from_array() {
        let band: BuyBand = serde_json::from_str("[9000, 10000]").unwrap();
        assert_eq!(band, BuyBand::new(9000.0, 10000.0).unwrap());
        assert_eq!(band.to_string(), "9000~10000");

        let bad = serde_json::from_str::<BuyBand>("[10000, 9000]");
        assert!(bad.is_err());
    }

    #[test]
    fn instrument_band_and_note_are_optional() {
        let json = r#"{ "symbol": "^N225", "name": "Nikkei", "target": 50000 }"#;
        let inst: Instrument = serde_json::from_str(json).unwrap();
        assert!(inst.buy_band.is_none());
        assert!(inst.note.is_empty());
    }
}
