//! Valuation and entry signal.
//!
//! Pure, stateless computation re-run on every refresh cycle:
//! - upside  → percent gap between target and current price
//! - signal  → where the current price sits relative to the buy band
//!
//! Thresholds compare against the band's upper bound only:
//! `price <= high` is in band, `price <= high * 1.1` is near band,
//! anything above is extended. Boundaries resolve to the more favourable class.

use serde::Serialize;
use serde::ser::{SerializeStruct, Serializer};
use thiserror::Error;

use crate::instrument::BuyBand;

/// Multiplier on the band's upper bound separating "near band" from "extended".
pub const PULLBACK_FACTOR: f64 = 1.1;

/// Coarse entry-timing classification, ordered from most to least favourable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Signal {
    AtIdealBuy,
    WatchPullback,
    Extended,
}

impl Signal {
    pub fn classify(price: f64, band: &BuyBand) -> Self {
        let high = band.high();
        if price <= high {
            Signal::AtIdealBuy
        } else if price <= high * PULLBACK_FACTOR {
            Signal::WatchPullback
        } else {
            Signal::Extended
        }
    }

    /// 0 for the most favourable class, increasing with price.
    pub fn severity(&self) -> u8 {
        match self {
            Signal::AtIdealBuy => 0,
            Signal::WatchPullback => 1,
            Signal::Extended => 2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Signal::AtIdealBuy => "BUY ZONE",
            Signal::WatchPullback => "WAIT PULLBACK",
            Signal::Extended => "EXTENDED",
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ValuationError {
    #[error("current price unavailable")]
    PriceUnavailable,

    #[error("current price must be positive and finite, got {0}")]
    InvalidPrice(f64),

    #[error("target price must be positive and finite, got {0}")]
    InvalidTarget(f64),
}

/// Derived valuation for one instrument at one point in time.
///
/// Serializes both the full-precision `upside_pct` and the one-decimal
/// `upside_display` shown on the board.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Valuation {
    /// Full precision; use [`Valuation::upside_display`] for presentation.
    pub upside_pct: f64,
    /// `None` when the instrument has no buy band.
    pub signal: Option<Signal>,
}

impl Valuation {
    /// Upside rounded to one decimal place.
    pub fn upside_display(&self) -> f64 {
        round_one_decimal(self.upside_pct)
    }
}

impl Serialize for Valuation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Valuation", 3)?;
        state.serialize_field("upside_pct", &self.upside_pct)?;
        state.serialize_field("upside_display", &self.upside_display())?;
        state.serialize_field("signal", &self.signal)?;
        state.end()
    }
}

/// `((target / current) - 1) * 100`, without rounding.
pub fn upside_pct(current: f64, target: f64) -> f64 {
    ((target / current) - 1.0) * 100.0
}

pub fn round_one_decimal(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Evaluates a price against an instrument's target and optional buy band.
///
/// An absent price is reported as [`ValuationError::PriceUnavailable`]
/// rather than defaulted.
pub fn evaluate(
    current: Option<f64>,
    target: f64,
    band: Option<&BuyBand>,
) -> Result<Valuation, ValuationError> {
    let current = current.ok_or(ValuationError::PriceUnavailable)?;

    if !(current.is_finite() && current > 0.0) {
        return Err(ValuationError::InvalidPrice(current));
    }
    if !(target.is_finite() && target > 0.0) {
        return Err(ValuationError::InvalidTarget(target));
    }

    Ok(Valuation {
        upside_pct: upside_pct(current, target),
        signal: band.map(|b| Signal::classify(current, b)),
    })
}
