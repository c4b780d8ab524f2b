//! Market inputs consumed by the decision core

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::PositionSide;
use crate::values::Symbol;

/// OHLCV bar for one symbol
///
/// Per-symbol timestamps are expected to be strictly increasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub symbol: Symbol,
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl Bar {
    pub fn new(
        symbol: impl Into<Symbol>,
        timestamp: DateTime<Utc>,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Absolute candle body |close - open|
    pub fn body(&self) -> Decimal {
        (self.close - self.open).abs()
    }

    /// Full high-low range
    pub fn range(&self) -> Decimal {
        self.high - self.low
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// OHLC ordering holds and volume is non-negative
    pub fn is_well_formed(&self) -> bool {
        self.low <= self.open.min(self.close)
            && self.high >= self.open.max(self.close)
            && self.volume >= Decimal::ZERO
            && self.low >= Decimal::ZERO
    }
}

/// Forced closure of a leveraged position on some venue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidationEvent {
    pub symbol: Symbol,
    /// Side of the position that got liquidated
    pub side: PositionSide,
    pub size: Decimal,
    pub price: Decimal,
    pub leverage: Decimal,
    pub exchange: String,
    pub timestamp: DateTime<Utc>,
}

impl LiquidationEvent {
    pub fn notional(&self) -> Decimal {
        self.size.saturating_mul(self.price)
    }
}

/// Perpetual funding rate observed on one venue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingRate {
    pub symbol: Symbol,
    pub venue: String,
    /// Rate per funding interval (e.g. 0.0001 = 1bp)
    pub rate: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl FundingRate {
    pub fn new(
        symbol: impl Into<Symbol>,
        venue: impl Into<String>,
        rate: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            venue: venue.into(),
            rate,
            timestamp,
        }
    }
}
