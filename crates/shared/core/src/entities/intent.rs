//! Trade intents - what strategies output
//!
//! Strategies never size or submit orders. They express a direction,
//! conviction and suggested levels; the risk pyramid decides the size.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Side;
use crate::values::Symbol;

/// Open a new exposure or close the strategy's existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IntentAction {
    #[default]
    Open,
    Close,
}

/// Second leg of a market-neutral intent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HedgeLeg {
    pub venue: String,
    pub symbol: Symbol,
    pub side: Side,
}

/// Proposed trade, immutable once built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeIntent {
    pub id: Uuid,
    pub symbol: Symbol,
    pub strategy_id: String,
    pub action: IntentAction,
    pub side: Side,
    /// Confidence in the signal (0.0 - 1.0)
    pub confidence: Decimal,
    pub suggested_entry: Decimal,
    pub suggested_stop: Option<Decimal>,
    pub suggested_target: Option<Decimal>,
    /// Venue for the primary leg (None = default venue)
    pub venue: Option<String>,
    pub hedge: Option<HedgeLeg>,
    pub created_at: DateTime<Utc>,
}

impl TradeIntent {
    /// Create an opening intent
    pub fn open(
        strategy_id: impl Into<String>,
        symbol: impl Into<Symbol>,
        side: Side,
        suggested_entry: Decimal,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol: symbol.into(),
            strategy_id: strategy_id.into(),
            action: IntentAction::Open,
            side,
            confidence: Decimal::ONE,
            suggested_entry,
            suggested_stop: None,
            suggested_target: None,
            venue: None,
            hedge: None,
            created_at,
        }
    }

    /// Create a closing intent; `side` is the side of the closing order
    pub fn close(
        strategy_id: impl Into<String>,
        symbol: impl Into<Symbol>,
        side: Side,
        suggested_entry: Decimal,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            action: IntentAction::Close,
            ..Self::open(strategy_id, symbol, side, suggested_entry, created_at)
        }
    }

    /// Builder: Set confidence
    pub fn with_confidence(mut self, confidence: Decimal) -> Self {
        self.confidence = confidence.clamp(Decimal::ZERO, Decimal::ONE);
        self
    }

    /// Builder: Set stop loss
    pub fn with_stop(mut self, price: Decimal) -> Self {
        self.suggested_stop = Some(price);
        self
    }

    /// Builder: Set take profit
    pub fn with_target(mut self, price: Decimal) -> Self {
        self.suggested_target = Some(price);
        self
    }

    /// Builder: Route the primary leg to a venue
    pub fn on_venue(mut self, venue: impl Into<String>) -> Self {
        self.venue = Some(venue.into());
        self
    }

    /// Builder: Attach a hedge leg
    pub fn with_hedge(mut self, hedge: HedgeLeg) -> Self {
        self.hedge = Some(hedge);
        self
    }

    pub fn is_close(&self) -> bool {
        self.action == IntentAction::Close
    }

    /// Stop sits on the losing side of the entry
    pub fn stop_is_consistent(&self) -> bool {
        match self.suggested_stop {
            None => true,
            Some(stop) => match self.side {
                Side::Buy => stop < self.suggested_entry,
                Side::Sell => stop > self.suggested_entry,
            },
        }
    }
}
