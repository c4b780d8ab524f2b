//! Orders, fills and execution reports

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{HedgeLeg, IntentAction, ReasonCode, Side, TradeIntent};
use crate::values::Symbol;

/// Sized, risk-approved order for the execution gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub id: Uuid,
    /// Intent this order was derived from
    pub intent_id: Uuid,
    pub symbol: Symbol,
    pub strategy_id: String,
    pub side: Side,
    pub quantity: Decimal,
    /// Reference price used for sizing
    pub entry_price: Decimal,
    pub stop: Option<Decimal>,
    pub target: Option<Decimal>,
    /// Only reduces an existing position
    pub reduce_only: bool,
    pub venue: Option<String>,
    pub hedge: Option<HedgeLeg>,
    pub created_at: DateTime<Utc>,
}

impl OrderRequest {
    /// Build an order from an approved intent
    pub fn from_intent(intent: &TradeIntent, quantity: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            intent_id: intent.id,
            symbol: intent.symbol.clone(),
            strategy_id: intent.strategy_id.clone(),
            side: intent.side,
            quantity,
            entry_price: intent.suggested_entry,
            stop: intent.suggested_stop,
            target: intent.suggested_target,
            reduce_only: intent.action == IntentAction::Close,
            venue: intent.venue.clone(),
            hedge: intent.hedge.clone(),
            created_at: intent.created_at,
        }
    }

    /// Notional value at the reference price
    pub fn notional(&self) -> Decimal {
        self.quantity * self.entry_price
    }
}

/// Fill confirmation from the execution gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub order_id: Uuid,
    pub intent_id: Uuid,
    pub symbol: Symbol,
    pub strategy_id: String,
    pub side: Side,
    pub quantity: Decimal,
    pub price: Decimal,
    /// Exchange fee (positive = cost)
    pub fee: Decimal,
    pub reduce_only: bool,
    pub timestamp: DateTime<Utc>,
}

impl Fill {
    /// Full fill of an order at a price
    pub fn for_order(order: &OrderRequest, price: Decimal, fee: Decimal, timestamp: DateTime<Utc>) -> Self {
        Self {
            order_id: order.id,
            intent_id: order.intent_id,
            symbol: order.symbol.clone(),
            strategy_id: order.strategy_id.clone(),
            side: order.side,
            quantity: order.quantity,
            price,
            fee,
            reduce_only: order.reduce_only,
            timestamp,
        }
    }
}

/// Final outcome of an intent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    Filled { quantity: Decimal, price: Decimal },
    Rejected { reason: ReasonCode },
    Failed { error: String },
}

/// Fed back to the strategy that produced the intent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub intent_id: Uuid,
    pub strategy_id: String,
    pub symbol: Symbol,
    pub action: IntentAction,
    pub side: Side,
    pub status: ExecutionStatus,
}

impl ExecutionReport {
    pub fn for_intent(intent: &TradeIntent, status: ExecutionStatus) -> Self {
        Self {
            intent_id: intent.id,
            strategy_id: intent.strategy_id.clone(),
            symbol: intent.symbol.clone(),
            action: intent.action,
            side: intent.side,
            status,
        }
    }

    pub fn is_filled(&self) -> bool {
        matches!(self.status, ExecutionStatus::Filled { .. })
    }
}
