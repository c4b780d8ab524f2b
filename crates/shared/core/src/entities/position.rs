use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::values::Symbol;

/// Position side - long (bought) or short (sold)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionSide {
    /// Long position - bought the asset, profit when price rises
    Long,
    /// Short position - sold borrowed asset, profit when price falls
    Short,
}

impl PositionSide {
    /// Returns the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            PositionSide::Long => PositionSide::Short,
            PositionSide::Short => PositionSide::Long,
        }
    }
}

/// Open position held by one strategy in one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Unique position identifier
    pub id: Uuid,
    pub symbol: Symbol,
    pub strategy_id: String,
    pub side: PositionSide,
    /// Current position quantity (always positive)
    pub quantity: Decimal,
    /// Average entry price
    pub entry_price: Decimal,
    pub stop_price: Option<Decimal>,
    pub target_price: Option<Decimal>,
    /// Current market price (for P&L calculation)
    pub mark_price: Decimal,
    /// When the position was opened
    pub opened_at: DateTime<Utc>,
}

impl Position {
    pub fn new(
        symbol: impl Into<Symbol>,
        strategy_id: impl Into<String>,
        side: PositionSide,
        quantity: Decimal,
        entry_price: Decimal,
        opened_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol: symbol.into(),
            strategy_id: strategy_id.into(),
            side,
            quantity,
            entry_price,
            stop_price: None,
            target_price: None,
            mark_price: entry_price,
            opened_at,
        }
    }

    /// Calculate unrealized P&L based on current mark price
    pub fn unrealized_pnl(&self) -> Decimal {
        let price_diff = self.mark_price - self.entry_price;
        match self.side {
            PositionSide::Long => self.quantity * price_diff,
            PositionSide::Short => self.quantity * -price_diff,
        }
    }

    /// Calculate current notional value
    pub fn notional_value(&self) -> Decimal {
        self.quantity * self.mark_price
    }

    /// Increase position size at a new price (weighted average entry)
    pub fn increase(&mut self, quantity: Decimal, price: Decimal) {
        let old_notional = self.quantity * self.entry_price;
        let new_notional = quantity * price;
        let total_quantity = self.quantity + quantity;

        if total_quantity > Decimal::ZERO {
            self.entry_price = (old_notional + new_notional) / total_quantity;
        }
        self.quantity = total_quantity;
    }

    /// Decrease position size, returning the realized P&L of the reduction
    pub fn decrease(&mut self, quantity: Decimal, price: Decimal) -> Decimal {
        let close_qty = quantity.min(self.quantity);
        let pnl = match self.side {
            PositionSide::Long => close_qty * (price - self.entry_price),
            PositionSide::Short => close_qty * (self.entry_price - price),
        };
        self.quantity -= close_qty;
        pnl
    }

    pub fn is_closed(&self) -> bool {
        self.quantity <= Decimal::ZERO
    }
}
