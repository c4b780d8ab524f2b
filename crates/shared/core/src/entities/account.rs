//! Account snapshot read by the risk pyramid

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Point-in-time view of the account, written only by the position tracker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountState {
    /// Cash balance (initial capital + realized P&L - fees)
    pub balance: Decimal,
    /// Balance + unrealized P&L
    pub equity: Decimal,
    /// High-water mark of equity, never decreases
    pub peak_equity: Decimal,
    /// (peak_equity - equity) / peak_equity
    pub drawdown: Decimal,
    /// Realized P&L of the current trading day
    pub daily_pnl: Decimal,
    pub day_start_equity: Decimal,
    /// Notional of open positions at mark
    pub open_notional: Decimal,
    /// Notional reserved by approved but unfilled orders
    pub pending_notional: Decimal,
    pub consecutive_losses_by_strategy: HashMap<String, u32>,
    /// Losing trades in a row across all strategies
    pub consecutive_losing_trades: u32,
    /// Finished trading days in a row with negative P&L
    pub consecutive_losing_days: u32,
    pub trading_day: NaiveDate,
    pub updated_at: DateTime<Utc>,
}

impl AccountState {
    /// Fresh account with all capital in cash
    pub fn new(initial_balance: Decimal, now: DateTime<Utc>) -> Self {
        Self {
            balance: initial_balance,
            equity: initial_balance,
            peak_equity: initial_balance,
            drawdown: Decimal::ZERO,
            daily_pnl: Decimal::ZERO,
            day_start_equity: initial_balance,
            open_notional: Decimal::ZERO,
            pending_notional: Decimal::ZERO,
            consecutive_losses_by_strategy: HashMap::new(),
            consecutive_losing_trades: 0,
            consecutive_losing_days: 0,
            trading_day: now.date_naive(),
            updated_at: now,
        }
    }

    /// Portfolio heat: committed notional / equity
    ///
    /// Non-positive equity reports infinite heat as `Decimal::MAX`.
    pub fn heat(&self) -> Decimal {
        if self.equity <= Decimal::ZERO {
            return Decimal::MAX;
        }
        (self.open_notional + self.pending_notional) / self.equity
    }

    /// Today's realized loss as a fraction of the day-start equity (0 if profitable)
    pub fn daily_loss_fraction(&self) -> Decimal {
        if self.daily_pnl >= Decimal::ZERO {
            return Decimal::ZERO;
        }
        if self.day_start_equity <= Decimal::ZERO {
            return Decimal::ONE;
        }
        -self.daily_pnl / self.day_start_equity
    }

    pub fn consecutive_losses(&self, strategy_id: &str) -> u32 {
        self.consecutive_losses_by_strategy
            .get(strategy_id)
            .copied()
            .unwrap_or(0)
    }
}
