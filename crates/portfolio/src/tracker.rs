//! Position Tracking and P&L Attribution
//!
//! When a fill comes in, it is attributed to the strategy that generated the
//! order, the strategy's position on that symbol is opened, extended or
//! reduced, and realized P&L flows into the balance, the day's P&L and the
//! strategy's record. Every write recomputes equity, peak and drawdown.

use bastion_core::{AccountState, Fill, OrderRequest, Position, PositionSide, Symbol};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Notional held back for an approved order that has not filled yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub order_id: Uuid,
    pub strategy_id: String,
    pub symbol: Symbol,
    pub notional: Decimal,
    pub stop: Option<Decimal>,
    pub target: Option<Decimal>,
}

/// Realized record of one strategy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyStats {
    /// Realized P&L net of fees
    pub realized_pnl: Decimal,
    /// High-water mark of realized P&L (starts at zero)
    pub peak_realized_pnl: Decimal,
    pub trades: u64,
    pub wins: u64,
    pub losses: u64,
    pub total_fees: Decimal,
}

impl StrategyStats {
    /// Drawdown of `capital + realized_pnl` from its peak
    pub fn drawdown(&self, capital: Decimal) -> Decimal {
        let peak = capital + self.peak_realized_pnl;
        if peak <= Decimal::ZERO {
            return if self.realized_pnl < Decimal::ZERO {
                Decimal::ONE
            } else {
                Decimal::ZERO
            };
        }
        ((peak - (capital + self.realized_pnl)) / peak).max(Decimal::ZERO)
    }
}

/// What a fill did to the book
#[derive(Debug, Clone, PartialEq)]
pub struct FillOutcome {
    /// Net P&L of the closed part, if the fill reduced a position
    pub realized_pnl: Option<Decimal>,
    /// Remaining quantity of the strategy's position on the symbol
    pub position_quantity: Decimal,
    pub position_closed: bool,
}

#[derive(Debug, Clone)]
pub struct PositionTracker {
    initial_balance: Decimal,
    account: AccountState,
    /// Open position per (strategy_id, symbol)
    positions: HashMap<(String, Symbol), Position>,
    reservations: HashMap<Uuid, Reservation>,
    strategies: HashMap<String, StrategyStats>,
}

impl PositionTracker {
    pub fn new(initial_balance: Decimal, now: DateTime<Utc>) -> Self {
        Self {
            initial_balance,
            account: AccountState::new(initial_balance, now),
            positions: HashMap::new(),
            reservations: HashMap::new(),
            strategies: HashMap::new(),
        }
    }

    /// Starting capital, the base for per-strategy allocations
    pub fn initial_balance(&self) -> Decimal {
        self.initial_balance
    }

    /// Cloned account state
    pub fn snapshot(&self) -> AccountState {
        self.account.clone()
    }

    /// Borrowed account state, for readers already holding the tracker
    pub fn account(&self) -> &AccountState {
        &self.account
    }

    pub fn position(&self, strategy_id: &str, symbol: &str) -> Option<&Position> {
        self.positions
            .get(&(strategy_id.to_string(), symbol.to_string()))
    }

    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    /// Distinct symbols with at least one open position
    pub fn open_symbols(&self) -> Vec<Symbol> {
        let mut symbols: Vec<Symbol> = self.positions.values().map(|p| p.symbol.clone()).collect();
        symbols.sort();
        symbols.dedup();
        symbols
    }

    pub fn strategy_stats(&self, strategy_id: &str) -> StrategyStats {
        self.strategies.get(strategy_id).cloned().unwrap_or_default()
    }

    pub fn reservation(&self, order_id: &Uuid) -> Option<&Reservation> {
        self.reservations.get(order_id)
    }

    /// Hold back notional for an approved order. Reduce-only orders add no exposure.
    pub fn reserve(&mut self, order: &OrderRequest) {
        if order.reduce_only {
            return;
        }
        self.reservations.insert(
            order.id,
            Reservation {
                order_id: order.id,
                strategy_id: order.strategy_id.clone(),
                symbol: order.symbol.clone(),
                notional: order.notional(),
                stop: order.stop,
                target: order.target,
            },
        );
        self.recompute(order.created_at);
    }

    /// Drop a reservation after a failed or abandoned order
    pub fn release(&mut self, order_id: &Uuid, at: DateTime<Utc>) -> Option<Reservation> {
        let released = self.reservations.remove(order_id);
        if released.is_some() {
            self.recompute(at);
        }
        released
    }

    /// Apply an execution fill
    pub fn apply_fill(&mut self, fill: &Fill) -> FillOutcome {
        self.roll_if_new_day(fill.timestamp);
        let reservation = self.reservations.remove(&fill.order_id);

        if fill.quantity <= Decimal::ZERO || fill.price <= Decimal::ZERO {
            log::warn!(
                "[PORTFOLIO] ignoring degenerate fill {} ({} @ {})",
                fill.order_id,
                fill.quantity,
                fill.price
            );
            self.recompute(fill.timestamp);
            return FillOutcome {
                realized_pnl: None,
                position_quantity: self.quantity_of(&fill.strategy_id, &fill.symbol),
                position_closed: false,
            };
        }

        // Fees are a cost whatever the fill does
        self.account.balance -= fill.fee;
        self.account.daily_pnl -= fill.fee;
        let stats = self.strategies.entry(fill.strategy_id.clone()).or_default();
        stats.total_fees += fill.fee;

        let key = (fill.strategy_id.clone(), fill.symbol.clone());
        let fill_side = fill.side.position_side();
        let mut remaining = fill.quantity;
        let mut realized = None;

        if let Some(position) = self.positions.get_mut(&key)
            && position.side != fill_side
        {
            // Opposite-side fill reduces first
            let close_qty = remaining.min(position.quantity);
            let gross = position.decrease(close_qty, fill.price);
            remaining -= close_qty;
            realized = Some(gross - fill.fee);
            self.account.balance += gross;
            self.account.daily_pnl += gross;
            if position.is_closed() {
                self.positions.remove(&key);
            }
        }

        if remaining > Decimal::ZERO {
            if fill.reduce_only {
                log::warn!(
                    "[PORTFOLIO] reduce-only fill {} for {}/{} exceeds position by {}",
                    fill.order_id,
                    fill.strategy_id,
                    fill.symbol,
                    remaining
                );
            } else {
                self.open_or_extend(key, fill, fill_side, remaining, reservation.as_ref());
            }
        }

        if let Some(net) = realized {
            self.record_trade(&fill.strategy_id, net);
        } else {
            let stats = self.strategies.entry(fill.strategy_id.clone()).or_default();
            stats.realized_pnl -= fill.fee;
        }

        self.recompute(fill.timestamp);

        let position_quantity = self.quantity_of(&fill.strategy_id, &fill.symbol);
        log::info!(
            "[PORTFOLIO] fill {} {} {} @ {} for {} -> position {} realized={:?}",
            fill.symbol,
            fill.side.as_str(),
            fill.quantity,
            fill.price,
            fill.strategy_id,
            position_quantity,
            realized
        );

        FillOutcome {
            realized_pnl: realized,
            position_quantity,
            position_closed: realized.is_some() && position_quantity.is_zero(),
        }
    }

    /// Mark every position on `symbol` to `price`
    pub fn mark(&mut self, symbol: &str, price: Decimal, at: DateTime<Utc>) {
        if price <= Decimal::ZERO {
            return;
        }
        self.roll_if_new_day(at);
        for position in self.positions.values_mut().filter(|p| p.symbol == symbol) {
            position.mark_price = price;
        }
        self.recompute(at);
    }

    /// Close the current trading day and start `next_day`
    pub fn roll_day(&mut self, next_day: NaiveDate, at: DateTime<Utc>) {
        let finished = self.account.daily_pnl;
        if finished < Decimal::ZERO {
            self.account.consecutive_losing_days += 1;
        } else {
            self.account.consecutive_losing_days = 0;
        }
        log::info!(
            "[PORTFOLIO] day {} closed with P&L {} (losing days in a row: {})",
            self.account.trading_day,
            finished,
            self.account.consecutive_losing_days
        );
        self.account.daily_pnl = Decimal::ZERO;
        self.account.day_start_equity = self.account.equity;
        self.account.trading_day = next_day;
        self.account.updated_at = at;
    }

    fn roll_if_new_day(&mut self, at: DateTime<Utc>) {
        let day = at.date_naive();
        if day > self.account.trading_day {
            self.roll_day(day, at);
        }
    }

    fn open_or_extend(
        &mut self,
        key: (String, Symbol),
        fill: &Fill,
        side: PositionSide,
        quantity: Decimal,
        reservation: Option<&Reservation>,
    ) {
        match self.positions.get_mut(&key) {
            Some(position) => position.increase(quantity, fill.price),
            None => {
                let mut position = Position::new(
                    fill.symbol.clone(),
                    fill.strategy_id.clone(),
                    side,
                    quantity,
                    fill.price,
                    fill.timestamp,
                );
                if let Some(reservation) = reservation {
                    position.stop_price = reservation.stop;
                    position.target_price = reservation.target;
                }
                self.positions.insert(key, position);
            }
        }
    }

    /// Attribute a closed trade and update the loss streaks
    fn record_trade(&mut self, strategy_id: &str, net: Decimal) {
        let stats = self.strategies.entry(strategy_id.to_string()).or_default();
        stats.realized_pnl += net;
        stats.peak_realized_pnl = stats.peak_realized_pnl.max(stats.realized_pnl);
        stats.trades += 1;

        let streak = self
            .account
            .consecutive_losses_by_strategy
            .entry(strategy_id.to_string())
            .or_insert(0);

        if net < Decimal::ZERO {
            stats.losses += 1;
            *streak += 1;
            self.account.consecutive_losing_trades += 1;
        } else if net > Decimal::ZERO {
            stats.wins += 1;
            *streak = 0;
            self.account.consecutive_losing_trades = 0;
        }
    }

    fn quantity_of(&self, strategy_id: &str, symbol: &str) -> Decimal {
        self.position(strategy_id, symbol)
            .map(|p| p.quantity)
            .unwrap_or(Decimal::ZERO)
    }

    fn recompute(&mut self, at: DateTime<Utc>) {
        let unrealized: Decimal = self.positions.values().map(|p| p.unrealized_pnl()).sum();
        let open_notional: Decimal = self.positions.values().map(|p| p.notional_value().abs()).sum();
        let pending_notional: Decimal = self.reservations.values().map(|r| r.notional).sum();

        let account = &mut self.account;
        account.equity = account.balance + unrealized;
        account.peak_equity = account.peak_equity.max(account.equity);
        account.drawdown = if account.peak_equity > Decimal::ZERO {
            ((account.peak_equity - account.equity) / account.peak_equity).max(Decimal::ZERO)
        } else {
            Decimal::ZERO
        };
        account.open_notional = open_notional;
        account.pending_notional = pending_notional;
        account.updated_at = at;
    }
}
