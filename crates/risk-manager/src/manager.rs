//! Risk Manager
//!
//! Runs every intent through the risk pyramid:
//! - Layer 1: VaR signal filter on the symbol's recent returns
//! - Layer 2: Position sizing with the strategy's sizing method
//! - Layer 3: Strategy gates (loss streak, strategy drawdown)
//! - Layer 4: Portfolio gates (heat, correlation, daily loss)
//! - Layer 5: Circuit breaker
//!
//! Layers only ever shrink the quantity. Close intents skip layers 1-4 and
//! are sized to the open position.

use bastion_core::{AccountState, Bar, OrderRequest, Position, PositionSide, ReasonCode, Side, TradeIntent};
use bastion_portfolio::PositionTracker;
use chrono::{DateTime, Utc};
use log::{info, warn};
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerHandle, TripRecord};
use crate::market::MarketState;
use crate::parameters::{RiskLimits, StrategyLimits, StrategyRisk};
use crate::sizing::SizingInputs;

/// Why an intent was refused
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub reason: ReasonCode,
    pub message: String,
}

impl Rejection {
    pub fn new(reason: ReasonCode, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RiskDecision {
    Approved(OrderRequest),
    Rejected(Rejection),
}

impl RiskDecision {
    pub fn is_approved(&self) -> bool {
        matches!(self, RiskDecision::Approved(_))
    }

    pub fn order(&self) -> Option<&OrderRequest> {
        match self {
            RiskDecision::Approved(order) => Some(order),
            RiskDecision::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            RiskDecision::Approved(_) => None,
            RiskDecision::Rejected(rejection) => Some(rejection),
        }
    }

    pub fn reason(&self) -> Option<ReasonCode> {
        self.rejection().map(|r| r.reason)
    }
}

pub struct RiskManager {
    limits: RiskLimits,
    strategies: HashMap<String, StrategyRisk>,
    market: MarketState,
    breaker: CircuitBreaker,
}

impl RiskManager {
    pub fn new(limits: RiskLimits) -> Self {
        let market = MarketState::new(&limits);
        Self {
            limits,
            strategies: HashMap::new(),
            market,
            breaker: CircuitBreaker::new(),
        }
    }

    /// Register sizing and limits for a strategy. Intents from unknown strategies are rejected.
    pub fn register_strategy(&mut self, strategy_id: impl Into<String>, risk: StrategyRisk) {
        self.strategies.insert(strategy_id.into(), risk);
    }

    pub fn limits(&self) -> &RiskLimits {
        &self.limits
    }

    pub fn market(&self) -> &MarketState {
        &self.market
    }

    pub fn strategy_limits(&self, strategy_id: &str) -> &StrategyLimits {
        self.strategies
            .get(strategy_id)
            .and_then(|s| s.limits.as_ref())
            .unwrap_or(&self.limits.default_strategy)
    }

    pub fn on_bar(&mut self, bar: &Bar) {
        self.market.on_bar(bar);
    }

    pub fn breaker_handle(&self) -> CircuitBreakerHandle {
        self.breaker.handle()
    }

    pub fn is_tripped(&self) -> bool {
        self.breaker.is_tripped()
    }

    pub fn active_trip(&self) -> Option<&TripRecord> {
        self.breaker.active_trip()
    }

    pub fn trip_history(&self) -> &[TripRecord] {
        self.breaker.history()
    }

    /// Halt all trading by hand
    pub fn trip_circuit_breaker(
        &mut self,
        reason: ReasonCode,
        message: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Option<TripRecord> {
        self.breaker.trip(reason, message, at)
    }

    /// Resume trading (manual intervention only)
    pub fn reset_circuit_breaker(&mut self, operator: &str, at: DateTime<Utc>) -> Option<TripRecord> {
        self.breaker.reset(operator, at)
    }

    /// Trip the breaker if any account-level limit is breached.
    /// Returns the record only when this call tripped it.
    pub fn check_circuit(&mut self, account: &AccountState, at: DateTime<Utc>) -> Option<TripRecord> {
        if self.breaker.is_tripped() {
            return None;
        }
        let (reason, message) = self.breached_limit(account)?;
        self.breaker.trip(reason, message, at)
    }

    fn breached_limit(&self, account: &AccountState) -> Option<(ReasonCode, String)> {
        let limits = &self.limits;
        let daily_loss = account.daily_loss_fraction();
        if daily_loss >= limits.max_daily_loss {
            return Some((
                ReasonCode::DailyLossLimit,
                format!("daily loss {:.4} >= {}", daily_loss, limits.max_daily_loss),
            ));
        }
        if account.drawdown >= limits.max_portfolio_drawdown {
            return Some((
                ReasonCode::DrawdownLimit,
                format!(
                    "drawdown {:.4} >= {}",
                    account.drawdown, limits.max_portfolio_drawdown
                ),
            ));
        }
        if account.consecutive_losing_trades >= limits.max_consecutive_losing_trades {
            return Some((
                ReasonCode::ConsecutiveLosses,
                format!(
                    "{} losing trades in a row",
                    account.consecutive_losing_trades
                ),
            ));
        }
        if account.consecutive_losing_days >= limits.max_consecutive_losing_days {
            return Some((
                ReasonCode::ConsecutiveLosses,
                format!("{} losing days in a row", account.consecutive_losing_days),
            ));
        }
        None
    }

    /// Evaluate an intent against the current book
    pub fn evaluate(&mut self, intent: &TradeIntent, tracker: &PositionTracker) -> RiskDecision {
        let decision = self.decide(intent, tracker);
        match &decision {
            RiskDecision::Approved(order) => info!(
                "[RISK] Approved {} {} {} {} @ {} for {} (reduce_only={})",
                intent.id,
                order.symbol,
                order.side.as_str(),
                order.quantity,
                order.entry_price,
                order.strategy_id,
                order.reduce_only
            ),
            RiskDecision::Rejected(rejection) => warn!(
                "[RISK] Rejected {} {} {} for {}: {} - {}",
                intent.id,
                intent.symbol,
                intent.side.as_str(),
                intent.strategy_id,
                rejection.reason,
                rejection.message
            ),
        }
        decision
    }

    fn decide(&mut self, intent: &TradeIntent, tracker: &PositionTracker) -> RiskDecision {
        if self.breaker.is_tripped() && !(intent.is_close() && self.limits.allow_exits_when_tripped) {
            return reject(ReasonCode::CircuitBreakerTripped, "circuit breaker is tripped");
        }
        if let Err(problem) = sanity_check(intent) {
            return reject(ReasonCode::InvalidIntent, problem);
        }
        if intent.is_close() {
            return close_decision(intent, tracker);
        }
        let Some(strategy) = self.strategies.get(&intent.strategy_id) else {
            return reject(
                ReasonCode::InvalidIntent,
                format!("unknown strategy {}", intent.strategy_id),
            );
        };
        let limits = strategy.limits.as_ref().unwrap_or(&self.limits.default_strategy);
        let account = tracker.account();

        // Layer 1: signal filter
        if let Some(var) = self.market.var(
            &intent.symbol,
            self.limits.var_confidence,
            self.limits.var_min_samples,
        ) && var < self.limits.var_floor
        {
            return reject(
                ReasonCode::VarFilter,
                format!("VaR {:.4} below floor {}", var, self.limits.var_floor),
            );
        }

        // Layer 2: sizing
        let inputs = SizingInputs {
            equity: account.equity * limits.allocation,
            entry: intent.suggested_entry,
            stop: intent.suggested_stop,
            atr: self.market.atr(&intent.symbol),
            volatility: self.market.volatility(&intent.symbol),
            average_volatility: self.market.average_volatility(&intent.symbol),
            kelly_cap: self.limits.kelly_cap,
        };
        let mut quantity = strategy.sizing.quantity(&inputs);
        if quantity <= Decimal::ZERO {
            return reject(
                ReasonCode::ZeroSize,
                format!("{} sizing produced {}", strategy.sizing.name(), quantity),
            );
        }

        // Layer 3: strategy gates
        let streak = account.consecutive_losses(&intent.strategy_id);
        if streak >= limits.max_consecutive_losses {
            return reject(
                ReasonCode::ConsecutiveLosses,
                format!(
                    "{} paused after {} losing trades",
                    intent.strategy_id, streak
                ),
            );
        }
        let capital = tracker.initial_balance() * limits.allocation;
        let strategy_drawdown = tracker.strategy_stats(&intent.strategy_id).drawdown(capital);
        if strategy_drawdown >= limits.max_strategy_drawdown {
            return reject(
                ReasonCode::DrawdownLimit,
                format!(
                    "{} drawdown {:.4} >= {}",
                    intent.strategy_id, strategy_drawdown, limits.max_strategy_drawdown
                ),
            );
        }

        // Layer 4: portfolio gates
        let heat = account.heat();
        if heat >= self.limits.max_portfolio_heat {
            return reject(
                ReasonCode::ExcessHeat,
                format!("heat {:.4} >= {}", heat, self.limits.max_portfolio_heat),
            );
        }
        let committed = account.open_notional + account.pending_notional;
        let headroom = self.limits.max_portfolio_heat * account.equity - committed;
        let max_quantity = headroom / intent.suggested_entry;
        if quantity > max_quantity {
            log::debug!(
                "[RISK] {} clamped from {} to {} by heat headroom {}",
                intent.id,
                quantity,
                max_quantity,
                headroom
            );
            quantity = max_quantity;
        }
        if quantity <= Decimal::ZERO {
            return reject(ReasonCode::ExcessHeat, "no heat headroom left");
        }

        for symbol in tracker.open_symbols() {
            if symbol == intent.symbol {
                continue;
            }
            if let Some(rho) = self.market.correlation(
                &intent.symbol,
                &symbol,
                self.limits.correlation_min_samples,
            ) && rho > self.limits.max_correlation
            {
                return reject(
                    ReasonCode::CorrelationLimit,
                    format!(
                        "{} correlation with open {} is {:.3} > {}",
                        intent.symbol, symbol, rho, self.limits.max_correlation
                    ),
                );
            }
        }

        let daily_loss = account.daily_loss_fraction();
        if daily_loss > self.limits.max_daily_loss {
            return reject(
                ReasonCode::DailyLossLimit,
                format!("daily loss {:.4} > {}", daily_loss, self.limits.max_daily_loss),
            );
        }

        // Layer 5: circuit breaker
        if self.check_circuit(account, intent.created_at).is_some() {
            return reject(ReasonCode::CircuitBreakerTripped, "circuit breaker tripped");
        }

        RiskDecision::Approved(OrderRequest::from_intent(intent, quantity))
    }
}

fn reject(reason: ReasonCode, message: impl Into<String>) -> RiskDecision {
    RiskDecision::Rejected(Rejection::new(reason, message))
}

fn sanity_check(intent: &TradeIntent) -> Result<(), String> {
    if intent.strategy_id.is_empty() || intent.symbol.is_empty() {
        return Err("missing strategy id or symbol".to_string());
    }
    if intent.suggested_entry <= Decimal::ZERO {
        return Err(format!("entry {} must be positive", intent.suggested_entry));
    }
    if intent.confidence < Decimal::ZERO || intent.confidence > Decimal::ONE {
        return Err(format!("confidence {} outside [0, 1]", intent.confidence));
    }
    if !intent.is_close() && !intent.stop_is_consistent() {
        return Err(format!(
            "stop {:?} on the wrong side of {} entry {}",
            intent.suggested_stop,
            intent.side.as_str(),
            intent.suggested_entry
        ));
    }
    Ok(())
}

fn closing_side(position: &Position) -> Side {
    match position.side {
        PositionSide::Long => Side::Sell,
        PositionSide::Short => Side::Buy,
    }
}

fn close_decision(intent: &TradeIntent, tracker: &PositionTracker) -> RiskDecision {
    let Some(position) = tracker.position(&intent.strategy_id, &intent.symbol) else {
        return reject(
            ReasonCode::NoOpenPosition,
            format!("{} has no open {} position", intent.strategy_id, intent.symbol),
        );
    };
    if closing_side(position) != intent.side {
        return reject(
            ReasonCode::InvalidIntent,
            format!(
                "{} would add to the {:?} position instead of closing it",
                intent.side.as_str(),
                position.side
            ),
        );
    }
    RiskDecision::Approved(OrderRequest::from_intent(intent, position.quantity))
}
