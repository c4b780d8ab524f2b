//! Risk Limits
//!
//! Portfolio-wide limits, per-strategy limits and the pluggable sizing
//! method. All of it deserializes from the engine config and is validated
//! once at startup.

use bastion_core::ConfigError;
use bastion_core::error::checks;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::sizing::{KELLY_CAP, SizingMethod};

/// Portfolio-wide risk limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskLimits {
    /// Reject when the symbol's VaR falls below this return
    pub var_floor: Decimal,
    pub var_confidence: Decimal,
    /// Returns needed before the VaR filter applies
    pub var_min_samples: usize,
    /// Bar returns kept per symbol
    pub returns_window: usize,
    pub atr_period: usize,
    /// Volatility readings averaged for volatility-adjusted sizing
    pub volatility_window: usize,
    /// Ceiling on Kelly fractions (never above 0.25)
    pub kelly_cap: Decimal,
    /// (open + pending notional) / equity
    pub max_portfolio_heat: Decimal,
    pub max_correlation: Decimal,
    pub correlation_min_samples: usize,
    /// Realized daily loss / day-start equity
    pub max_daily_loss: Decimal,
    /// Peak-to-current equity drawdown that trips the breaker
    pub max_portfolio_drawdown: Decimal,
    pub max_consecutive_losing_trades: u32,
    pub max_consecutive_losing_days: u32,
    /// Let close intents through while the breaker is tripped
    pub allow_exits_when_tripped: bool,
    /// Limits for strategies without an override
    pub default_strategy: StrategyLimits,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            var_floor: dec!(-0.05),
            var_confidence: dec!(0.95),
            var_min_samples: 20,
            returns_window: 100,
            atr_period: 14,
            volatility_window: 50,
            kelly_cap: KELLY_CAP,
            max_portfolio_heat: dec!(0.5),
            max_correlation: dec!(0.70),
            correlation_min_samples: 10,
            max_daily_loss: dec!(0.05),
            max_portfolio_drawdown: dec!(0.20),
            max_consecutive_losing_trades: 8,
            max_consecutive_losing_days: 3,
            allow_exits_when_tripped: false,
            default_strategy: StrategyLimits::default(),
        }
    }
}

impl RiskLimits {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.var_floor >= Decimal::ZERO || self.var_floor < Decimal::NEGATIVE_ONE {
            return Err(ConfigError::invalid(
                "risk.var_floor",
                "must be a negative return in [-1, 0)",
            ));
        }
        if self.var_confidence <= dec!(0.5) || self.var_confidence >= Decimal::ONE {
            return Err(ConfigError::invalid(
                "risk.var_confidence",
                "must lie in (0.5, 1)",
            ));
        }
        checks::non_zero("risk.var_min_samples", self.var_min_samples)?;
        checks::non_zero("risk.returns_window", self.returns_window)?;
        checks::non_zero("risk.atr_period", self.atr_period)?;
        checks::non_zero("risk.volatility_window", self.volatility_window)?;
        checks::non_zero("risk.correlation_min_samples", self.correlation_min_samples)?;
        if self.var_min_samples > self.returns_window {
            return Err(ConfigError::invalid(
                "risk.var_min_samples",
                "cannot exceed returns_window",
            ));
        }
        if self.correlation_min_samples < 2 || self.correlation_min_samples > self.returns_window {
            return Err(ConfigError::invalid(
                "risk.correlation_min_samples",
                "must lie in [2, returns_window]",
            ));
        }
        checks::fraction("risk.kelly_cap", self.kelly_cap)?;
        if self.kelly_cap > KELLY_CAP {
            return Err(ConfigError::invalid(
                "risk.kelly_cap",
                format!("cannot exceed {}", KELLY_CAP),
            ));
        }
        checks::fraction("risk.max_portfolio_heat", self.max_portfolio_heat)?;
        checks::fraction("risk.max_correlation", self.max_correlation)?;
        checks::fraction("risk.max_daily_loss", self.max_daily_loss)?;
        checks::fraction("risk.max_portfolio_drawdown", self.max_portfolio_drawdown)?;
        if self.max_consecutive_losing_trades == 0 || self.max_consecutive_losing_days == 0 {
            return Err(ConfigError::invalid(
                "risk.max_consecutive_losing_trades",
                "losing streak limits must be > 0",
            ));
        }
        self.default_strategy.validate("risk.default_strategy")
    }
}

/// Limits for a specific strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyLimits {
    /// Share of the initial balance this strategy answers for
    pub allocation: Decimal,
    /// Losing trades in a row before the strategy is paused
    pub max_consecutive_losses: u32,
    /// Drawdown of the strategy's realized P&L against its allocation
    pub max_strategy_drawdown: Decimal,
}

impl Default for StrategyLimits {
    fn default() -> Self {
        Self {
            allocation: Decimal::ONE,
            max_consecutive_losses: 5,
            max_strategy_drawdown: dec!(0.20),
        }
    }
}

impl StrategyLimits {
    pub fn validate(&self, scope: &str) -> Result<(), ConfigError> {
        checks::fraction(&format!("{}.allocation", scope), self.allocation)?;
        checks::fraction(
            &format!("{}.max_strategy_drawdown", scope),
            self.max_strategy_drawdown,
        )?;
        if self.max_consecutive_losses == 0 {
            return Err(ConfigError::invalid(
                format!("{}.max_consecutive_losses", scope),
                "must be > 0",
            ));
        }
        Ok(())
    }
}

/// What the risk manager knows about one registered strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRisk {
    pub sizing: SizingMethod,
    /// Override of `RiskLimits::default_strategy`
    #[serde(default)]
    pub limits: Option<StrategyLimits>,
}

impl StrategyRisk {
    pub fn new(sizing: SizingMethod) -> Self {
        Self {
            sizing,
            limits: None,
        }
    }

    pub fn with_limits(mut self, limits: StrategyLimits) -> Self {
        self.limits = Some(limits);
        self
    }

    pub fn validate(&self, strategy_id: &str) -> Result<(), ConfigError> {
        self.sizing.validate(strategy_id)?;
        if let Some(limits) = &self.limits {
            limits.validate(&format!("{}.limits", strategy_id))?;
        }
        Ok(())
    }
}
