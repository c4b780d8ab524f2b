//! Engine configuration
//!
//! One JSON document configures the whole engine. Every section has
//! defaults, so a file only needs what it changes:
//!
//! ```json
//! {
//!   "initial_balance": "25000",
//!   "risk": { "max_portfolio_heat": "0.4" },
//!   "strategies": [
//!     { "type": "vwap", "id": "vwap-btc", "symbol": "BTC-USD",
//!       "sizing": { "method": "fixed_fractional", "risk_pct": "0.01" } }
//!   ]
//! }
//! ```

use bastion_core::ConfigError;
use bastion_core::error::checks;
use bastion_detector::DetectorConfig;
use bastion_gateway::SubmitPolicy;
use bastion_risk_manager::{RiskLimits, SizingMethod, StrategyLimits, StrategyRisk};
use bastion_strategy::StrategyConfig;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// A strategy with its sizing method and optional limit override
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyEntry {
    #[serde(flatten)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub sizing: SizingMethod,
    #[serde(default)]
    pub limits: Option<StrategyLimits>,
}

impl StrategyEntry {
    pub fn new(strategy: StrategyConfig, sizing: SizingMethod) -> Self {
        Self {
            strategy,
            sizing,
            limits: None,
        }
    }

    pub fn with_limits(mut self, limits: StrategyLimits) -> Self {
        self.limits = Some(limits);
        self
    }

    pub fn risk(&self) -> StrategyRisk {
        StrategyRisk {
            sizing: self.sizing.clone(),
            limits: self.limits.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.strategy.validate()?;
        self.risk().validate(self.strategy.id())
    }
}

/// Root configuration for the trading engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub initial_balance: Decimal,
    pub detector: DetectorConfig,
    pub risk: RiskLimits,
    pub strategies: Vec<StrategyEntry>,
    pub execution: SubmitPolicy,
    /// Fee rate charged by the paper gateway
    pub paper_fee_rate: Decimal,
    /// Capacity of the cascade and alert broadcast channels
    pub channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_balance: dec!(10_000),
            detector: DetectorConfig::default(),
            risk: RiskLimits::default(),
            strategies: Vec::new(),
            execution: SubmitPolicy::default(),
            paper_fee_rate: dec!(0.0004),
            channel_capacity: 1024,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::from_json(&content)
    }

    /// Parse configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        checks::positive("initial_balance", self.initial_balance)?;
        checks::non_negative("paper_fee_rate", self.paper_fee_rate)?;
        checks::non_zero("channel_capacity", self.channel_capacity)?;
        self.detector.validate()?;
        self.risk.validate()?;
        self.execution.validate()?;

        let mut seen = HashSet::new();
        for entry in &self.strategies {
            entry.validate()?;
            if !seen.insert(entry.strategy.id()) {
                return Err(ConfigError::DuplicateStrategy(entry.strategy.id().to_string()));
            }
        }
        Ok(())
    }
}
