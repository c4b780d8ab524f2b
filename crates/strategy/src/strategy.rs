//! Strategy Trait and Variants
//!
//! Defines the interface every strategy implements and the closed set of
//! strategies the engine can run.

use bastion_core::{
    Bar, CascadeEvent, ConfigError, ExecutionReport, FundingRate, TradeIntent,
};
use serde::{Deserialize, Serialize};

use crate::funding_arbitrage::{FundingArbitrageConfig, FundingArbitrageStrategy};
use crate::liquidation_cascade::{LiquidationCascadeConfig, LiquidationCascadeStrategy};
use crate::mean_reversion::{MeanReversionConfig, MeanReversionStrategy};
use crate::vwap::{VwapConfig, VwapStrategy};

/// Strategy trait - implement this for your signal generator
pub trait Strategy: Send {
    /// Unique id, used for risk attribution and logging
    fn id(&self) -> &str;

    /// Symbol this strategy trades
    fn symbol(&self) -> &str;

    /// Called on every bar of any symbol
    fn on_bar(&mut self, bar: &Bar) -> Option<TradeIntent>;

    /// Called on every cascade phase transition
    fn on_cascade_event(&mut self, event: &CascadeEvent) -> Option<TradeIntent>;

    /// Called when a funding rate arrives (optional)
    fn on_funding(&mut self, _rate: &FundingRate) -> Option<TradeIntent> {
        None
    }

    /// Called with the outcome of every intent this strategy emitted (optional)
    fn on_execution(&mut self, _report: &ExecutionReport) {}
}

/// The strategies the engine can run
pub enum StrategyKind {
    MeanReversion(MeanReversionStrategy),
    LiquidationCascade(LiquidationCascadeStrategy),
    FundingArbitrage(FundingArbitrageStrategy),
    Vwap(VwapStrategy),
}

impl StrategyKind {
    fn inner(&self) -> &dyn Strategy {
        match self {
            StrategyKind::MeanReversion(s) => s,
            StrategyKind::LiquidationCascade(s) => s,
            StrategyKind::FundingArbitrage(s) => s,
            StrategyKind::Vwap(s) => s,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Strategy {
        match self {
            StrategyKind::MeanReversion(s) => s,
            StrategyKind::LiquidationCascade(s) => s,
            StrategyKind::FundingArbitrage(s) => s,
            StrategyKind::Vwap(s) => s,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            StrategyKind::MeanReversion(_) => "MeanReversion",
            StrategyKind::LiquidationCascade(_) => "LiquidationCascade",
            StrategyKind::FundingArbitrage(_) => "FundingArbitrage",
            StrategyKind::Vwap(_) => "Vwap",
        }
    }
}

impl Strategy for StrategyKind {
    fn id(&self) -> &str {
        self.inner().id()
    }

    fn symbol(&self) -> &str {
        self.inner().symbol()
    }

    fn on_bar(&mut self, bar: &Bar) -> Option<TradeIntent> {
        self.inner_mut().on_bar(bar)
    }

    fn on_cascade_event(&mut self, event: &CascadeEvent) -> Option<TradeIntent> {
        self.inner_mut().on_cascade_event(event)
    }

    fn on_funding(&mut self, rate: &FundingRate) -> Option<TradeIntent> {
        self.inner_mut().on_funding(rate)
    }

    fn on_execution(&mut self, report: &ExecutionReport) {
        self.inner_mut().on_execution(report)
    }
}

/// Serializable strategy definition, tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyConfig {
    MeanReversion(MeanReversionConfig),
    LiquidationCascade(LiquidationCascadeConfig),
    FundingArbitrage(FundingArbitrageConfig),
    Vwap(VwapConfig),
}

impl StrategyConfig {
    pub fn id(&self) -> &str {
        match self {
            StrategyConfig::MeanReversion(c) => &c.id,
            StrategyConfig::LiquidationCascade(c) => &c.id,
            StrategyConfig::FundingArbitrage(c) => &c.id,
            StrategyConfig::Vwap(c) => &c.id,
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            StrategyConfig::MeanReversion(c) => &c.symbol,
            StrategyConfig::LiquidationCascade(c) => &c.symbol,
            StrategyConfig::FundingArbitrage(c) => &c.symbol,
            StrategyConfig::Vwap(c) => &c.symbol,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            StrategyConfig::MeanReversion(c) => c.validate(),
            StrategyConfig::LiquidationCascade(c) => c.validate(),
            StrategyConfig::FundingArbitrage(c) => c.validate(),
            StrategyConfig::Vwap(c) => c.validate(),
        }
    }

    pub fn build(&self) -> StrategyKind {
        match self {
            StrategyConfig::MeanReversion(c) => {
                StrategyKind::MeanReversion(MeanReversionStrategy::new(c.clone()))
            }
            StrategyConfig::LiquidationCascade(c) => {
                StrategyKind::LiquidationCascade(LiquidationCascadeStrategy::new(c.clone()))
            }
            StrategyConfig::FundingArbitrage(c) => {
                StrategyKind::FundingArbitrage(FundingArbitrageStrategy::new(c.clone()))
            }
            StrategyConfig::Vwap(c) => StrategyKind::Vwap(VwapStrategy::new(c.clone())),
        }
    }
}

/// Shared id/symbol checks for every strategy config
pub(crate) fn validate_identity(id: &str, symbol: &str) -> Result<(), ConfigError> {
    if id.trim().is_empty() {
        return Err(ConfigError::invalid("strategy.id", "must not be empty"));
    }
    if symbol.trim().is_empty() {
        return Err(ConfigError::invalid(
            format!("strategy.{id}.symbol"),
            "must not be empty",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_from_tagged_json() {
        let json = r#"{
            "type": "liquidation_cascade",
            "id": "cascade-eth",
            "symbol": "ETH-USD",
            "mode": "momentum"
        }"#;
        let config: StrategyConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());

        let strategy = config.build();
        assert_eq!(strategy.id(), "cascade-eth");
        assert_eq!(strategy.symbol(), "ETH-USD");
        assert_eq!(strategy.kind_name(), "LiquidationCascade");
    }

    #[test]
    fn test_empty_id_rejected() {
        let config = StrategyConfig::Vwap(VwapConfig {
            id: " ".to_string(),
            ..Default::default()
        });
        assert!(config.validate().is_err());
    }
}
