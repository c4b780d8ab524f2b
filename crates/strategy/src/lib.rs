//! Bastion Strategy Framework
//!
//! Strategies turn market inputs into [`TradeIntent`](bastion_core::TradeIntent)s.
//! They never size, submit or touch account state; the risk pyramid decides
//! whether and how much to trade.
//!
//! ## Architecture
//!
//! ```text
//!   Bar ──────────────┐
//!   CascadeEvent ─────┤        ┌──────────────┐
//!   FundingRate ──────┼──────► │ StrategyKind │ ──► TradeIntent ──► RiskManager
//!   ExecutionReport ──┘        └──────────────┘
//!                               MeanReversion
//!                               LiquidationCascade
//!                               FundingArbitrage
//!                               Vwap
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bastion_strategy::{StrategyConfig, VwapConfig, Strategy};
//!
//! let config = StrategyConfig::Vwap(VwapConfig {
//!     id: "vwap-btc".to_string(),
//!     symbol: "BTC-USD".to_string(),
//!     ..Default::default()
//! });
//! config.validate()?;
//! let mut strategy = config.build();
//! let intent = strategy.on_bar(&bar);
//! ```

pub mod funding_arbitrage;
pub mod liquidation_cascade;
pub mod mean_reversion;
pub mod strategy;
pub mod vwap;

// Re-export main types
pub use funding_arbitrage::{FundingArbitrageConfig, FundingArbitrageStrategy};
pub use liquidation_cascade::{CascadeMode, LiquidationCascadeConfig, LiquidationCascadeStrategy};
pub use mean_reversion::{MeanReversionConfig, MeanReversionStrategy};
pub use strategy::{Strategy, StrategyConfig, StrategyKind};
pub use vwap::{VwapConfig, VwapStrategy};
