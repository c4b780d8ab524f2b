//! Bastion Runner - Bar-Driven Trading Engine
//!
//! Wires every component into one loop:
//!
//! - **Config**: One validated JSON document for the whole engine
//! - **Input**: Bars, liquidations and funding rates as a tagged stream
//! - **Engine**: Detector, strategies, risk desk and order submission
//!
//! ## Architecture
//!
//! ```text
//!   MarketInput ──┬──► CascadeMonitor ──► CascadeEvent ──┬──► broadcast
//!                 │                                      │
//!                 ├──────────────────────────────────────┼──► Strategies
//!                 │                                      ▼        │
//!                 │                                 on_cascade    │ TradeIntent
//!                 ▼                                               ▼
//!           RiskDesk.on_bar ◄──── fills ────┐           ┌───────────────┐
//!                                           │           │   RiskDesk    │──► Alert broadcast
//!                                           │           └───────┬───────┘
//!                                           │                   │ OrderRequest
//!                                           │                   ▼
//!                                           │           ┌───────────────┐
//!                                           └───────────│ OrderSubmitter│ (JoinSet task per order)
//!                                                       └───────────────┘
//!                                                   ExecutionReport ──► originating strategy
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! let config = EngineConfig::from_file("bastion.json")?;
//! let gateway = Arc::new(PaperGateway::new(config.paper_fee_rate));
//! let mut engine = TradingEngine::new(config, gateway, Utc::now())?;
//! let mut alerts = engine.subscribe_alerts();
//! engine.on_bar(&bar).await;
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod input;

pub use config::{EngineConfig, StrategyEntry};
pub use engine::{EngineStats, TradingEngine};
pub use error::{EngineError, Result};
pub use input::MarketInput;
