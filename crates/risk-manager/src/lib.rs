//! Bastion Risk Manager
//!
//! Every trade intent passes a five-layer pyramid before it becomes an order.
//! Unlike the strategies, which only see market data, the risk layers see the
//! whole book: open and pending notional, streaks, drawdown.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          RiskDesk                           │
//! │                  (tokio Mutex, single writer)               │
//! │                                                             │
//! │  TradeIntent ──► L1 VaR filter ──► L2 sizing                │
//! │                        ──► L3 strategy gates                │
//! │                        ──► L4 portfolio gates               │
//! │                        ──► L5 circuit breaker ──► Order     │
//! │                                                             │
//! │  Fills / Marks ──► PositionTracker ──► breaker check        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//!                 Alerts (rejections, trips, resets)
//! ```
//!
//! ## Layers
//!
//! | Layer | Check | Reason code |
//! |-------|-------|-------------|
//! | 1 | symbol VaR(95%) below floor | `VAR_FILTER` |
//! | 2 | sizing yields nothing | `ZERO_SIZE` |
//! | 3 | strategy loss streak / drawdown | `CONSECUTIVE_LOSSES` / `DRAWDOWN_LIMIT` |
//! | 4 | heat, correlation, daily loss | `EXCESS_HEAT` / `CORRELATION_LIMIT` / `DAILY_LOSS_LIMIT` |
//! | 5 | account limits breached | `CIRCUIT_BREAKER_TRIPPED` |

pub mod circuit_breaker;
pub mod desk;
pub mod manager;
pub mod market;
pub mod parameters;
pub mod sizing;

// Re-export main types
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerHandle, TripRecord};
pub use desk::RiskDesk;
pub use manager::{Rejection, RiskDecision, RiskManager};
pub use market::MarketState;
pub use parameters::{RiskLimits, StrategyLimits, StrategyRisk};
pub use sizing::{KELLY_CAP, SizingInputs, SizingMethod, kelly_fraction, raw_kelly};
