//! Bastion Core Domain
//!
//! Pure domain types shared by every Bastion component: market inputs
//! (bars, liquidations, funding), cascade events, trade intents, orders,
//! fills, positions, account snapshots and alerts.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod entities;
pub mod error;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{
    // Account & positions
    AccountState,
    // Alerts
    Alert,
    AlertKind,
    // Market inputs
    Bar,
    // Cascade classification
    CascadeEvent,
    CascadeMetrics,
    CascadePhase,
    Direction,
    // Execution
    ExecutionReport,
    ExecutionStatus,
    Fill,
    FundingRate,
    HedgeLeg,
    IntentAction,
    LiquidationEvent,
    OrderRequest,
    Position,
    PositionSide,
    ReasonCode,
    Side,
    // Strategy output
    TradeIntent,
};
pub use error::ConfigError;
pub use values::{Price, Quantity, Symbol, Timestamp};
