mod account;
mod alert;
mod cascade;
mod intent;
mod market;
mod order;
mod position;
mod side;

pub use account::AccountState;
pub use alert::{Alert, AlertKind, ReasonCode};
pub use cascade::{CascadeEvent, CascadeMetrics, CascadePhase, Direction};
pub use intent::{HedgeLeg, IntentAction, TradeIntent};
pub use market::{Bar, FundingRate, LiquidationEvent};
pub use order::{ExecutionReport, ExecutionStatus, Fill, OrderRequest};
pub use position::{Position, PositionSide};
pub use side::Side;
