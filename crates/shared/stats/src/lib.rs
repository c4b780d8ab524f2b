//! Rolling statistics and bar indicators
//!
//! Every indicator updates incrementally bar-by-bar on `Decimal` values and
//! guards its own divisions: a degenerate window yields `None` or a neutral
//! value, never a panic.

pub mod atr;
pub mod bollinger;
pub mod returns;
pub mod rolling;
pub mod rsi;
pub mod vwap;

pub use atr::Atr;
pub use bollinger::{BollingerBands, Bands};
pub use returns::{ReturnSeries, ReturnSpan, aligned_correlation, historical_var, pearson_correlation};
pub use rolling::RollingWindow;
pub use rsi::Rsi;
pub use vwap::Vwap;
