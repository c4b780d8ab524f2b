//! Bastion Portfolio
//!
//! Tracks positions at two levels:
//! 1. Per-strategy positions and realized P&L (for attribution and gating)
//! 2. The account: balance, equity curve, drawdown, daily P&L and streaks
//!
//! The [`PositionTracker`] is the only writer of [`AccountState`](bastion_core::AccountState).
//! Readers get cloned snapshots and never observe a half-applied fill.

pub mod tracker;

pub use tracker::{FillOutcome, PositionTracker, Reservation, StrategyStats};
