//! Cascade (market-stress) classification output

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Side;
use crate::values::Symbol;

/// Phase of a symbol's cascade state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CascadePhase {
    #[default]
    Idle,
    Active,
    Exhausting,
}

/// Direction of the cascade bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    Bullish,
    #[default]
    Bearish,
}

impl Direction {
    /// Side that trades with the move
    pub fn momentum_side(&self) -> Side {
        match self {
            Direction::Bullish => Side::Buy,
            Direction::Bearish => Side::Sell,
        }
    }

    /// Side that fades the move.
    /// Bullish cascade (shorts forced to cover) fades short,
    /// bearish cascade (longs forced to sell) fades long.
    pub fn fade_side(&self) -> Side {
        self.momentum_side().opposite()
    }
}

/// Per-bar metrics computed by the detector
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CascadeMetrics {
    pub volume_ratio: Decimal,
    pub acceleration: Decimal,
    pub range_expansion: Decimal,
    /// Tier 1: volume surge
    pub volume_tier: bool,
    /// Tier 2: body acceleration
    pub acceleration_tier: bool,
    /// Tier 3: range expansion
    pub range_tier: bool,
    pub candle_strength: Decimal,
    pub strong_candle: bool,
    pub volume_climax: bool,
    pub close: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    /// Liquidated long notional since the previous bar (forced selling)
    pub long_liquidations: Decimal,
    /// Liquidated short notional since the previous bar (forced buying)
    pub short_liquidations: Decimal,
}

impl CascadeMetrics {
    /// All three tiers aligned
    pub fn cascade_detected(&self) -> bool {
        self.volume_tier && self.acceleration_tier && self.range_tier
    }
}

/// Emitted on every phase transition of a symbol's cascade state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeEvent {
    pub symbol: Symbol,
    pub timestamp: DateTime<Utc>,
    pub phase: CascadePhase,
    pub previous_phase: CascadePhase,
    pub direction: Direction,
    /// 0.0 - 1.0, how far the tiers exceed their thresholds
    pub confidence: Decimal,
    /// When the current cascade episode started (None once back to Idle)
    pub started_at: Option<DateTime<Utc>>,
    pub metrics: CascadeMetrics,
}

impl CascadeEvent {
    /// Idle -> Active transition
    pub fn is_onset(&self) -> bool {
        self.previous_phase == CascadePhase::Idle && self.phase == CascadePhase::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fade_direction_mapping() {
        assert_eq!(Direction::Bullish.fade_side(), Side::Sell);
        assert_eq!(Direction::Bearish.fade_side(), Side::Buy);
        assert_eq!(Direction::Bullish.momentum_side(), Side::Buy);
    }

    #[test]
    fn test_detection_requires_all_tiers() {
        let mut metrics = CascadeMetrics {
            volume_tier: true,
            acceleration_tier: true,
            range_tier: true,
            ..Default::default()
        };
        assert!(metrics.cascade_detected());
        metrics.range_tier = false;
        assert!(!metrics.cascade_detected());
    }
}
