//! Detector thresholds

use bastion_core::ConfigError;
use bastion_core::error::checks;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Tier 1: volume_t / volume_{t-1} must exceed this
    pub volume_ratio_threshold: Decimal,
    /// Tier 2: body_t / body_{t-1} must exceed this
    pub acceleration_threshold: Decimal,
    /// Tier 3: range_t / range_{t-1} must exceed this
    pub range_expansion_threshold: Decimal,
    /// Candle strength above this is a strong candle
    pub strong_candle_threshold: Decimal,
    /// Bars in the volume-climax window (current bar included)
    pub climax_lookback: usize,
    /// Upper bound for every ratio; also the value used when the previous
    /// bar's denominator is zero and the current one is not
    pub ratio_cap: Decimal,
    /// Max bars spent in Exhausting before returning to Idle
    pub grace_bars: u32,
    /// Gap between bars (seconds) above which tier computation is voided
    pub max_bar_gap_secs: Option<i64>,
    /// Aligned liquidation notional needed for a confidence boost (0 = off)
    pub liquidation_notional_threshold: Decimal,
    pub liquidation_confidence_boost: Decimal,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            volume_ratio_threshold: dec!(2.0),
            acceleration_threshold: dec!(1.5),
            range_expansion_threshold: dec!(1.3),
            strong_candle_threshold: dec!(0.6),
            climax_lookback: 20,
            ratio_cap: dec!(10),
            grace_bars: 3,
            max_bar_gap_secs: None,
            liquidation_notional_threshold: Decimal::ZERO,
            liquidation_confidence_boost: dec!(0.1),
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        checks::positive("detector.volume_ratio_threshold", self.volume_ratio_threshold)?;
        checks::positive("detector.acceleration_threshold", self.acceleration_threshold)?;
        checks::positive(
            "detector.range_expansion_threshold",
            self.range_expansion_threshold,
        )?;
        checks::fraction("detector.strong_candle_threshold", self.strong_candle_threshold)?;
        checks::non_zero("detector.climax_lookback", self.climax_lookback)?;

        let max_threshold = self
            .volume_ratio_threshold
            .max(self.acceleration_threshold)
            .max(self.range_expansion_threshold);
        if self.ratio_cap <= max_threshold {
            return Err(ConfigError::invalid(
                "detector.ratio_cap",
                format!("must exceed every tier threshold ({max_threshold})"),
            ));
        }
        if self.grace_bars == 0 {
            return Err(ConfigError::invalid("detector.grace_bars", "must be > 0"));
        }
        if let Some(gap) = self.max_bar_gap_secs
            && gap <= 0
        {
            return Err(ConfigError::invalid("detector.max_bar_gap_secs", "must be > 0"));
        }
        checks::non_negative(
            "detector.liquidation_notional_threshold",
            self.liquidation_notional_threshold,
        )?;
        checks::non_negative(
            "detector.liquidation_confidence_boost",
            self.liquidation_confidence_boost,
        )?;
        if self.liquidation_confidence_boost > Decimal::ONE {
            return Err(ConfigError::invalid(
                "detector.liquidation_confidence_boost",
                "must be <= 1",
            ));
        }
        Ok(())
    }
}
