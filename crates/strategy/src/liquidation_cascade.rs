//! Liquidation Cascade Strategy
//!
//! Trades cascade events from the detector. In fade mode it takes the other
//! side once forced flow climaxes; in momentum mode it joins the move at onset.
//! One intent per cascade episode at most.

use bastion_core::{
    Bar, CascadeEvent, CascadePhase, ConfigError, Side, TradeIntent,
};
use bastion_core::error::checks;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::strategy::{Strategy, validate_identity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeMode {
    /// Counter-trade the cascade at its volume climax
    #[default]
    Fade,
    /// Trade with the cascade at onset
    Momentum,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiquidationCascadeConfig {
    pub id: String,
    pub symbol: String,
    pub mode: CascadeMode,
    /// Events below this confidence are ignored
    pub min_confidence: Decimal,
    /// Stop distance as a multiple of the event bar's range
    pub stop_range_mult: Decimal,
    /// Target distance as a multiple of the event bar's range
    pub target_range_mult: Decimal,
}

impl Default for LiquidationCascadeConfig {
    fn default() -> Self {
        Self {
            id: "liquidation-cascade".to_string(),
            symbol: "BTC-USD".to_string(),
            mode: CascadeMode::Fade,
            min_confidence: dec!(0.5),
            stop_range_mult: dec!(0.5),
            target_range_mult: dec!(1.0),
        }
    }
}

impl LiquidationCascadeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_identity(&self.id, &self.symbol)?;
        checks::non_negative("liquidation_cascade.min_confidence", self.min_confidence)?;
        if self.min_confidence > Decimal::ONE {
            return Err(ConfigError::invalid(
                "liquidation_cascade.min_confidence",
                "must be <= 1",
            ));
        }
        checks::positive("liquidation_cascade.stop_range_mult", self.stop_range_mult)?;
        checks::positive("liquidation_cascade.target_range_mult", self.target_range_mult)?;
        Ok(())
    }
}

pub struct LiquidationCascadeStrategy {
    config: LiquidationCascadeConfig,
    /// `started_at` of the last episode traded
    last_episode: Option<DateTime<Utc>>,
}

impl LiquidationCascadeStrategy {
    pub fn new(config: LiquidationCascadeConfig) -> Self {
        Self {
            config,
            last_episode: None,
        }
    }

    fn entry_side(&self, event: &CascadeEvent) -> Option<Side> {
        match self.config.mode {
            CascadeMode::Fade => {
                let in_cascade = matches!(
                    event.phase,
                    CascadePhase::Active | CascadePhase::Exhausting
                );
                (in_cascade && event.metrics.volume_climax).then(|| event.direction.fade_side())
            }
            CascadeMode::Momentum => event.is_onset().then(|| event.direction.momentum_side()),
        }
    }
}

impl Strategy for LiquidationCascadeStrategy {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn symbol(&self) -> &str {
        &self.config.symbol
    }

    fn on_bar(&mut self, _bar: &Bar) -> Option<TradeIntent> {
        None
    }

    fn on_cascade_event(&mut self, event: &CascadeEvent) -> Option<TradeIntent> {
        if event.symbol != self.config.symbol {
            return None;
        }
        let episode = event.started_at?;
        if self.last_episode == Some(episode) {
            return None;
        }
        if event.confidence < self.config.min_confidence {
            log::debug!(
                "[LiquidationCascade] {} confidence {} below {}, ignoring",
                event.symbol,
                event.confidence,
                self.config.min_confidence
            );
            return None;
        }

        let side = self.entry_side(event)?;
        let entry = event.metrics.close;
        let range = event.metrics.high - event.metrics.low;
        if entry <= Decimal::ZERO || range <= Decimal::ZERO {
            return None;
        }
        let stop = entry - side.sign() * range * self.config.stop_range_mult;
        let target = entry + side.sign() * range * self.config.target_range_mult;

        self.last_episode = Some(episode);
        log::info!(
            "[LiquidationCascade] {:?} {:?} cascade on {} -> {} @ {} (stop={}, target={}, conf={:.3})",
            self.config.mode,
            event.direction,
            event.symbol,
            side.as_str(),
            entry,
            stop,
            target,
            event.confidence
        );

        Some(
            TradeIntent::open(&self.config.id, &self.config.symbol, side, entry, event.timestamp)
                .with_confidence(event.confidence)
                .with_stop(stop)
                .with_target(target),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bastion_core::{CascadeMetrics, Direction, IntentAction};
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, 5, 3, 0, 0).unwrap()
    }

    fn event(
        previous_phase: CascadePhase,
        phase: CascadePhase,
        direction: Direction,
        climax: bool,
        confidence: Decimal,
    ) -> CascadeEvent {
        CascadeEvent {
            symbol: "BTC-USD".to_string(),
            timestamp: t0() + Duration::minutes(1),
            phase,
            previous_phase,
            direction,
            confidence,
            started_at: Some(t0()),
            metrics: CascadeMetrics {
                volume_climax: climax,
                close: dec!(50000),
                high: dec!(51000),
                low: dec!(49000),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_fade_bearish_cascade_goes_long() {
        let _ = env_logger::try_init();
        let mut strategy = LiquidationCascadeStrategy::new(LiquidationCascadeConfig::default());
        let e = event(CascadePhase::Idle, CascadePhase::Active, Direction::Bearish, true, dec!(0.8));

        let intent = strategy.on_cascade_event(&e).expect("fade intent");
        assert_eq!(intent.side, Side::Buy);
        assert_eq!(intent.action, IntentAction::Open);
        assert_eq!(intent.suggested_entry, dec!(50000));
        // Range 2000: stop 0.5x below, target 1x above
        assert_eq!(intent.suggested_stop, Some(dec!(49000)));
        assert_eq!(intent.suggested_target, Some(dec!(52000)));
        assert_eq!(intent.confidence, dec!(0.8));
    }

    #[test]
    fn test_fade_bullish_cascade_goes_short() {
        let mut strategy = LiquidationCascadeStrategy::new(LiquidationCascadeConfig::default());
        let e = event(CascadePhase::Active, CascadePhase::Exhausting, Direction::Bullish, true, dec!(0.8));

        let intent = strategy.on_cascade_event(&e).unwrap();
        assert_eq!(intent.side, Side::Sell);
        assert_eq!(intent.suggested_stop, Some(dec!(51000)));
        assert!(intent.stop_is_consistent());
    }

    #[test]
    fn test_fade_waits_for_climax() {
        let mut strategy = LiquidationCascadeStrategy::new(LiquidationCascadeConfig::default());
        let e = event(CascadePhase::Idle, CascadePhase::Active, Direction::Bearish, false, dec!(0.9));
        assert!(strategy.on_cascade_event(&e).is_none());

        // Same episode reaches climax later
        let e = event(CascadePhase::Active, CascadePhase::Exhausting, Direction::Bearish, true, dec!(0.9));
        assert!(strategy.on_cascade_event(&e).is_some());
    }

    #[test]
    fn test_one_intent_per_episode() {
        let mut strategy = LiquidationCascadeStrategy::new(LiquidationCascadeConfig::default());
        let onset = event(CascadePhase::Idle, CascadePhase::Active, Direction::Bearish, true, dec!(0.9));
        let exhausting = event(CascadePhase::Active, CascadePhase::Exhausting, Direction::Bearish, true, dec!(0.9));

        assert!(strategy.on_cascade_event(&onset).is_some());
        assert!(strategy.on_cascade_event(&exhausting).is_none());

        let mut next = onset.clone();
        next.started_at = Some(t0() + Duration::hours(2));
        assert!(strategy.on_cascade_event(&next).is_some());
    }

    #[test]
    fn test_low_confidence_ignored() {
        let mut strategy = LiquidationCascadeStrategy::new(LiquidationCascadeConfig::default());
        let e = event(CascadePhase::Idle, CascadePhase::Active, Direction::Bearish, true, dec!(0.3));
        assert!(strategy.on_cascade_event(&e).is_none());
    }

    #[test]
    fn test_idle_event_never_trades() {
        let mut strategy = LiquidationCascadeStrategy::new(LiquidationCascadeConfig::default());
        let e = event(CascadePhase::Exhausting, CascadePhase::Idle, Direction::Bearish, true, dec!(0.9));
        assert!(strategy.on_cascade_event(&e).is_none());
    }

    #[test]
    fn test_momentum_mode_trades_onset_with_the_move() {
        let mut strategy = LiquidationCascadeStrategy::new(LiquidationCascadeConfig {
            mode: CascadeMode::Momentum,
            ..Default::default()
        });
        let exhausting = event(CascadePhase::Active, CascadePhase::Exhausting, Direction::Bearish, true, dec!(0.9));
        assert!(strategy.on_cascade_event(&exhausting).is_none());

        let onset = event(CascadePhase::Idle, CascadePhase::Active, Direction::Bearish, false, dec!(0.9));
        let intent = strategy.on_cascade_event(&onset).unwrap();
        assert_eq!(intent.side, Side::Sell);
        assert_eq!(intent.suggested_stop, Some(dec!(51000)));
        assert_eq!(intent.suggested_target, Some(dec!(48000)));
    }
}
