//! Single-symbol cascade detector
//!
//! Owns one symbol's state machine. Each bar is compared against the
//! previous accepted bar only; liquidations arriving between two bars are
//! accumulated and folded into the next bar's metrics.

use bastion_core::{
    Bar, CascadeEvent, CascadeMetrics, CascadePhase, Direction, LiquidationEvent, PositionSide,
    Symbol,
};
use bastion_stats::RollingWindow;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::DetectorConfig;

/// Current per-symbol state, readable by strategies and monitoring
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CascadeState {
    pub phase: CascadePhase,
    pub direction: Direction,
    pub volume_tier: bool,
    pub acceleration_tier: bool,
    pub range_tier: bool,
    pub candle_strength: Decimal,
    pub volume_climax: bool,
    pub confidence: Decimal,
    /// Start of the running episode (None while Idle)
    pub started_at: Option<DateTime<Utc>>,
    /// Strongest candle seen in the running episode
    pub peak_strength: Decimal,
    /// Bars spent in Exhausting so far
    pub exhausting_bars: u32,
}

pub struct CascadeDetector {
    symbol: Symbol,
    config: DetectorConfig,
    state: CascadeState,
    prev_bar: Option<Bar>,
    prev_strength: Option<Decimal>,
    volumes: RollingWindow,
    long_liquidations: Decimal,
    short_liquidations: Decimal,
    last_metrics: Option<CascadeMetrics>,
}

impl CascadeDetector {
    pub fn new(symbol: impl Into<Symbol>, config: DetectorConfig) -> Self {
        let volumes = RollingWindow::new(config.climax_lookback);
        Self {
            symbol: symbol.into(),
            config,
            state: CascadeState::default(),
            prev_bar: None,
            prev_strength: None,
            volumes,
            long_liquidations: Decimal::ZERO,
            short_liquidations: Decimal::ZERO,
            last_metrics: None,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn state(&self) -> &CascadeState {
        &self.state
    }

    pub fn phase(&self) -> CascadePhase {
        self.state.phase
    }

    /// Metrics of the last bar that produced a tier computation
    pub fn last_metrics(&self) -> Option<&CascadeMetrics> {
        self.last_metrics.as_ref()
    }

    /// Accumulate a liquidation until the next bar
    pub fn on_liquidation(&mut self, event: &LiquidationEvent) {
        if event.symbol != self.symbol {
            return;
        }
        match event.side {
            PositionSide::Long => {
                self.long_liquidations = self.long_liquidations.saturating_add(event.notional())
            }
            PositionSide::Short => {
                self.short_liquidations = self.short_liquidations.saturating_add(event.notional())
            }
        }
    }

    /// Process the next bar, returning an event if the phase changed
    pub fn on_bar(&mut self, bar: &Bar) -> Option<CascadeEvent> {
        if bar.symbol != self.symbol {
            warn!(
                "[CASCADE] {} detector received bar for {}, ignoring",
                self.symbol, bar.symbol
            );
            return None;
        }

        if let Some(prev) = &self.prev_bar
            && bar.timestamp <= prev.timestamp
        {
            debug!(
                "[CASCADE] {} out-of-order bar at {} (last {}), ignoring",
                self.symbol, bar.timestamp, prev.timestamp
            );
            return None;
        }

        // Malformed bars are dropped and the next good bar starts a fresh
        // reference; the phase is kept either way.
        if !bar.is_well_formed() {
            warn!(
                "[CASCADE] {} malformed bar at {}, tier computation voided",
                self.symbol, bar.timestamp
            );
            self.rebase(None);
            return None;
        }

        let Some(prev) = self.prev_bar.replace(bar.clone()) else {
            self.volumes.push(bar.volume);
            self.prev_strength = Some(candle_strength(bar));
            return None;
        };

        if let Some(max_gap) = self.config.max_bar_gap_secs
            && (bar.timestamp - prev.timestamp).num_seconds() > max_gap
        {
            warn!(
                "[CASCADE] {} gap of {}s before bar at {}, tier computation voided",
                self.symbol,
                (bar.timestamp - prev.timestamp).num_seconds(),
                bar.timestamp
            );
            self.volumes.push(bar.volume);
            self.rebase(Some(bar));
            return None;
        }

        self.volumes.push(bar.volume);
        let metrics = self.compute_metrics(&prev, bar);
        let event = self.advance(bar, &metrics);
        self.prev_strength = Some(metrics.candle_strength);
        self.last_metrics = Some(metrics);
        event
    }

    fn rebase(&mut self, reference: Option<&Bar>) {
        self.prev_bar = reference.cloned();
        self.prev_strength = reference.map(candle_strength);
        self.long_liquidations = Decimal::ZERO;
        self.short_liquidations = Decimal::ZERO;
    }

    fn compute_metrics(&mut self, prev: &Bar, bar: &Bar) -> CascadeMetrics {
        let cap = self.config.ratio_cap;
        let volume_ratio = guarded_ratio(bar.volume, prev.volume, cap);
        let acceleration = guarded_ratio(bar.body(), prev.body(), cap);
        let range_expansion = guarded_ratio(bar.range(), prev.range(), cap);
        let strength = candle_strength(bar);

        let volume_climax = bar.volume > Decimal::ZERO
            && self.volumes.max().is_some_and(|max| bar.volume >= max);

        let metrics = CascadeMetrics {
            volume_ratio,
            acceleration,
            range_expansion,
            volume_tier: volume_ratio > self.config.volume_ratio_threshold,
            acceleration_tier: acceleration > self.config.acceleration_threshold,
            range_tier: range_expansion > self.config.range_expansion_threshold,
            candle_strength: strength,
            strong_candle: strength > self.config.strong_candle_threshold,
            volume_climax,
            close: bar.close,
            high: bar.high,
            low: bar.low,
            long_liquidations: std::mem::take(&mut self.long_liquidations),
            short_liquidations: std::mem::take(&mut self.short_liquidations),
        };

        debug!(
            "[CASCADE] {} vol={} accel={} range={} strength={} climax={}",
            self.symbol,
            metrics.volume_ratio,
            metrics.acceleration,
            metrics.range_expansion,
            metrics.candle_strength,
            metrics.volume_climax
        );
        metrics
    }

    /// Mean tier excess over threshold, plus an aligned-liquidation boost
    fn confidence(&self, metrics: &CascadeMetrics, direction: Direction) -> Decimal {
        let score = |ratio: Decimal, threshold: Decimal| {
            ratio
                .checked_div(threshold)
                .map_or(Decimal::ONE, |r| (r - Decimal::ONE).clamp(Decimal::ZERO, Decimal::ONE))
        };
        let mut confidence = (score(metrics.volume_ratio, self.config.volume_ratio_threshold)
            + score(metrics.acceleration, self.config.acceleration_threshold)
            + score(metrics.range_expansion, self.config.range_expansion_threshold))
            / Decimal::from(3);

        let aligned = match direction {
            Direction::Bullish => metrics.short_liquidations,
            Direction::Bearish => metrics.long_liquidations,
        };
        let threshold = self.config.liquidation_notional_threshold;
        if threshold > Decimal::ZERO && aligned >= threshold {
            confidence += self.config.liquidation_confidence_boost;
        }
        confidence.min(Decimal::ONE)
    }

    fn advance(&mut self, bar: &Bar, metrics: &CascadeMetrics) -> Option<CascadeEvent> {
        let detected = metrics.cascade_detected();
        let strength = metrics.candle_strength;
        let declining = self.prev_strength.is_some_and(|prev| strength < prev);
        let previous = self.state.phase;

        let next = match previous {
            CascadePhase::Idle if detected => CascadePhase::Active,
            CascadePhase::Idle => CascadePhase::Idle,
            CascadePhase::Active if detected => CascadePhase::Active,
            CascadePhase::Active if declining && strength < self.state.peak_strength => {
                CascadePhase::Exhausting
            }
            CascadePhase::Active => CascadePhase::Idle,
            CascadePhase::Exhausting if detected => CascadePhase::Active,
            CascadePhase::Exhausting => {
                if declining && self.state.exhausting_bars + 1 < self.config.grace_bars {
                    CascadePhase::Exhausting
                } else {
                    CascadePhase::Idle
                }
            }
        };

        if detected {
            self.state.direction = if bar.is_bullish() {
                Direction::Bullish
            } else {
                Direction::Bearish
            };
        }
        let direction = self.state.direction;

        self.state.volume_tier = metrics.volume_tier;
        self.state.acceleration_tier = metrics.acceleration_tier;
        self.state.range_tier = metrics.range_tier;
        self.state.candle_strength = strength;
        self.state.volume_climax = metrics.volume_climax;
        self.state.confidence = self.confidence(metrics, direction);

        match (previous, next) {
            (CascadePhase::Idle, CascadePhase::Active) => {
                self.state.started_at = Some(bar.timestamp);
                self.state.peak_strength = strength;
            }
            (_, CascadePhase::Active) => {
                self.state.peak_strength = self.state.peak_strength.max(strength);
                self.state.exhausting_bars = 0;
            }
            (CascadePhase::Active, CascadePhase::Exhausting) => {
                self.state.exhausting_bars = 0;
            }
            (CascadePhase::Exhausting, CascadePhase::Exhausting) => {
                self.state.exhausting_bars += 1;
            }
            _ => {}
        }

        if next == previous {
            if next == CascadePhase::Idle {
                self.state.started_at = None;
            }
            return None;
        }

        let event = CascadeEvent {
            symbol: self.symbol.clone(),
            timestamp: bar.timestamp,
            phase: next,
            previous_phase: previous,
            direction,
            confidence: self.state.confidence,
            started_at: self.state.started_at,
            metrics: metrics.clone(),
        };

        info!(
            "[CASCADE] {} {:?} -> {:?} dir={:?} conf={:.3} climax={}",
            self.symbol,
            previous,
            next,
            direction,
            event.confidence,
            metrics.volume_climax
        );

        self.state.phase = next;
        if next == CascadePhase::Idle {
            self.state.started_at = None;
            self.state.peak_strength = Decimal::ZERO;
            self.state.exhausting_bars = 0;
        }
        Some(event)
    }
}

/// `current / previous` capped at `cap`.
/// A zero previous value with a non-zero current one yields the cap, as
/// does a quotient too large for a `Decimal`.
fn guarded_ratio(current: Decimal, previous: Decimal, cap: Decimal) -> Decimal {
    if previous > Decimal::ZERO {
        current.checked_div(previous).map_or(cap, |r| r.min(cap))
    } else if current > Decimal::ZERO {
        cap
    } else {
        Decimal::ZERO
    }
}

/// Body share of the range, 0 for a flat bar
fn candle_strength(bar: &Bar) -> Decimal {
    let range = bar.range();
    if range > Decimal::ZERO {
        bar.body()
            .checked_div(range)
            .map_or(Decimal::ONE, |s| s.min(Decimal::ONE))
    } else {
        Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn t(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap() + Duration::minutes(minute)
    }

    fn bar(minute: i64, open: Decimal, high: Decimal, low: Decimal, close: Decimal, volume: Decimal) -> Bar {
        Bar::new("BTC-USD", t(minute), open, high, low, close, volume)
    }

    /// Calm bar: body 1, range 2, volume 100
    fn calm(minute: i64) -> Bar {
        bar(minute, dec!(100), dec!(101.5), dec!(99.5), dec!(101), dec!(100))
    }

    /// Crash bar: body 8, range 10, volume 500 (all tiers)
    fn crash(minute: i64) -> Bar {
        bar(minute, dec!(101), dec!(101.5), dec!(91.5), dec!(93), dec!(500))
    }

    #[test]
    fn test_first_bar_never_detects() {
        let mut detector = CascadeDetector::new("BTC-USD", DetectorConfig::default());
        assert!(detector.on_bar(&crash(0)).is_none());
        assert_eq!(detector.phase(), CascadePhase::Idle);
        assert!(detector.last_metrics().is_none());
    }

    #[test]
    fn test_all_tiers_detect_cascade() {
        let _ = env_logger::try_init();
        let mut detector = CascadeDetector::new("BTC-USD", DetectorConfig::default());
        detector.on_bar(&calm(0));
        let event = detector.on_bar(&crash(1)).expect("onset event");

        assert!(event.is_onset());
        assert_eq!(event.direction, Direction::Bearish);
        assert_eq!(event.started_at, Some(t(1)));
        assert_eq!(event.metrics.volume_ratio, dec!(5));
        assert_eq!(event.metrics.acceleration, dec!(8));
        assert_eq!(event.metrics.range_expansion, dec!(5));
        assert!(event.metrics.volume_climax);
        assert!(event.metrics.strong_candle);
        // Every tier far beyond threshold saturates the score
        assert_eq!(event.confidence, Decimal::ONE);
    }

    #[test]
    fn test_missing_any_tier_suppresses_detection() {
        // Volume only 1.5x
        let mut detector = CascadeDetector::new("BTC-USD", DetectorConfig::default());
        detector.on_bar(&calm(0));
        let weak_volume = bar(1, dec!(101), dec!(101.5), dec!(91.5), dec!(93), dec!(150));
        assert!(detector.on_bar(&weak_volume).is_none());
        let metrics = detector.last_metrics().unwrap();
        assert!(!metrics.volume_tier && metrics.acceleration_tier && metrics.range_tier);

        // Body only 1.2x
        let mut detector = CascadeDetector::new("BTC-USD", DetectorConfig::default());
        detector.on_bar(&calm(0));
        let small_body = bar(1, dec!(101), dec!(104), dec!(94), dec!(99.8), dec!(500));
        assert!(detector.on_bar(&small_body).is_none());
        let metrics = detector.last_metrics().unwrap();
        assert!(metrics.volume_tier && !metrics.acceleration_tier && metrics.range_tier);

        // Range only 1.25x
        let mut detector = CascadeDetector::new("BTC-USD", DetectorConfig::default());
        detector.on_bar(&calm(0));
        let tight = bar(1, dec!(101), dec!(101.2), dec!(98.7), dec!(98.8), dec!(500));
        assert!(detector.on_bar(&tight).is_none());
        let metrics = detector.last_metrics().unwrap();
        assert!(metrics.volume_tier && metrics.acceleration_tier && !metrics.range_tier);
        assert_eq!(detector.phase(), CascadePhase::Idle);
    }

    #[test]
    fn test_zero_body_previous_bar_uses_ratio_cap() {
        let mut detector = CascadeDetector::new("BTC-USD", DetectorConfig::default());
        // Doji: open == close
        detector.on_bar(&bar(0, dec!(100), dec!(101), dec!(99), dec!(100), dec!(100)));
        let event = detector.on_bar(&crash(1)).expect("cascade after doji");
        assert_eq!(event.metrics.acceleration, dec!(10));
        assert!(event.metrics.acceleration_tier);
    }

    #[test]
    fn test_flat_bars_produce_zero_ratios() {
        let mut detector = CascadeDetector::new("BTC-USD", DetectorConfig::default());
        let flat = |m| bar(m, dec!(100), dec!(100), dec!(100), dec!(100), dec!(0));
        detector.on_bar(&flat(0));
        assert!(detector.on_bar(&flat(1)).is_none());
        let metrics = detector.last_metrics().unwrap();
        assert_eq!(metrics.volume_ratio, Decimal::ZERO);
        assert_eq!(metrics.candle_strength, Decimal::ZERO);
        assert!(!metrics.volume_climax);
    }

    #[test]
    fn test_ratios_are_capped() {
        let mut detector = CascadeDetector::new("BTC-USD", DetectorConfig::default());
        detector.on_bar(&bar(0, dec!(100), dec!(100.2), dec!(99.9), dec!(100.1), dec!(1)));
        detector.on_bar(&crash(1));
        let metrics = detector.last_metrics().unwrap();
        assert_eq!(metrics.volume_ratio, dec!(10));
        assert_eq!(metrics.acceleration, dec!(10));
        assert_eq!(metrics.range_expansion, dec!(10));
    }

    #[test]
    fn test_active_to_exhausting_to_idle() {
        let mut detector = CascadeDetector::new("BTC-USD", DetectorConfig::default());
        detector.on_bar(&calm(0));
        detector.on_bar(&crash(1));
        assert_eq!(detector.phase(), CascadePhase::Active);

        // Weaker candle, no new cascade: strength 0.5 < 0.8
        let fading = bar(2, dec!(93), dec!(94), dec!(90), dec!(91), dec!(300));
        let event = detector.on_bar(&fading).expect("exhausting event");
        assert_eq!(event.previous_phase, CascadePhase::Active);
        assert_eq!(event.phase, CascadePhase::Exhausting);
        assert_eq!(event.started_at, Some(t(1)));
        assert_eq!(event.direction, Direction::Bearish);

        // Strength stops declining: 0.5 == 0.5
        let stable = bar(3, dec!(91), dec!(91.5), dec!(90.5), dec!(90.5), dec!(100));
        let event = detector.on_bar(&stable).expect("idle event");
        assert_eq!(event.phase, CascadePhase::Idle);
        assert_eq!(event.started_at, Some(t(1)));
        assert!(detector.state().started_at.is_none());
    }

    #[test]
    fn test_exhausting_returns_to_idle_after_grace() {
        let config = DetectorConfig {
            grace_bars: 2,
            ..Default::default()
        };
        let mut detector = CascadeDetector::new("BTC-USD", config);
        detector.on_bar(&calm(0));
        detector.on_bar(&crash(1));

        // Strengths 0.7, 0.6, 0.5 keep declining without a new cascade
        let b2 = bar(2, dec!(93), dec!(93), dec!(83), dec!(86), dec!(100));
        let b3 = bar(3, dec!(86), dec!(86), dec!(76), dec!(80), dec!(100));
        let b4 = bar(4, dec!(80), dec!(80), dec!(70), dec!(75), dec!(100));

        assert_eq!(detector.on_bar(&b2).unwrap().phase, CascadePhase::Exhausting);
        assert!(detector.on_bar(&b3).is_none());
        assert_eq!(detector.state().exhausting_bars, 1);
        assert_eq!(detector.on_bar(&b4).unwrap().phase, CascadePhase::Idle);
    }

    #[test]
    fn test_active_drops_to_idle_when_not_declining() {
        let mut detector = CascadeDetector::new("BTC-USD", DetectorConfig::default());
        detector.on_bar(&calm(0));
        detector.on_bar(&crash(1));
        // Strength 1.0 >= 0.8 but no tiers: straight back to Idle
        let marubozu = bar(2, dec!(93), dec!(93), dec!(92), dec!(92), dec!(100));
        let event = detector.on_bar(&marubozu).unwrap();
        assert_eq!(event.previous_phase, CascadePhase::Active);
        assert_eq!(event.phase, CascadePhase::Idle);
    }

    #[test]
    fn test_repeated_detection_stays_active_without_event() {
        let mut detector = CascadeDetector::new("BTC-USD", DetectorConfig::default());
        detector.on_bar(&calm(0));
        detector.on_bar(&crash(1));
        let bigger = bar(2, dec!(93), dec!(93.5), dec!(43.5), dec!(53), dec!(5000));
        assert!(detector.on_bar(&bigger).is_none());
        assert_eq!(detector.phase(), CascadePhase::Active);
        assert_eq!(detector.state().started_at, Some(t(1)));
    }

    #[test]
    fn test_out_of_order_bar_ignored() {
        let mut detector = CascadeDetector::new("BTC-USD", DetectorConfig::default());
        detector.on_bar(&calm(5));
        assert!(detector.on_bar(&crash(4)).is_none());
        assert!(detector.on_bar(&crash(5)).is_none());
        assert!(detector.last_metrics().is_none());
        // Reference bar is still the calm one
        assert!(detector.on_bar(&crash(6)).is_some());
    }

    #[test]
    fn test_gap_voids_tier_computation() {
        let config = DetectorConfig {
            max_bar_gap_secs: Some(120),
            ..Default::default()
        };
        let mut detector = CascadeDetector::new("BTC-USD", config);
        detector.on_bar(&calm(0));
        assert!(detector.on_bar(&crash(10)).is_none());
        assert_eq!(detector.phase(), CascadePhase::Idle);
        assert!(detector.last_metrics().is_none());
    }

    #[test]
    fn test_malformed_bar_voids_and_rebases() {
        let mut detector = CascadeDetector::new("BTC-USD", DetectorConfig::default());
        detector.on_bar(&calm(0));
        detector.on_bar(&crash(1));
        // High below close
        let broken = bar(2, dec!(93), dec!(92), dec!(90), dec!(95), dec!(100));
        assert!(detector.on_bar(&broken).is_none());
        assert_eq!(detector.phase(), CascadePhase::Active);
        // Next good bar only re-establishes the reference
        assert!(detector.on_bar(&crash(3)).is_none());
        assert_eq!(detector.phase(), CascadePhase::Active);
        assert!(detector.on_bar(&calm(4)).is_some());
    }

    #[test]
    fn test_bullish_cascade_direction() {
        let mut detector = CascadeDetector::new("BTC-USD", DetectorConfig::default());
        detector.on_bar(&calm(0));
        let squeeze = bar(1, dec!(101), dec!(110.5), dec!(100.5), dec!(109), dec!(500));
        let event = detector.on_bar(&squeeze).unwrap();
        assert_eq!(event.direction, Direction::Bullish);
    }

    #[test]
    fn test_aligned_liquidations_boost_confidence() {
        let config = DetectorConfig {
            liquidation_notional_threshold: dec!(1_000_000),
            ..Default::default()
        };
        let mut detector = CascadeDetector::new("BTC-USD", config);
        detector.on_bar(&calm(0));

        // Just above threshold on every tier: each score is small
        let mild = bar(1, dec!(101), dec!(101.5), dec!(98.8), dec!(99.4), dec!(210));
        let liquidation = LiquidationEvent {
            symbol: "BTC-USD".into(),
            side: PositionSide::Long,
            size: dec!(20),
            price: dec!(100_000),
            leverage: dec!(20),
            exchange: "binance".into(),
            timestamp: t(1),
        };
        detector.on_liquidation(&liquidation);
        let boosted = detector.on_bar(&mild).unwrap();
        assert_eq!(boosted.metrics.long_liquidations, dec!(2_000_000));

        let mut plain = CascadeDetector::new("BTC-USD", DetectorConfig::default());
        plain.on_bar(&calm(0));
        let event = plain.on_bar(&mild).unwrap();

        assert_eq!(boosted.confidence - event.confidence, dec!(0.1));
    }

    #[test]
    fn test_guarded_ratio() {
        assert_eq!(guarded_ratio(dec!(4), dec!(2), dec!(10)), dec!(2));
        assert_eq!(guarded_ratio(dec!(4), dec!(0), dec!(10)), dec!(10));
        assert_eq!(guarded_ratio(dec!(0), dec!(0), dec!(10)), dec!(0));
        assert_eq!(guarded_ratio(dec!(100), dec!(2), dec!(10)), dec!(10));
        // Quotient past Decimal::MAX still lands on the cap
        let tiny = dec!(0.00000000000000000001);
        assert_eq!(guarded_ratio(dec!(100_000_000_000), tiny, dec!(10)), dec!(10));
    }

    #[test]
    fn test_extreme_volume_jump_is_capped() {
        let _ = env_logger::try_init();
        let mut detector = CascadeDetector::new("BTC-USD", DetectorConfig::default());
        let dust = dec!(0.00000000000000000001);
        detector.on_bar(&bar(0, dec!(100), dec!(101.5), dec!(99.5), dec!(101), dust));
        let surge = bar(1, dec!(101), dec!(101.5), dec!(91.5), dec!(93), dec!(100_000_000_000));
        let event = detector.on_bar(&surge).expect("onset event");

        let metrics = detector.last_metrics().unwrap();
        assert_eq!(metrics.volume_ratio, DetectorConfig::default().ratio_cap);
        assert!(metrics.volume_tier);
        assert!(event.confidence <= Decimal::ONE);
    }

    #[test]
    fn test_huge_liquidations_saturate() {
        let mut detector = CascadeDetector::new("BTC-USD", DetectorConfig::default());
        detector.on_bar(&calm(0));
        let huge = LiquidationEvent {
            symbol: "BTC-USD".into(),
            side: PositionSide::Long,
            size: Decimal::MAX,
            price: dec!(1),
            leverage: dec!(10),
            exchange: "binance".into(),
            timestamp: t(1),
        };
        detector.on_liquidation(&huge);
        detector.on_liquidation(&huge);
        detector.on_bar(&calm(1));
        assert_eq!(detector.last_metrics().unwrap().long_liquidations, Decimal::MAX);
    }
}
