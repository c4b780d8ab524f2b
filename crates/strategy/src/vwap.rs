//! VWAP Deviation Strategy
//!
//! Fades stretches away from the session VWAP: sells when price trades too far
//! above it, buys when too far below, targeting a return to VWAP.

use bastion_core::{Bar, CascadeEvent, ConfigError, Side, TradeIntent};
use bastion_core::error::checks;
use bastion_stats::Vwap;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::strategy::{Strategy, validate_identity};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VwapConfig {
    pub id: String,
    pub symbol: String,
    /// |price - vwap| / vwap needed for a signal
    pub deviation_threshold: Decimal,
    /// Bars to stay quiet after a signal
    pub cooldown_bars: u32,
    /// Stop distance as a fraction of the entry
    pub stop_pct: Decimal,
}

impl Default for VwapConfig {
    fn default() -> Self {
        Self {
            id: "vwap".to_string(),
            symbol: "BTC-USD".to_string(),
            deviation_threshold: dec!(0.005),
            cooldown_bars: 3,
            stop_pct: dec!(0.01),
        }
    }
}

impl VwapConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_identity(&self.id, &self.symbol)?;
        checks::fraction("vwap.deviation_threshold", self.deviation_threshold)?;
        checks::fraction("vwap.stop_pct", self.stop_pct)?;
        Ok(())
    }
}

pub struct VwapStrategy {
    config: VwapConfig,
    vwap: Vwap,
    bars_since_signal: Option<u32>,
}

impl VwapStrategy {
    pub fn new(config: VwapConfig) -> Self {
        Self {
            config,
            vwap: Vwap::new(),
            bars_since_signal: None,
        }
    }

    pub fn vwap(&self) -> Option<Decimal> {
        self.vwap.value()
    }

    fn cooling_down(&self) -> bool {
        self.bars_since_signal
            .is_some_and(|bars| bars <= self.config.cooldown_bars)
    }
}

impl Strategy for VwapStrategy {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn symbol(&self) -> &str {
        &self.config.symbol
    }

    fn on_bar(&mut self, bar: &Bar) -> Option<TradeIntent> {
        if bar.symbol != self.config.symbol {
            return None;
        }
        if let Some(bars) = self.bars_since_signal.as_mut() {
            *bars += 1;
        }

        let vwap = self.vwap.update(bar.close, bar.volume, bar.timestamp)?;
        if vwap.is_zero() {
            return None;
        }
        let deviation = (bar.close - vwap) / vwap;
        if deviation.abs() <= self.config.deviation_threshold || self.cooling_down() {
            return None;
        }

        let side = if deviation > Decimal::ZERO {
            Side::Sell
        } else {
            Side::Buy
        };
        let stop = bar.close - side.sign() * bar.close * self.config.stop_pct;
        let confidence =
            (deviation.abs() / self.config.deviation_threshold / dec!(4)).min(Decimal::ONE);

        log::info!(
            "[VWAP] {} signal on {}: close={}, vwap={:.2}, deviation={:.4}",
            side.as_str(),
            bar.symbol,
            bar.close,
            vwap,
            deviation
        );
        self.bars_since_signal = Some(0);

        Some(
            TradeIntent::open(&self.config.id, &self.config.symbol, side, bar.close, bar.timestamp)
                .with_confidence(confidence)
                .with_stop(stop)
                .with_target(vwap),
        )
    }

    fn on_cascade_event(&mut self, _event: &CascadeEvent) -> Option<TradeIntent> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn bar(minute: i64, close: Decimal, volume: Decimal) -> Bar {
        Bar::new("BTC-USD", t(minute), close, close, close, close, volume)
    }

    #[test]
    fn test_vwap_round_trip_and_signals() {
        let _ = env_logger::try_init();
        let mut strategy = VwapStrategy::new(VwapConfig {
            cooldown_bars: 0,
            ..Default::default()
        });

        assert!(strategy.on_bar(&bar(0, dec!(50000), dec!(100))).is_none());
        assert_eq!(strategy.vwap(), Some(dec!(50000)));

        // VWAP 50090.9..., price 1.8% above: sell
        let sell = strategy.on_bar(&bar(1, dec!(51000), dec!(10))).unwrap();
        assert_eq!(sell.side, Side::Sell);
        assert_eq!(sell.suggested_stop, Some(dec!(51510)));

        // VWAP 49750, price 1.5% below: buy toward VWAP
        let buy = strategy.on_bar(&bar(2, dec!(49000), dec!(50))).unwrap();
        assert_eq!(strategy.vwap(), Some(dec!(49750)));
        assert_eq!(buy.side, Side::Buy);
        assert_eq!(buy.suggested_target, Some(dec!(49750)));
        assert_eq!(buy.suggested_stop, Some(dec!(48510)));
    }

    #[test]
    fn test_cooldown_suppresses_repeat_signals() {
        let mut strategy = VwapStrategy::new(VwapConfig {
            cooldown_bars: 2,
            ..Default::default()
        });
        strategy.on_bar(&bar(0, dec!(50000), dec!(100)));
        assert!(strategy.on_bar(&bar(1, dec!(51000), dec!(10))).is_some());
        assert!(strategy.on_bar(&bar(2, dec!(49000), dec!(50))).is_none());
        assert!(strategy.on_bar(&bar(3, dec!(49000), dec!(1))).is_none());
        assert!(strategy.on_bar(&bar(4, dec!(49000), dec!(1))).is_some());
    }

    #[test]
    fn test_within_threshold_no_signal() {
        let mut strategy = VwapStrategy::new(VwapConfig::default());
        strategy.on_bar(&bar(0, dec!(50000), dec!(100)));
        // 0.4% above a 50000-ish VWAP
        assert!(strategy.on_bar(&bar(1, dec!(50200), dec!(1))).is_none());
    }

    #[test]
    fn test_resets_at_utc_day_boundary() {
        let mut strategy = VwapStrategy::new(VwapConfig::default());
        strategy.on_bar(&bar(0, dec!(50000), dec!(100)));
        let next_day = Bar::new(
            "BTC-USD",
            t(0) + Duration::days(1),
            dec!(52000),
            dec!(52000),
            dec!(52000),
            dec!(52000),
            dec!(5),
        );
        // Fresh session: VWAP equals the first price, no deviation
        assert!(strategy.on_bar(&next_day).is_none());
        assert_eq!(strategy.vwap(), Some(dec!(52000)));
    }
}
