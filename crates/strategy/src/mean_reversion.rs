//! Mean Reversion Strategy
//!
//! A long-only oversold-bounce strategy that:
//! - Buys when the close pierces the lower Bollinger band AND RSI is oversold
//! - Places its stop a further band-width below the mean
//! - Targets a return to the middle band
//! - Closes when price is back at the mean or RSI recovers
//!
//! Holding state is driven by execution reports, not by its own signals, so
//! an entry the risk layer rejects never produces an exit later.

use bastion_core::{
    Bar, CascadeEvent, ConfigError, ExecutionReport, IntentAction, Side, TradeIntent,
};
use bastion_core::error::checks;
use bastion_stats::{BollingerBands, Rsi};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::strategy::{Strategy, validate_identity};

/// Configuration for mean reversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeanReversionConfig {
    pub id: String,
    /// Instrument to trade
    pub symbol: String,
    /// Bollinger window (bars)
    pub bb_period: usize,
    /// Band width in population standard deviations
    pub bb_std: Decimal,
    pub rsi_period: usize,
    /// Enter only below this RSI
    pub rsi_entry: Decimal,
    /// Exit once RSI rises above this
    pub rsi_exit: Decimal,
    /// Stop distance below the mean, in standard deviations
    pub stop_std: Decimal,
}

impl Default for MeanReversionConfig {
    fn default() -> Self {
        Self {
            id: "mean-reversion".to_string(),
            symbol: "BTC-USD".to_string(),
            bb_period: 20,
            bb_std: dec!(2),
            rsi_period: 14,
            rsi_entry: dec!(30),
            rsi_exit: dec!(50),
            stop_std: dec!(3),
        }
    }
}

impl MeanReversionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_identity(&self.id, &self.symbol)?;
        checks::non_zero("mean_reversion.bb_period", self.bb_period)?;
        checks::non_zero("mean_reversion.rsi_period", self.rsi_period)?;
        checks::positive("mean_reversion.bb_std", self.bb_std)?;
        if self.stop_std <= self.bb_std {
            return Err(ConfigError::invalid(
                "mean_reversion.stop_std",
                "must be wider than bb_std",
            ));
        }
        if self.rsi_entry <= Decimal::ZERO || self.rsi_exit > dec!(100) {
            return Err(ConfigError::invalid(
                "mean_reversion.rsi_entry",
                "RSI levels must lie in (0, 100]",
            ));
        }
        if self.rsi_entry >= self.rsi_exit {
            return Err(ConfigError::invalid(
                "mean_reversion.rsi_entry",
                "must be below rsi_exit",
            ));
        }
        Ok(())
    }
}

pub struct MeanReversionStrategy {
    config: MeanReversionConfig,
    bands: BollingerBands,
    rsi: Rsi,
    /// Filled long position awaiting exit
    holding: bool,
    /// Intent sent and not yet reported back
    pending: Option<Uuid>,
}

impl MeanReversionStrategy {
    pub fn new(config: MeanReversionConfig) -> Self {
        let bands = BollingerBands::new(config.bb_period, config.bb_std);
        let rsi = Rsi::new(config.rsi_period);
        Self {
            config,
            bands,
            rsi,
            holding: false,
            pending: None,
        }
    }

    pub fn is_holding(&self) -> bool {
        self.holding
    }

    /// Deeper oversold readings give more conviction (0.5 at the entry level)
    fn confidence(&self, rsi: Decimal) -> Decimal {
        dec!(0.5) + (self.config.rsi_entry - rsi) / (dec!(2) * self.config.rsi_entry)
    }
}

impl Strategy for MeanReversionStrategy {
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

        // Both indicators must see every bar, even while waiting on a report
        let bands = self.bands.update(bar.close);
        let rsi = self.rsi.update(bar.close);
        let (bands, rsi) = (bands?, rsi?);

        if self.pending.is_some() {
            return None;
        }

        if self.holding {
            if bar.close >= bands.middle || rsi > self.config.rsi_exit {
                log::info!(
                    "[MeanReversion] EXIT signal: close={}, middle={}, rsi={:.2}",
                    bar.close,
                    bands.middle,
                    rsi
                );
                let intent = TradeIntent::close(
                    &self.config.id,
                    &self.config.symbol,
                    Side::Sell,
                    bar.close,
                    bar.timestamp,
                )
                .with_confidence(Decimal::ONE);
                self.pending = Some(intent.id);
                return Some(intent);
            }
            return None;
        }

        if bar.close <= bands.lower && rsi < self.config.rsi_entry {
            let stop = bands.middle - self.config.stop_std * bands.std_dev;
            if bar.close <= stop {
                log::debug!(
                    "[MeanReversion] close {} already through stop {}, skipping",
                    bar.close,
                    stop
                );
                return None;
            }
            log::info!(
                "[MeanReversion] BUY signal: close={}, lower={}, rsi={:.2}, stop={}",
                bar.close,
                bands.lower,
                rsi,
                stop
            );
            let intent = TradeIntent::open(
                &self.config.id,
                &self.config.symbol,
                Side::Buy,
                bar.close,
                bar.timestamp,
            )
            .with_confidence(self.confidence(rsi))
            .with_stop(stop)
            .with_target(bands.middle);
            self.pending = Some(intent.id);
            return Some(intent);
        }

        None
    }

    fn on_cascade_event(&mut self, _event: &CascadeEvent) -> Option<TradeIntent> {
        None
    }

    fn on_execution(&mut self, report: &ExecutionReport) {
        if self.pending != Some(report.intent_id) {
            return;
        }
        self.pending = None;
        if report.is_filled() {
            self.holding = report.action == IntentAction::Open;
        }
        log::debug!(
            "[MeanReversion] {} report {:?}, holding={}",
            self.config.id,
            report.status,
            self.holding
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bastion_core::{ExecutionStatus, ReasonCode};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn ts(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap() + Duration::hours(n)
    }

    fn bar(n: i64, close: Decimal) -> Bar {
        Bar::new("BTC-USD", ts(n), close, close, close, close, dec!(10))
    }

    /// 20 bars of orderly decline, then a flush to 87.5
    fn warm_up_then_flush(strategy: &mut MeanReversionStrategy) -> Option<TradeIntent> {
        for n in 0..20 {
            let bounce = if n % 3 == 0 { dec!(1) } else { dec!(0) };
            let close = dec!(100) + bounce - dec!(0.5) * Decimal::from(n);
            assert!(strategy.on_bar(&bar(n, close)).is_none());
        }
        strategy.on_bar(&bar(20, dec!(87.5)))
    }

    fn report(intent: &TradeIntent, status: ExecutionStatus) -> ExecutionReport {
        ExecutionReport::for_intent(intent, status)
    }

    #[test]
    fn test_config_defaults() {
        let config = MeanReversionConfig::default();
        assert_eq!(config.bb_period, 20);
        assert_eq!(config.rsi_entry, dec!(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_rsi_levels() {
        let config = MeanReversionConfig {
            rsi_entry: dec!(60),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_buy_signal_on_oversold_flush() {
        let _ = env_logger::try_init();
        let mut strategy = MeanReversionStrategy::new(MeanReversionConfig::default());
        let intent = warm_up_then_flush(&mut strategy).expect("entry intent");

        assert_eq!(intent.side, Side::Buy);
        assert_eq!(intent.action, IntentAction::Open);
        assert_eq!(intent.suggested_entry, dec!(87.5));
        let stop = intent.suggested_stop.unwrap();
        let target = intent.suggested_target.unwrap();
        // SMA 94.925, sigma ~3.175
        assert!(stop > dec!(85) && stop < dec!(86));
        assert_eq!(target, dec!(94.925));
        assert!(intent.stop_is_consistent());
        assert!(intent.confidence > dec!(0.5));
    }

    #[test]
    fn test_no_signal_without_full_window() {
        let mut strategy = MeanReversionStrategy::new(MeanReversionConfig::default());
        for n in 0..10 {
            assert!(strategy.on_bar(&bar(n, dec!(100))).is_none());
        }
        assert!(strategy.on_bar(&bar(10, dec!(50))).is_none());
    }

    #[test]
    fn test_rejected_entry_never_exits() {
        let mut strategy = MeanReversionStrategy::new(MeanReversionConfig::default());
        let intent = warm_up_then_flush(&mut strategy).unwrap();
        strategy.on_execution(&report(
            &intent,
            ExecutionStatus::Rejected {
                reason: ReasonCode::ExcessHeat,
            },
        ));
        assert!(!strategy.is_holding());

        // Rally back to the mean: nothing to close
        assert!(strategy.on_bar(&bar(21, dec!(101))).is_none());
    }

    #[test]
    fn test_filled_entry_exits_at_middle_band() {
        let mut strategy = MeanReversionStrategy::new(MeanReversionConfig::default());
        let intent = warm_up_then_flush(&mut strategy).unwrap();

        // Still pending: no new signals
        assert!(strategy.on_bar(&bar(21, dec!(85))).is_none());

        strategy.on_execution(&report(
            &intent,
            ExecutionStatus::Filled {
                quantity: dec!(1),
                price: dec!(87.5),
            },
        ));
        assert!(strategy.is_holding());

        let exit = strategy.on_bar(&bar(22, dec!(105))).expect("exit intent");
        assert_eq!(exit.action, IntentAction::Close);
        assert_eq!(exit.side, Side::Sell);

        strategy.on_execution(&report(
            &exit,
            ExecutionStatus::Filled {
                quantity: dec!(1),
                price: dec!(105),
            },
        ));
        assert!(!strategy.is_holding());
    }

    #[test]
    fn test_no_entry_when_close_is_beyond_stop() {
        let mut strategy = MeanReversionStrategy::new(MeanReversionConfig::default());
        for n in 0..20 {
            let close = if n % 2 == 0 { dec!(100) } else { dec!(101) };
            strategy.on_bar(&bar(n, close));
        }
        // A 4+ sigma crash is not a reversion setup
        assert!(strategy.on_bar(&bar(20, dec!(90))).is_none());
    }

    #[test]
    fn test_ignores_other_symbols() {
        let mut strategy = MeanReversionStrategy::new(MeanReversionConfig::default());
        let other = Bar::new("ETH-USD", ts(0), dec!(1), dec!(1), dec!(1), dec!(1), dec!(1));
        assert!(strategy.on_bar(&other).is_none());
    }
}
