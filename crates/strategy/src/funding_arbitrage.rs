//! Funding Arbitrage Strategy
//!
//! Market-neutral carry trade across two perpetual venues. When one venue
//! pays persistently more funding than the other, short the expensive venue
//! and hedge long on the cheap one. The position is closed the moment the
//! spread flips against the opened orientation.

use bastion_core::{
    Bar, CascadeEvent, ConfigError, ExecutionReport, FundingRate, HedgeLeg, IntentAction, Side,
    TradeIntent,
};
use bastion_core::error::checks;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::strategy::{Strategy, validate_identity};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FundingArbitrageConfig {
    pub id: String,
    pub symbol: String,
    pub venue_a: String,
    pub venue_b: String,
    /// |rate_a - rate_b| must exceed this per funding interval
    pub spread_threshold: Decimal,
    /// How long the spread must persist before entering
    pub min_duration_secs: i64,
}

impl Default for FundingArbitrageConfig {
    fn default() -> Self {
        Self {
            id: "funding-arb".to_string(),
            symbol: "BTC-USD".to_string(),
            venue_a: "binance".to_string(),
            venue_b: "bybit".to_string(),
            spread_threshold: dec!(0.0003),
            min_duration_secs: 3 * 24 * 60 * 60,
        }
    }
}

impl FundingArbitrageConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_identity(&self.id, &self.symbol)?;
        if self.venue_a.is_empty() || self.venue_b.is_empty() || self.venue_a == self.venue_b {
            return Err(ConfigError::invalid(
                format!("funding_arbitrage.{}.venues", self.id),
                "two distinct venues are required",
            ));
        }
        checks::positive("funding_arbitrage.spread_threshold", self.spread_threshold)?;
        if self.min_duration_secs < 0 {
            return Err(ConfigError::invalid(
                "funding_arbitrage.min_duration_secs",
                "must be >= 0",
            ));
        }
        Ok(())
    }
}

/// Which venue carries the short leg
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Orientation {
    ShortA,
    ShortB,
}

impl Orientation {
    fn from_spread(spread: Decimal) -> Self {
        if spread > Decimal::ZERO {
            Orientation::ShortA
        } else {
            Orientation::ShortB
        }
    }

    /// Spread measured so that positive means the trade still earns carry
    fn oriented(&self, spread: Decimal) -> Decimal {
        match self {
            Orientation::ShortA => spread,
            Orientation::ShortB => -spread,
        }
    }
}

pub struct FundingArbitrageStrategy {
    config: FundingArbitrageConfig,
    rate_a: Option<Decimal>,
    rate_b: Option<Decimal>,
    last_price: Option<Decimal>,
    /// Start and orientation of the current threshold breach
    breach: Option<(DateTime<Utc>, Orientation)>,
    open: Option<Orientation>,
    pending: Option<(Uuid, Orientation)>,
}

impl FundingArbitrageStrategy {
    pub fn new(config: FundingArbitrageConfig) -> Self {
        Self {
            config,
            rate_a: None,
            rate_b: None,
            last_price: None,
            breach: None,
            open: None,
            pending: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// rate_a - rate_b once both venues have reported
    pub fn spread(&self) -> Option<Decimal> {
        Some(self.rate_a? - self.rate_b?)
    }

    fn venues(&self, orientation: Orientation) -> (&str, &str) {
        match orientation {
            Orientation::ShortA => (&self.config.venue_a, &self.config.venue_b),
            Orientation::ShortB => (&self.config.venue_b, &self.config.venue_a),
        }
    }

    fn close_intent(
        &mut self,
        orientation: Orientation,
        spread: Decimal,
        at: DateTime<Utc>,
    ) -> Option<TradeIntent> {
        let price = self.last_price?;
        let (short_venue, long_venue) = self.venues(orientation);
        log::info!(
            "[FundingArb] CLOSE: spread {} flipped against short on {}",
            spread,
            short_venue
        );
        let intent = TradeIntent::close(&self.config.id, &self.config.symbol, Side::Buy, price, at)
            .with_confidence(Decimal::ONE)
            .on_venue(short_venue)
            .with_hedge(HedgeLeg {
                venue: long_venue.to_string(),
                symbol: self.config.symbol.clone(),
                side: Side::Sell,
            });
        self.pending = Some((intent.id, orientation));
        Some(intent)
    }

    fn open_intent(
        &mut self,
        orientation: Orientation,
        spread: Decimal,
        at: DateTime<Utc>,
    ) -> Option<TradeIntent> {
        let Some(price) = self.last_price else {
            log::debug!("[FundingArb] spread sustained but no price yet for {}", self.config.symbol);
            return None;
        };
        let (short_venue, long_venue) = self.venues(orientation);
        // 0.5 at the threshold, 1.0 at twice the threshold
        let excess = spread.abs() / self.config.spread_threshold - Decimal::ONE;
        let confidence = dec!(0.5) + excess.clamp(Decimal::ZERO, Decimal::ONE) / dec!(2);
        log::info!(
            "[FundingArb] OPEN: spread {} sustained, short {} / long {} @ {}",
            spread,
            short_venue,
            long_venue,
            price
        );
        let intent = TradeIntent::open(&self.config.id, &self.config.symbol, Side::Sell, price, at)
            .with_confidence(confidence)
            .on_venue(short_venue)
            .with_hedge(HedgeLeg {
                venue: long_venue.to_string(),
                symbol: self.config.symbol.clone(),
                side: Side::Buy,
            });
        self.pending = Some((intent.id, orientation));
        Some(intent)
    }
}

impl Strategy for FundingArbitrageStrategy {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn symbol(&self) -> &str {
        &self.config.symbol
    }

    fn on_bar(&mut self, bar: &Bar) -> Option<TradeIntent> {
        if bar.symbol == self.config.symbol {
            self.last_price = Some(bar.close);
        }
        None
    }

    fn on_cascade_event(&mut self, _event: &CascadeEvent) -> Option<TradeIntent> {
        None
    }

    fn on_funding(&mut self, rate: &FundingRate) -> Option<TradeIntent> {
        if rate.symbol != self.config.symbol {
            return None;
        }
        if rate.venue == self.config.venue_a {
            self.rate_a = Some(rate.rate);
        } else if rate.venue == self.config.venue_b {
            self.rate_b = Some(rate.rate);
        } else {
            return None;
        }

        let spread = self.spread()?;
        let now = rate.timestamp;

        if let Some(orientation) = self.open {
            if self.pending.is_none() && orientation.oriented(spread) < Decimal::ZERO {
                return self.close_intent(orientation, spread, now);
            }
            return None;
        }

        if spread.abs() <= self.config.spread_threshold {
            if self.breach.take().is_some() {
                log::debug!("[FundingArb] spread {} back under threshold", spread);
            }
            return None;
        }

        let orientation = Orientation::from_spread(spread);
        let since = match self.breach {
            Some((since, current)) if current == orientation => since,
            _ => {
                self.breach = Some((now, orientation));
                now
            }
        };

        let sustained = now - since >= Duration::seconds(self.config.min_duration_secs);
        if sustained && self.pending.is_none() {
            return self.open_intent(orientation, spread, now);
        }
        None
    }

    fn on_execution(&mut self, report: &ExecutionReport) {
        let Some((intent_id, orientation)) = self.pending else {
            return;
        };
        if intent_id != report.intent_id {
            return;
        }
        self.pending = None;
        if report.is_filled() {
            match report.action {
                IntentAction::Open => self.open = Some(orientation),
                IntentAction::Close => {
                    self.open = None;
                    self.breach = None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bastion_core::ExecutionStatus;
    use chrono::TimeZone;

    fn t(hours: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap() + Duration::hours(hours)
    }

    fn funding(venue: &str, rate: Decimal, hours: i64) -> FundingRate {
        FundingRate::new("BTC-USD", venue, rate, t(hours))
    }

    fn price_bar() -> Bar {
        Bar::new("BTC-USD", t(0), dec!(60000), dec!(60100), dec!(59900), dec!(60050), dec!(5))
    }

    fn filled(intent: &TradeIntent) -> ExecutionReport {
        ExecutionReport::for_intent(
            intent,
            ExecutionStatus::Filled {
                quantity: dec!(1),
                price: intent.suggested_entry,
            },
        )
    }

    /// Feeds both venues every 8 hours from `from` to `to`, returning the first intent
    fn feed(
        strategy: &mut FundingArbitrageStrategy,
        rate_a: Decimal,
        rate_b: Decimal,
        from: i64,
        to: i64,
    ) -> Option<TradeIntent> {
        let mut h = from;
        while h <= to {
            let intent = strategy
                .on_funding(&funding("bybit", rate_b, h))
                .or_else(|| strategy.on_funding(&funding("binance", rate_a, h)));
            if intent.is_some() {
                return intent;
            }
            h += 8;
        }
        None
    }

    #[test]
    fn test_opens_only_after_sustained_spread() {
        let _ = env_logger::try_init();
        let mut strategy = FundingArbitrageStrategy::new(FundingArbitrageConfig::default());
        strategy.on_bar(&price_bar());

        // 2 days 16h of a wide spread: not yet
        assert!(feed(&mut strategy, dec!(0.0010), dec!(0.0001), 0, 64).is_none());

        let intent = feed(&mut strategy, dec!(0.0010), dec!(0.0001), 72, 72).expect("open intent");
        assert_eq!(intent.action, IntentAction::Open);
        assert_eq!(intent.side, Side::Sell);
        assert_eq!(intent.venue.as_deref(), Some("binance"));
        let hedge = intent.hedge.as_ref().unwrap();
        assert_eq!(hedge.venue, "bybit");
        assert_eq!(hedge.side, Side::Buy);
        assert_eq!(intent.suggested_entry, dec!(60050));
        assert_eq!(intent.confidence, Decimal::ONE);
    }

    #[test]
    fn test_breach_interrupted_restarts_clock() {
        let mut strategy = FundingArbitrageStrategy::new(FundingArbitrageConfig::default());
        strategy.on_bar(&price_bar());

        assert!(feed(&mut strategy, dec!(0.0010), dec!(0.0001), 0, 48).is_none());
        // Spread collapses for one interval
        assert!(feed(&mut strategy, dec!(0.0002), dec!(0.0001), 56, 56).is_none());
        // Would have been 3 days since t0, but only 2 days since the restart
        assert!(feed(&mut strategy, dec!(0.0010), dec!(0.0001), 64, 112).is_none());
        assert!(feed(&mut strategy, dec!(0.0010), dec!(0.0001), 120, 136).is_some());
    }

    #[test]
    fn test_shorts_venue_b_when_it_pays_more() {
        let mut strategy = FundingArbitrageStrategy::new(FundingArbitrageConfig {
            min_duration_secs: 0,
            ..Default::default()
        });
        strategy.on_bar(&price_bar());
        let intent = feed(&mut strategy, dec!(-0.0002), dec!(0.0004), 0, 0).unwrap();
        assert_eq!(intent.venue.as_deref(), Some("bybit"));
        assert_eq!(intent.hedge.unwrap().venue, "binance");
        // Spread 0.0006 is exactly twice the threshold
        assert_eq!(intent.confidence, Decimal::ONE);
    }

    #[test]
    fn test_closes_the_instant_spread_turns_negative() {
        let mut strategy = FundingArbitrageStrategy::new(FundingArbitrageConfig {
            min_duration_secs: 0,
            ..Default::default()
        });
        strategy.on_bar(&price_bar());
        let open = feed(&mut strategy, dec!(0.0010), dec!(0.0001), 0, 0).unwrap();
        strategy.on_execution(&filled(&open));
        assert!(strategy.is_open());

        // Narrow but still positive: hold
        assert!(feed(&mut strategy, dec!(0.0002), dec!(0.0001), 8, 8).is_none());

        let close = feed(&mut strategy, dec!(0.0001), dec!(0.00015), 16, 16).expect("close intent");
        assert_eq!(close.action, IntentAction::Close);
        assert_eq!(close.side, Side::Buy);
        assert_eq!(close.venue.as_deref(), Some("binance"));

        strategy.on_execution(&filled(&close));
        assert!(!strategy.is_open());
    }

    #[test]
    fn test_no_intent_without_price() {
        let mut strategy = FundingArbitrageStrategy::new(FundingArbitrageConfig {
            min_duration_secs: 0,
            ..Default::default()
        });
        assert!(feed(&mut strategy, dec!(0.0010), dec!(0.0001), 0, 0).is_none());
    }

    #[test]
    fn test_unknown_venue_ignored() {
        let mut strategy = FundingArbitrageStrategy::new(FundingArbitrageConfig::default());
        assert!(strategy.on_funding(&funding("okx", dec!(0.01), 0)).is_none());
        assert!(strategy.spread().is_none());
    }

    #[test]
    fn test_same_venue_twice_is_invalid() {
        let config = FundingArbitrageConfig {
            venue_b: "binance".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
