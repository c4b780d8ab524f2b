use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

/// Cumulative volume-weighted average price, reset at each UTC day
#[derive(Debug, Clone, Default)]
pub struct Vwap {
    price_volume: Decimal,
    volume: Decimal,
    session: Option<NaiveDate>,
}

impl Vwap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a trade/bar at `price` with `volume`; returns the updated VWAP
    pub fn update(&mut self, price: Decimal, volume: Decimal, at: DateTime<Utc>) -> Option<Decimal> {
        let day = at.date_naive();
        if self.session != Some(day) {
            self.reset();
            self.session = Some(day);
        }
        if volume > Decimal::ZERO {
            self.price_volume += price * volume;
            self.volume += volume;
        }
        self.value()
    }

    pub fn value(&self) -> Option<Decimal> {
        if self.volume.is_zero() {
            return None;
        }
        Some(self.price_volume / self.volume)
    }

    pub fn reset(&mut self) {
        self.price_volume = Decimal::ZERO;
        self.volume = Decimal::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_cumulative_vwap() {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let mut vwap = Vwap::new();
        assert_eq!(vwap.update(dec!(50000), dec!(100), t0), Some(dec!(50000)));
        vwap.update(dec!(51000), dec!(10), t0 + chrono::Duration::minutes(1));
        let value = vwap.update(dec!(49000), dec!(50), t0 + chrono::Duration::minutes(2));
        assert_eq!(value, Some(dec!(49750)));
    }

    #[test]
    fn test_resets_on_new_day() {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 23, 59, 0).unwrap();
        let mut vwap = Vwap::new();
        vwap.update(dec!(100), dec!(10), t0);
        let next_day = vwap.update(dec!(200), dec!(1), t0 + chrono::Duration::minutes(2));
        assert_eq!(next_day, Some(dec!(200)));
    }

    #[test]
    fn test_zero_volume() {
        let mut vwap = Vwap::new();
        assert!(vwap.update(dec!(100), Decimal::ZERO, Utc::now()).is_none());
    }
}
