use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// RSI with Wilder smoothing of average gain/loss
#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    prev_close: Option<Decimal>,
    avg_gain: Decimal,
    avg_loss: Decimal,
    gain_sum: Decimal,
    loss_sum: Decimal,
    count: usize,
    warm: bool,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(1),
            prev_close: None,
            avg_gain: Decimal::ZERO,
            avg_loss: Decimal::ZERO,
            gain_sum: Decimal::ZERO,
            loss_sum: Decimal::ZERO,
            count: 0,
            warm: false,
        }
    }

    /// Feed a close; returns RSI (0-100) once `period` changes were seen
    pub fn update(&mut self, close: Decimal) -> Option<Decimal> {
        let prev = self.prev_close.replace(close)?;

        let change = close - prev;
        let gain = change.max(Decimal::ZERO);
        let loss = (-change).max(Decimal::ZERO);
        let period = Decimal::from(self.period);

        if !self.warm {
            self.gain_sum += gain;
            self.loss_sum += loss;
            self.count += 1;
            if self.count < self.period {
                return None;
            }
            self.avg_gain = self.gain_sum / period;
            self.avg_loss = self.loss_sum / period;
            self.warm = true;
        } else {
            self.avg_gain = (self.avg_gain * (period - Decimal::ONE) + gain) / period;
            self.avg_loss = (self.avg_loss * (period - Decimal::ONE) + loss) / period;
        }

        self.value()
    }

    pub fn value(&self) -> Option<Decimal> {
        if !self.warm {
            return None;
        }
        if self.avg_loss.is_zero() {
            return Some(dec!(100));
        }
        let rs = self.avg_gain / self.avg_loss;
        Some(dec!(100) - dec!(100) / (Decimal::ONE + rs))
    }
}
