use rust_decimal::Decimal;

/// Average True Range with Wilder smoothing
#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    prev_close: Option<Decimal>,
    value: Decimal,
    sum: Decimal,
    count: usize,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(1),
            prev_close: None,
            value: Decimal::ZERO,
            sum: Decimal::ZERO,
            count: 0,
        }
    }

    pub fn update(&mut self, high: Decimal, low: Decimal, close: Decimal) -> Decimal {
        let tr = match self.prev_close {
            Some(prev) => (high - low)
                .max((high - prev).abs())
                .max((low - prev).abs()),
            None => high - low,
        };
        self.prev_close = Some(close);

        if self.count < self.period {
            self.sum += tr;
            self.count += 1;
            self.value = self.sum / Decimal::from(self.count);
        } else {
            let period = Decimal::from(self.period);
            self.value = (self.value * (period - Decimal::ONE) + tr) / period;
        }
        self.value
    }

    /// Current ATR, None until the first full period
    pub fn value(&self) -> Option<Decimal> {
        (self.count >= self.period).then_some(self.value)
    }
}
