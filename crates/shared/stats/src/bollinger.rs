use crate::rolling::RollingWindow;
use rust_decimal::Decimal;

/// Bollinger Bands: rolling SMA +/- k population std devs
#[derive(Debug, Clone)]
pub struct BollingerBands {
    window: RollingWindow,
    num_std: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bands {
    pub upper: Decimal,
    pub middle: Decimal,
    pub lower: Decimal,
    pub std_dev: Decimal,
}

impl BollingerBands {
    pub fn new(period: usize, num_std: Decimal) -> Self {
        Self {
            window: RollingWindow::new(period),
            num_std,
        }
    }

    /// Feed a close; returns bands once the window is full
    pub fn update(&mut self, close: Decimal) -> Option<Bands> {
        self.window.push(close);
        self.bands()
    }

    pub fn bands(&self) -> Option<Bands> {
        if !self.window.is_full() {
            return None;
        }
        let middle = self.window.mean()?;
        let std_dev = self.window.std_pop()?;
        Some(Bands {
            upper: middle + self.num_std * std_dev,
            middle,
            lower: middle - self.num_std * std_dev,
            std_dev,
        })
    }
}
