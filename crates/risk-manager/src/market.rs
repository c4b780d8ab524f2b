//! Per-symbol market statistics used by the risk layers

use bastion_core::Bar;
use bastion_stats::{Atr, ReturnSeries, RollingWindow, aligned_correlation};
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::parameters::RiskLimits;

#[derive(Debug, Clone)]
struct SymbolStats {
    returns: ReturnSeries,
    atr: Atr,
    /// Recent volatility readings, averaged for vol-adjusted sizing
    volatility: RollingWindow,
}

/// Return series, ATR and volatility history per symbol
#[derive(Debug, Clone)]
pub struct MarketState {
    returns_window: usize,
    atr_period: usize,
    volatility_window: usize,
    symbols: HashMap<String, SymbolStats>,
}

impl MarketState {
    pub fn new(limits: &RiskLimits) -> Self {
        Self {
            returns_window: limits.returns_window,
            atr_period: limits.atr_period,
            volatility_window: limits.volatility_window,
            symbols: HashMap::new(),
        }
    }

    pub fn on_bar(&mut self, bar: &Bar) {
        if !bar.is_well_formed() {
            return;
        }
        let (returns_window, atr_period, volatility_window) =
            (self.returns_window, self.atr_period, self.volatility_window);
        let stats = self
            .symbols
            .entry(bar.symbol.clone())
            .or_insert_with(|| SymbolStats {
                returns: ReturnSeries::new(returns_window),
                atr: Atr::new(atr_period),
                volatility: RollingWindow::new(volatility_window),
            });

        stats.atr.update(bar.high, bar.low, bar.close);
        if stats.returns.update(bar.close, bar.timestamp).is_some()
            && stats.returns.len() >= 2
            && let Some(vol) = stats.returns.volatility()
        {
            stats.volatility.push(vol);
        }
    }

    pub fn return_count(&self, symbol: &str) -> usize {
        self.symbols.get(symbol).map(|s| s.returns.len()).unwrap_or(0)
    }

    pub fn returns(&self, symbol: &str) -> Vec<Decimal> {
        self.symbols
            .get(symbol)
            .map(|s| s.returns.values())
            .unwrap_or_default()
    }

    /// Historical VaR, `None` until `min_samples` returns exist
    pub fn var(&self, symbol: &str, confidence: Decimal, min_samples: usize) -> Option<Decimal> {
        let stats = self.symbols.get(symbol)?;
        if stats.returns.len() < min_samples {
            return None;
        }
        stats.returns.var(confidence)
    }

    pub fn atr(&self, symbol: &str) -> Option<Decimal> {
        self.symbols.get(symbol)?.atr.value()
    }

    /// Latest volatility reading
    pub fn volatility(&self, symbol: &str) -> Option<Decimal> {
        self.symbols.get(symbol)?.volatility.last()
    }

    pub fn average_volatility(&self, symbol: &str) -> Option<Decimal> {
        self.symbols.get(symbol)?.volatility.mean()
    }

    /// Correlation of the two symbols' returns on bars both have seen,
    /// `None` with fewer than `min_samples` shared bars
    pub fn correlation(&self, a: &str, b: &str, min_samples: usize) -> Option<Decimal> {
        let returns_a = self.symbols.get(a)?.returns.stamped();
        let returns_b = self.symbols.get(b)?.returns.stamped();
        aligned_correlation(&returns_a, &returns_b, min_samples)
    }
}
