//! Multi-symbol registry of cascade detectors
//!
//! Detectors are created lazily on a symbol's first bar. Each entry is
//! locked independently, so symbols can be fed from separate tasks.

use bastion_core::{Bar, CascadeEvent, CascadePhase, LiquidationEvent};
use dashmap::DashMap;

use crate::config::DetectorConfig;
use crate::detector::{CascadeDetector, CascadeState};

pub struct CascadeMonitor {
    config: DetectorConfig,
    detectors: DashMap<String, CascadeDetector>,
}

impl CascadeMonitor {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            detectors: DashMap::new(),
        }
    }

    pub fn on_bar(&self, bar: &Bar) -> Option<CascadeEvent> {
        self.detectors
            .entry(bar.symbol.clone())
            .or_insert_with(|| CascadeDetector::new(bar.symbol.clone(), self.config.clone()))
            .on_bar(bar)
    }

    pub fn on_liquidation(&self, event: &LiquidationEvent) {
        self.detectors
            .entry(event.symbol.clone())
            .or_insert_with(|| CascadeDetector::new(event.symbol.clone(), self.config.clone()))
            .on_liquidation(event);
    }

    /// Snapshot of a symbol's state
    pub fn state(&self, symbol: &str) -> Option<CascadeState> {
        self.detectors.get(symbol).map(|d| d.state().clone())
    }

    pub fn phase(&self, symbol: &str) -> CascadePhase {
        self.detectors
            .get(symbol)
            .map(|d| d.phase())
            .unwrap_or_default()
    }

    /// Symbols currently in an Active or Exhausting phase
    pub fn active_symbols(&self) -> Vec<String> {
        self.detectors
            .iter()
            .filter(|entry| entry.phase() != CascadePhase::Idle)
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub fn symbol_count(&self) -> usize {
        self.detectors.len()
    }
}
