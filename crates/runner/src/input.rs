//! Market inputs consumed by the engine

use bastion_core::{Bar, FundingRate, LiquidationEvent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// One message on the engine's input stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarketInput {
    Bar(Bar),
    Liquidation(LiquidationEvent),
    Funding(FundingRate),
}

impl MarketInput {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            MarketInput::Bar(bar) => bar.timestamp,
            MarketInput::Liquidation(event) => event.timestamp,
            MarketInput::Funding(rate) => rate.timestamp,
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            MarketInput::Bar(bar) => &bar.symbol,
            MarketInput::Liquidation(event) => &event.symbol,
            MarketInput::Funding(rate) => &rate.symbol,
        }
    }

    /// Parse one line of a JSON-lines feed
    pub fn from_json_line(line: &str) -> Result<Self> {
        serde_json::from_str(line.trim()).map_err(|e| EngineError::Input(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_bar_line() {
        let line = r#"{"kind":"bar","symbol":"BTC-USD","timestamp":"2024-08-05T03:00:00Z","open":"50000","high":"50100","low":"49900","close":"50050","volume":"12.5"}"#;
        let input = MarketInput::from_json_line(line).unwrap();
        assert_eq!(input.symbol(), "BTC-USD");
        match input {
            MarketInput::Bar(bar) => assert_eq!(bar.close, dec!(50050)),
            other => panic!("unexpected input {:?}", other),
        }
    }

    #[test]
    fn test_malformed_line() {
        assert!(matches!(
            MarketInput::from_json_line(r#"{"kind":"trade"}"#),
            Err(EngineError::Input(_))
        ));
    }
}
