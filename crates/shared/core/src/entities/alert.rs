//! Alerts emitted for risk rejections, breaker changes and execution failures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::values::Symbol;

/// Machine-readable reason code carried by rejections and alerts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    VarFilter,
    ExcessHeat,
    CorrelationLimit,
    DailyLossLimit,
    DrawdownLimit,
    ConsecutiveLosses,
    CircuitBreakerTripped,
    /// Sizing produced a non-positive quantity
    ZeroSize,
    /// Close intent without an open position
    NoOpenPosition,
    InvalidIntent,
    ExecutionFailed,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VarFilter => "VAR_FILTER",
            Self::ExcessHeat => "EXCESS_HEAT",
            Self::CorrelationLimit => "CORRELATION_LIMIT",
            Self::DailyLossLimit => "DAILY_LOSS_LIMIT",
            Self::DrawdownLimit => "DRAWDOWN_LIMIT",
            Self::ConsecutiveLosses => "CONSECUTIVE_LOSSES",
            Self::CircuitBreakerTripped => "CIRCUIT_BREAKER_TRIPPED",
            Self::ZeroSize => "ZERO_SIZE",
            Self::NoOpenPosition => "NO_OPEN_POSITION",
            Self::InvalidIntent => "INVALID_INTENT",
            Self::ExecutionFailed => "EXECUTION_FAILED",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertKind {
    RiskRejected,
    CircuitBreakerTripped,
    CircuitBreakerReset,
    ExecutionFailed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub kind: AlertKind,
    pub reason: ReasonCode,
    pub symbol: Option<Symbol>,
    pub strategy_id: Option<String>,
    pub intent_id: Option<Uuid>,
    pub message: String,
}

impl Alert {
    pub fn new(kind: AlertKind, reason: ReasonCode, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            kind,
            reason,
            symbol: None,
            strategy_id: None,
            intent_id: None,
            message: message.into(),
        }
    }

    /// Builder: Attach the intent this alert is about
    pub fn for_intent(
        mut self,
        intent_id: Uuid,
        symbol: impl Into<Symbol>,
        strategy_id: impl Into<String>,
    ) -> Self {
        self.intent_id = Some(intent_id);
        self.symbol = Some(symbol.into());
        self.strategy_id = Some(strategy_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_code_wire_format() {
        let json = serde_json::to_string(&ReasonCode::CircuitBreakerTripped).unwrap();
        assert_eq!(json, "\"CIRCUIT_BREAKER_TRIPPED\"");
        assert_eq!(ReasonCode::VarFilter.to_string(), "VAR_FILTER");

        let parsed: ReasonCode = serde_json::from_str("\"EXCESS_HEAT\"").unwrap();
        assert_eq!(parsed, ReasonCode::ExcessHeat);
    }
}
