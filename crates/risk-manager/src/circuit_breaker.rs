//! Global circuit breaker
//!
//! Once tripped it stays tripped until an operator resets it. The flag is an
//! atomic so monitors can read it without taking the desk lock.

use bastion_core::ReasonCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// One trip, from trigger to reset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRecord {
    /// Condition that tripped the breaker
    pub reason: ReasonCode,
    pub message: String,
    pub tripped_at: DateTime<Utc>,
    pub reset_by: Option<String>,
    pub reset_at: Option<DateTime<Utc>>,
}

/// Lock-free, read-only view of the breaker flag
#[derive(Debug, Clone, Default)]
pub struct CircuitBreakerHandle {
    tripped: Arc<AtomicBool>,
}

impl CircuitBreakerHandle {
    pub fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
pub struct CircuitBreaker {
    handle: CircuitBreakerHandle,
    active: Option<TripRecord>,
    history: Vec<TripRecord>,
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> CircuitBreakerHandle {
        self.handle.clone()
    }

    pub fn is_tripped(&self) -> bool {
        self.handle.is_tripped()
    }

    pub fn active_trip(&self) -> Option<&TripRecord> {
        self.active.as_ref()
    }

    /// Completed trips, oldest first
    pub fn history(&self) -> &[TripRecord] {
        &self.history
    }

    /// Trip the breaker. Returns the record only when this call tripped it.
    pub fn trip(
        &mut self,
        reason: ReasonCode,
        message: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Option<TripRecord> {
        if self.is_tripped() {
            return None;
        }
        let record = TripRecord {
            reason,
            message: message.into(),
            tripped_at: at,
            reset_by: None,
            reset_at: None,
        };
        log::error!("[CIRCUIT] Trading halted ({}): {}", reason, record.message);
        self.handle.tripped.store(true, Ordering::SeqCst);
        self.active = Some(record.clone());
        Some(record)
    }

    /// Clear a trip on operator request. `None` if the breaker was not tripped.
    pub fn reset(&mut self, operator: &str, at: DateTime<Utc>) -> Option<TripRecord> {
        let mut record = self.active.take()?;
        record.reset_by = Some(operator.to_string());
        record.reset_at = Some(at);
        self.handle.tripped.store(false, Ordering::SeqCst);
        log::info!(
            "[CIRCUIT] Trading resumed by {} (was {}: {})",
            operator,
            record.reason,
            record.message
        );
        self.history.push(record.clone());
        Some(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trip_is_sticky_until_reset() {
        let mut breaker = CircuitBreaker::new();
        let handle = breaker.handle();
        let now = Utc::now();

        assert!(breaker.trip(ReasonCode::DrawdownLimit, "dd 21%", now).is_some());
        assert!(handle.is_tripped());
        // Second trip is a no-op and keeps the original reason
        assert!(breaker.trip(ReasonCode::DailyLossLimit, "daily", now).is_none());
        assert_eq!(breaker.active_trip().unwrap().reason, ReasonCode::DrawdownLimit);

        let record = breaker.reset("ops", now).unwrap();
        assert_eq!(record.reset_by.as_deref(), Some("ops"));
        assert!(!handle.is_tripped());
        assert_eq!(breaker.history().len(), 1);
    }

    #[test]
    fn test_reset_when_not_tripped() {
        let mut breaker = CircuitBreaker::new();
        assert!(breaker.reset("ops", Utc::now()).is_none());
        assert!(breaker.history().is_empty());
    }
}
