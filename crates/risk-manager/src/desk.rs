//! Risk Desk
//!
//! The one place account state changes. Evaluation, reservation, fills,
//! marks, releases and resets all go through a single async mutex, so an
//! approval and its pending-notional reservation are atomic and a trip is
//! visible to every later evaluation.

use bastion_core::{
    AccountState, Alert, AlertKind, Bar, Fill, Position, ReasonCode, TradeIntent,
};
use bastion_portfolio::{FillOutcome, PositionTracker, Reservation, StrategyStats};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, broadcast};
use uuid::Uuid;

use crate::circuit_breaker::{CircuitBreakerHandle, TripRecord};
use crate::manager::{RiskDecision, RiskManager};

struct DeskState {
    manager: RiskManager,
    tracker: PositionTracker,
}

pub struct RiskDesk {
    state: Mutex<DeskState>,
    breaker: CircuitBreakerHandle,
    alerts: Option<broadcast::Sender<Alert>>,
}

impl RiskDesk {
    pub fn new(manager: RiskManager, tracker: PositionTracker) -> Self {
        let breaker = manager.breaker_handle();
        Self {
            state: Mutex::new(DeskState { manager, tracker }),
            breaker,
            alerts: None,
        }
    }

    /// Builder: Publish rejections and breaker changes on `alerts`
    pub fn with_alerts(mut self, alerts: broadcast::Sender<Alert>) -> Self {
        self.alerts = Some(alerts);
        self
    }

    /// Lock-free breaker flag for monitors
    pub fn breaker(&self) -> CircuitBreakerHandle {
        self.breaker.clone()
    }

    /// Evaluate an intent and reserve the approved notional in one step
    pub async fn evaluate(&self, intent: &TradeIntent) -> RiskDecision {
        let mut state = self.state.lock().await;
        let DeskState { manager, tracker } = &mut *state;

        let was_tripped = manager.is_tripped();
        let decision = manager.evaluate(intent, tracker);
        if !was_tripped && let Some(record) = manager.active_trip() {
            self.publish_trip(record);
        }

        match &decision {
            RiskDecision::Approved(order) => tracker.reserve(order),
            RiskDecision::Rejected(rejection) => self.publish(
                Alert::new(AlertKind::RiskRejected, rejection.reason, &rejection.message)
                    .for_intent(intent.id, &intent.symbol, &intent.strategy_id),
            ),
        }
        decision
    }

    /// Apply a fill, then re-check the breaker
    pub async fn apply_fill(&self, fill: &Fill) -> FillOutcome {
        let mut state = self.state.lock().await;
        let outcome = state.tracker.apply_fill(fill);
        self.check_circuit(&mut state, fill.timestamp);
        outcome
    }

    /// Drop the reservation of an order that will never fill
    pub async fn release(&self, order_id: &Uuid, at: DateTime<Utc>) -> Option<Reservation> {
        let mut state = self.state.lock().await;
        let released = state.tracker.release(order_id, at);
        if let Some(reservation) = &released {
            log::info!(
                "[RISK] Released {} notional for order {} ({})",
                reservation.notional,
                order_id,
                reservation.strategy_id
            );
        }
        released
    }

    /// Feed market statistics and mark open positions to the close
    pub async fn on_bar(&self, bar: &Bar) {
        let mut state = self.state.lock().await;
        state.manager.on_bar(bar);
        state.tracker.mark(&bar.symbol, bar.close, bar.timestamp);
        self.check_circuit(&mut state, bar.timestamp);
    }

    pub async fn mark(&self, symbol: &str, price: Decimal, at: DateTime<Utc>) {
        let mut state = self.state.lock().await;
        state.tracker.mark(symbol, price, at);
        self.check_circuit(&mut state, at);
    }

    pub async fn roll_day(&self, next_day: NaiveDate, at: DateTime<Utc>) {
        let mut state = self.state.lock().await;
        state.tracker.roll_day(next_day, at);
        self.check_circuit(&mut state, at);
    }

    /// Halt trading by hand
    pub async fn trip_circuit_breaker(&self, message: &str) -> Option<TripRecord> {
        let mut state = self.state.lock().await;
        let record = state
            .manager
            .trip_circuit_breaker(ReasonCode::CircuitBreakerTripped, message, Utc::now())?;
        self.publish_trip(&record);
        Some(record)
    }

    /// The only way to resume trading after a trip
    pub async fn reset_circuit_breaker(&self, operator: &str) -> Option<TripRecord> {
        let mut state = self.state.lock().await;
        let record = state.manager.reset_circuit_breaker(operator, Utc::now())?;
        self.publish(Alert::new(
            AlertKind::CircuitBreakerReset,
            record.reason,
            format!("reset by {} after: {}", operator, record.message),
        ));
        Some(record)
    }

    pub async fn active_trip(&self) -> Option<TripRecord> {
        self.state.lock().await.manager.active_trip().cloned()
    }

    pub async fn snapshot(&self) -> AccountState {
        self.state.lock().await.tracker.snapshot()
    }

    pub async fn position(&self, strategy_id: &str, symbol: &str) -> Option<Position> {
        self.state
            .lock()
            .await
            .tracker
            .position(strategy_id, symbol)
            .cloned()
    }

    pub async fn strategy_stats(&self, strategy_id: &str) -> StrategyStats {
        self.state.lock().await.tracker.strategy_stats(strategy_id)
    }

    fn check_circuit(&self, state: &mut DeskState, at: DateTime<Utc>) {
        let DeskState { manager, tracker } = state;
        if let Some(record) = manager.check_circuit(tracker.account(), at) {
            self.publish_trip(&record);
        }
    }

    fn publish_trip(&self, record: &TripRecord) {
        self.publish(Alert::new(
            AlertKind::CircuitBreakerTripped,
            record.reason,
            record.message.clone(),
        ));
    }

    fn publish(&self, alert: Alert) {
        if let Some(alerts) = &self.alerts {
            // No subscribers is fine
            let _ = alerts.send(alert);
        }
    }
}
