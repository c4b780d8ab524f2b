//! Trading Engine
//!
//! Drives one input at a time through detector, strategies and the risk
//! desk. Approved orders are submitted on their own tasks so a slow venue
//! never holds up the next bar; their outcomes are handed back to the
//! originating strategy as soon as the engine sees them complete.
//!
//! A submission task that dies (panic, abort) is settled like a gateway
//! failure: its reservation is released and the strategy gets a Failed report.

use bastion_core::{
    Alert, AlertKind, Bar, CascadeEvent, ExecutionReport, ExecutionStatus, FundingRate,
    LiquidationEvent, OrderRequest, ReasonCode, TradeIntent,
};
use bastion_detector::CascadeMonitor;
use bastion_gateway::{ExecutionGateway, OrderSubmitter};
use bastion_portfolio::PositionTracker;
use bastion_risk_manager::{RiskDecision, RiskDesk, RiskManager, TripRecord};
use bastion_strategy::{Strategy, StrategyKind};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::{self, JoinError, JoinSet};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::input::MarketInput;

/// Counters for one engine run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub bars: u64,
    pub cascade_events: u64,
    pub intents: u64,
    pub approved: u64,
    pub rejected: u64,
    pub filled: u64,
    pub failed: u64,
}

pub struct TradingEngine {
    monitor: CascadeMonitor,
    strategies: Vec<StrategyKind>,
    desk: Arc<RiskDesk>,
    submitter: OrderSubmitter,
    cascade_tx: broadcast::Sender<CascadeEvent>,
    alert_tx: broadcast::Sender<Alert>,
    in_flight: JoinSet<ExecutionReport>,
    /// What each submission task carries, to settle it if the task dies
    pending: HashMap<task::Id, (TradeIntent, OrderRequest)>,
    stats: EngineStats,
}

impl TradingEngine {
    /// Validate the config and wire every component.
    ///
    /// `start` opens the first trading day of the position tracker.
    pub fn new(
        config: EngineConfig,
        gateway: Arc<dyn ExecutionGateway>,
        start: DateTime<Utc>,
    ) -> Result<Self> {
        config.validate()?;

        let mut manager = RiskManager::new(config.risk.clone());
        let mut strategies = Vec::with_capacity(config.strategies.len());
        for entry in &config.strategies {
            manager.register_strategy(entry.strategy.id(), entry.risk());
            let strategy = entry.strategy.build();
            log::info!(
                "[ENGINE] Loaded {} '{}' on {} (sizing: {})",
                strategy.kind_name(),
                strategy.id(),
                strategy.symbol(),
                entry.sizing.name()
            );
            strategies.push(strategy);
        }

        let (cascade_tx, _) = broadcast::channel(config.channel_capacity);
        let (alert_tx, _) = broadcast::channel(config.channel_capacity);
        let tracker = PositionTracker::new(config.initial_balance, start);
        let desk = RiskDesk::new(manager, tracker).with_alerts(alert_tx.clone());

        log::info!(
            "[ENGINE] Ready: {} strategies, balance {}, gateway '{}'",
            strategies.len(),
            config.initial_balance,
            gateway.name()
        );

        Ok(Self {
            monitor: CascadeMonitor::new(config.detector.clone()),
            strategies,
            desk: Arc::new(desk),
            submitter: OrderSubmitter::new(gateway, config.execution.clone()),
            cascade_tx,
            alert_tx,
            in_flight: JoinSet::new(),
            pending: HashMap::new(),
            stats: EngineStats::default(),
        })
    }

    /// Subscribe to cascade phase transitions
    pub fn subscribe_cascades(&self) -> broadcast::Receiver<CascadeEvent> {
        self.cascade_tx.subscribe()
    }

    /// Subscribe to risk, breaker and execution alerts
    pub fn subscribe_alerts(&self) -> broadcast::Receiver<Alert> {
        self.alert_tx.subscribe()
    }

    pub fn desk(&self) -> Arc<RiskDesk> {
        self.desk.clone()
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    /// Orders submitted but not yet reported
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub async fn reset_circuit_breaker(&self, operator: &str) -> Option<TripRecord> {
        self.desk.reset_circuit_breaker(operator).await
    }

    pub async fn handle(&mut self, input: MarketInput) {
        match input {
            MarketInput::Bar(bar) => self.on_bar(&bar).await,
            MarketInput::Liquidation(event) => self.on_liquidation(&event),
            MarketInput::Funding(rate) => self.on_funding(&rate).await,
        }
    }

    pub async fn on_bar(&mut self, bar: &Bar) {
        if !bar.is_well_formed() {
            log::warn!(
                "[ENGINE] Dropping malformed bar {} @ {}",
                bar.symbol,
                bar.timestamp
            );
            return;
        }
        self.collect_finished().await;
        self.stats.bars += 1;

        // Marks first, so every gate below sees this bar's equity
        self.desk.on_bar(bar).await;

        if let Some(event) = self.monitor.on_bar(bar) {
            self.stats.cascade_events += 1;
            // No subscribers is fine
            let _ = self.cascade_tx.send(event.clone());
            let intents: Vec<TradeIntent> = self
                .strategies
                .iter_mut()
                .filter_map(|s| s.on_cascade_event(&event))
                .collect();
            self.dispatch_all(intents).await;
        }

        let intents: Vec<TradeIntent> = self
            .strategies
            .iter_mut()
            .filter_map(|s| s.on_bar(bar))
            .collect();
        self.dispatch_all(intents).await;
    }

    pub fn on_liquidation(&mut self, event: &LiquidationEvent) {
        self.monitor.on_liquidation(event);
    }

    pub async fn on_funding(&mut self, rate: &FundingRate) {
        self.collect_finished().await;
        let intents: Vec<TradeIntent> = self
            .strategies
            .iter_mut()
            .filter_map(|s| s.on_funding(rate))
            .collect();
        self.dispatch_all(intents).await;
    }

    /// Consume inputs until the sender closes, then wait for open orders
    pub async fn run(mut self, mut inputs: mpsc::Receiver<MarketInput>) -> EngineStats {
        while let Some(input) = inputs.recv().await {
            self.handle(input).await;
        }
        self.flush().await;

        let s = &self.stats;
        log::info!(
            "[ENGINE] Done: {} bars, {} cascade events, {} intents ({} approved, {} rejected), {} filled, {} failed",
            s.bars,
            s.cascade_events,
            s.intents,
            s.approved,
            s.rejected,
            s.filled,
            s.failed
        );
        self.stats
    }

    /// Wait for every in-flight order and deliver its report
    pub async fn flush(&mut self) -> Vec<ExecutionReport> {
        let mut reports = Vec::new();
        while let Some(joined) = self.in_flight.join_next_with_id().await {
            if let Some(report) = self.settle(joined).await {
                reports.push(report);
            }
        }
        reports
    }

    async fn dispatch_all(&mut self, intents: Vec<TradeIntent>) {
        for intent in intents {
            self.dispatch(intent).await;
        }
    }

    async fn dispatch(&mut self, intent: TradeIntent) {
        self.stats.intents += 1;
        match self.desk.evaluate(&intent).await {
            RiskDecision::Rejected(rejection) => {
                let report = ExecutionReport::for_intent(
                    &intent,
                    ExecutionStatus::Rejected {
                        reason: rejection.reason,
                    },
                );
                self.deliver(&report);
            }
            RiskDecision::Approved(order) => {
                self.stats.approved += 1;
                log::debug!("[ENGINE] Submitting order {} for intent {}", order.id, intent.id);
                let carried = (intent.clone(), order.clone());
                let submitter = self.submitter.clone();
                let desk = self.desk.clone();
                let alerts = self.alert_tx.clone();
                let handle = self.in_flight.spawn(async move {
                    match submitter.submit(&order).await {
                        Ok(fill) => {
                            desk.apply_fill(&fill).await;
                            ExecutionReport::for_intent(
                                &intent,
                                ExecutionStatus::Filled {
                                    quantity: fill.quantity,
                                    price: fill.price,
                                },
                            )
                        }
                        Err(e) => fail_order(&desk, &alerts, &intent, &order, e.to_string()).await,
                    }
                });
                self.pending.insert(handle.id(), carried);
            }
        }
    }

    /// Deliver reports of orders that already finished
    async fn collect_finished(&mut self) {
        while let Some(joined) = self.in_flight.try_join_next_with_id() {
            self.settle(joined).await;
        }
    }

    /// Turn a joined submission task into a delivered report
    async fn settle(
        &mut self,
        joined: std::result::Result<(task::Id, ExecutionReport), JoinError>,
    ) -> Option<ExecutionReport> {
        let report = match joined {
            Ok((id, report)) => {
                self.pending.remove(&id);
                report
            }
            Err(e) => {
                log::error!("[ENGINE] Execution task failed: {}", e);
                let Some((intent, order)) = self.pending.remove(&e.id()) else {
                    log::warn!("[ENGINE] No pending order for task {}", e.id());
                    return None;
                };
                let error = format!("execution task failed: {}", e);
                fail_order(&self.desk, &self.alert_tx, &intent, &order, error).await
            }
        };
        self.deliver(&report);
        Some(report)
    }

    fn deliver(&mut self, report: &ExecutionReport) {
        match report.status {
            ExecutionStatus::Filled { .. } => self.stats.filled += 1,
            ExecutionStatus::Rejected { .. } => self.stats.rejected += 1,
            ExecutionStatus::Failed { .. } => self.stats.failed += 1,
        }
        if let Some(strategy) = self
            .strategies
            .iter_mut()
            .find(|s| s.id() == report.strategy_id)
        {
            strategy.on_execution(report);
        }
    }
}

/// Release the order's reservation, raise EXECUTION_FAILED and report it
async fn fail_order(
    desk: &RiskDesk,
    alerts: &broadcast::Sender<Alert>,
    intent: &TradeIntent,
    order: &OrderRequest,
    error: String,
) -> ExecutionReport {
    desk.release(&order.id, order.created_at).await;
    let _ = alerts.send(
        Alert::new(
            AlertKind::ExecutionFailed,
            ReasonCode::ExecutionFailed,
            error.clone(),
        )
        .for_intent(intent.id, &intent.symbol, &intent.strategy_id),
    );
    ExecutionReport::for_intent(intent, ExecutionStatus::Failed { error })
}
