//! Execution gateway trait and the paper gateway

use async_trait::async_trait;
use bastion_core::{Fill, OrderRequest};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{GatewayError, Result};

/// Sends one order to a venue and waits for its fill
#[async_trait]
pub trait ExecutionGateway: Send + Sync {
    async fn submit(&self, order: &OrderRequest) -> Result<Fill>;

    fn name(&self) -> &str {
        "gateway"
    }
}

/// Fills every order immediately at its entry price
pub struct PaperGateway {
    /// Fee as a fraction of notional
    fee_rate: Decimal,
    submitted: AtomicU64,
}

impl PaperGateway {
    pub fn new(fee_rate: Decimal) -> Self {
        Self {
            fee_rate,
            submitted: AtomicU64::new(0),
        }
    }

    /// Orders filled so far
    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }
}

impl Default for PaperGateway {
    fn default() -> Self {
        Self::new(Decimal::ZERO)
    }
}

#[async_trait]
impl ExecutionGateway for PaperGateway {
    async fn submit(&self, order: &OrderRequest) -> Result<Fill> {
        if order.quantity <= Decimal::ZERO || order.entry_price <= Decimal::ZERO {
            return Err(GatewayError::Rejected(format!(
                "invalid size {} @ {}",
                order.quantity, order.entry_price
            )));
        }
        let fee = order.notional() * self.fee_rate;
        self.submitted.fetch_add(1, Ordering::Relaxed);
        log::debug!(
            "[PAPER] filled {} {} {} @ {} (fee {})",
            order.symbol,
            order.side.as_str(),
            order.quantity,
            order.entry_price,
            fee
        );
        // Bar time, not wall time, so day accounting follows the data
        Ok(Fill::for_order(order, order.entry_price, fee, order.created_at))
    }

    fn name(&self) -> &str {
        "paper"
    }
}
