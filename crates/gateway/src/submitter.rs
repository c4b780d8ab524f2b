//! Order Submitter
//!
//! Wraps a gateway with a per-attempt timeout and bounded retries. A venue
//! rejection ends the order at once; connection errors and timeouts are
//! retried with exponential backoff until the attempts run out.

use bastion_core::error::checks;
use bastion_core::{ConfigError, Fill, OrderRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};

use crate::backoff::ExponentialBackoff;
use crate::error::ExecutionError;
use crate::gateway::ExecutionGateway;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmitPolicy {
    /// Per-attempt timeout
    pub timeout_ms: u64,
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
    /// Jitter as a fraction of each delay
    pub jitter: f64,
}

impl Default for SubmitPolicy {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            max_attempts: 3,
            backoff_base_ms: 500,
            backoff_max_ms: 8_000,
            jitter: 0.1,
        }
    }
}

impl SubmitPolicy {
    pub fn validate(&self) -> Result<(), ConfigError> {
        checks::non_zero("execution.timeout_ms", self.timeout_ms as usize)?;
        checks::non_zero("execution.max_attempts", self.max_attempts as usize)?;
        if self.backoff_base_ms > self.backoff_max_ms {
            return Err(ConfigError::invalid(
                "execution.backoff_base_ms",
                "cannot exceed backoff_max_ms",
            ));
        }
        if !(0.0..=1.0).contains(&self.jitter) {
            return Err(ConfigError::invalid("execution.jitter", "must lie in [0, 1]"));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff::new(
            Duration::from_millis(self.backoff_base_ms),
            Duration::from_millis(self.backoff_max_ms),
            self.jitter,
        )
    }
}

#[derive(Clone)]
pub struct OrderSubmitter {
    gateway: Arc<dyn ExecutionGateway>,
    policy: SubmitPolicy,
}

impl OrderSubmitter {
    pub fn new(gateway: Arc<dyn ExecutionGateway>, policy: SubmitPolicy) -> Self {
        Self { gateway, policy }
    }

    pub fn policy(&self) -> &SubmitPolicy {
        &self.policy
    }

    /// Submit until filled, rejected, or out of attempts
    pub async fn submit(&self, order: &OrderRequest) -> Result<Fill, ExecutionError> {
        let mut backoff = self.policy.backoff();
        let attempts = self.policy.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match timeout(self.policy.timeout(), self.gateway.submit(order)).await {
                Ok(Ok(fill)) => {
                    log::info!(
                        "[EXEC] {} filled {} {} {} @ {} via {} (attempt {})",
                        order.id,
                        fill.symbol,
                        fill.side.as_str(),
                        fill.quantity,
                        fill.price,
                        self.gateway.name(),
                        attempt
                    );
                    return Ok(fill);
                }
                Ok(Err(e)) if !e.is_retryable() => {
                    log::error!("[EXEC] {} rejected by {}: {}", order.id, self.gateway.name(), e);
                    return Err(ExecutionError::Rejected {
                        order_id: order.id,
                        reason: e.to_string(),
                    });
                }
                Ok(Err(e)) => last_error = e.to_string(),
                Err(_) => {
                    last_error = format!("timed out after {}ms", self.policy.timeout_ms);
                }
            }

            log::warn!(
                "[EXEC] {} attempt {}/{} failed: {}",
                order.id,
                attempt,
                attempts,
                last_error
            );
            if attempt < attempts {
                sleep(backoff.next_delay()).await;
            }
        }

        log::error!(
            "[EXEC] {} giving up after {} attempts: {}",
            order.id,
            attempts,
            last_error
        );
        Err(ExecutionError::RetriesExhausted {
            order_id: order.id,
            attempts,
            last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GatewayError, Result};
    use async_trait::async_trait;
    use bastion_core::{Side, TradeIntent};
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` calls with a connection error
    struct FlakyGateway {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl ExecutionGateway for FlakyGateway {
        async fn submit(&self, order: &OrderRequest) -> Result<Fill> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(GatewayError::Connection("reset by peer".to_string()));
            }
            Ok(Fill::for_order(order, order.entry_price, dec!(0), order.created_at))
        }
    }

    /// Never answers
    struct SilentGateway {
        calls: AtomicU32,
    }

    #[async_trait]
    impl ExecutionGateway for SilentGateway {
        async fn submit(&self, _order: &OrderRequest) -> Result<Fill> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::future::pending().await
        }
    }

    struct RejectingGateway {
        calls: AtomicU32,
    }

    #[async_trait]
    impl ExecutionGateway for RejectingGateway {
        async fn submit(&self, _order: &OrderRequest) -> Result<Fill> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(GatewayError::Rejected("insufficient margin".to_string()))
        }
    }

    fn order() -> OrderRequest {
        let intent = TradeIntent::open("mr", "BTC-USD", Side::Buy, dec!(50000), Utc::now());
        OrderRequest::from_intent(&intent, dec!(0.1))
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_filled() {
        let _ = env_logger::try_init();
        let gateway = Arc::new(FlakyGateway {
            failures: 2,
            calls: AtomicU32::new(0),
        });
        let submitter = OrderSubmitter::new(gateway.clone(), SubmitPolicy::default());

        let fill = submitter.submit(&order()).await.unwrap();
        assert_eq!(fill.price, dec!(50000));
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeouts_exhaust_retries() {
        let gateway = Arc::new(SilentGateway {
            calls: AtomicU32::new(0),
        });
        let submitter = OrderSubmitter::new(gateway.clone(), SubmitPolicy::default());
        let order = order();

        let started = tokio::time::Instant::now();
        let err = submitter.submit(&order).await.unwrap_err();
        match &err {
            ExecutionError::RetriesExhausted {
                order_id,
                attempts,
                last_error,
            } => {
                assert_eq!(*order_id, order.id);
                assert_eq!(*attempts, 3);
                assert!(last_error.contains("timed out"));
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 3);
        // Three 10s timeouts plus two backoff sleeps
        assert!(started.elapsed() >= Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejection_is_not_retried() {
        let gateway = Arc::new(RejectingGateway {
            calls: AtomicU32::new(0),
        });
        let submitter = OrderSubmitter::new(gateway.clone(), SubmitPolicy::default());

        let err = submitter.submit(&order()).await.unwrap_err();
        assert!(matches!(err, ExecutionError::Rejected { .. }));
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_policy_validation() {
        assert!(SubmitPolicy::default().validate().is_ok());
        let policy = SubmitPolicy {
            max_attempts: 0,
            ..Default::default()
        };
        assert!(policy.validate().is_err());
        let policy = SubmitPolicy {
            backoff_base_ms: 10_000,
            ..Default::default()
        };
        assert!(policy.validate().is_err());
    }
}
