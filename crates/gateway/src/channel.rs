//! Tokio channel-based gateway
//!
//! Request/reply over mpsc + oneshot: the engine side holds a
//! [`ChannelGateway`], an execution process holds the
//! [`ChannelGatewayResponder`] and answers each order with a fill or an error.

use async_trait::async_trait;
use bastion_core::{Fill, OrderRequest};
use tokio::sync::{mpsc, oneshot};

use crate::error::{GatewayError, Result};
use crate::gateway::ExecutionGateway;

/// Request message wrapper for channel-based request/reply
struct ExecutionRequest {
    order: OrderRequest,
    reply_tx: oneshot::Sender<Result<Fill>>,
}

/// Engine side of the channel
#[derive(Clone)]
pub struct ChannelGateway {
    tx: mpsc::Sender<ExecutionRequest>,
}

impl ChannelGateway {
    /// Create a gateway/responder pair
    pub fn pair(capacity: usize) -> (Self, ChannelGatewayResponder) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, ChannelGatewayResponder { rx })
    }
}

#[async_trait]
impl ExecutionGateway for ChannelGateway {
    async fn submit(&self, order: &OrderRequest) -> Result<Fill> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let request = ExecutionRequest {
            order: order.clone(),
            reply_tx,
        };

        self.tx
            .send(request)
            .await
            .map_err(|_| GatewayError::ChannelClosed)?;

        reply_rx.await.map_err(|_| GatewayError::ChannelClosed)?
    }

    fn name(&self) -> &str {
        "channel"
    }
}

/// Execution side of the channel
pub struct ChannelGatewayResponder {
    rx: mpsc::Receiver<ExecutionRequest>,
}

impl ChannelGatewayResponder {
    /// Receive the next order; `None` once every gateway handle is dropped
    pub async fn next(&mut self) -> Option<(OrderRequest, oneshot::Sender<Result<Fill>>)> {
        self.rx.recv().await.map(|req| (req.order, req.reply_tx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bastion_core::{Side, TradeIntent};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn order() -> OrderRequest {
        let intent = TradeIntent::open("vwap", "ETH-USD", Side::Sell, dec!(3000), Utc::now());
        OrderRequest::from_intent(&intent, dec!(2))
    }

    #[tokio::test]
    async fn test_request_reply() {
        let (gateway, mut responder) = ChannelGateway::pair(10);

        // Spawn responder task
        let handle = tokio::spawn(async move {
            if let Some((order, reply_tx)) = responder.next().await {
                let fill = Fill::for_order(&order, dec!(2999), dec!(1.5), order.created_at);
                let _ = reply_tx.send(Ok(fill));
            }
        });

        let order = order();
        let fill = gateway.submit(&order).await.unwrap();
        assert_eq!(fill.order_id, order.id);
        assert_eq!(fill.price, dec!(2999));

        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_venue_error_passes_through() {
        let (gateway, mut responder) = ChannelGateway::pair(10);
        tokio::spawn(async move {
            if let Some((_, reply_tx)) = responder.next().await {
                let _ = reply_tx.send(Err(GatewayError::Rejected("post-only".to_string())));
            }
        });

        let err = gateway.submit(&order()).await.unwrap_err();
        assert_eq!(err, GatewayError::Rejected("post-only".to_string()));
    }

    #[tokio::test]
    async fn test_dropped_responder_closes_channel() {
        let (gateway, responder) = ChannelGateway::pair(10);
        drop(responder);
        assert_eq!(
            gateway.submit(&order()).await.unwrap_err(),
            GatewayError::ChannelClosed
        );
    }
}
