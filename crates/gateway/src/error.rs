//! Error types for the gateway crate

use thiserror::Error;
use uuid::Uuid;

/// Errors returned by an execution venue for a single submission
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Exchange error: {0}")]
    Exchange(String),

    /// The venue refused the order; resubmitting will not help
    #[error("Order rejected: {0}")]
    Rejected(String),

    #[error("Channel closed")]
    ChannelClosed,
}

impl GatewayError {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, GatewayError::Rejected(_))
    }
}

/// Final outcome of a failed order after the submitter gave up
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("Order {order_id} failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        order_id: Uuid,
        attempts: u32,
        last_error: String,
    },

    #[error("Order {order_id} rejected by venue: {reason}")]
    Rejected { order_id: Uuid, reason: String },
}

impl ExecutionError {
    pub fn order_id(&self) -> Uuid {
        match self {
            ExecutionError::RetriesExhausted { order_id, .. }
            | ExecutionError::Rejected { order_id, .. } => *order_id,
        }
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
