//! Bastion Gateway
//!
//! Execution layer for the Bastion trading system. Provides:
//! - The `ExecutionGateway` trait every venue adapter implements
//! - `PaperGateway` for dry runs and tests
//! - `ChannelGateway` for wiring an external execution process over tokio channels
//! - `OrderSubmitter`, which adds timeouts and retries with backoff
//!
//! ## Architecture
//!
//! ```text
//!   Approved OrderRequest
//!         │
//!    ┌────▼──────────┐
//!    │OrderSubmitter │  timeout per attempt, exponential backoff
//!    └────┬──────────┘
//!         │ submit()
//!    ┌────▼──────────┐
//!    │   Gateway     │  Paper | Channel ──► execution process
//!    └────┬──────────┘
//!         │
//!       Fill | ExecutionError
//! ```

pub mod backoff;
pub mod channel;
pub mod error;
pub mod gateway;
pub mod submitter;

// Re-export commonly used types
pub use backoff::ExponentialBackoff;
pub use channel::{ChannelGateway, ChannelGatewayResponder};
pub use error::{ExecutionError, GatewayError, Result};
pub use gateway::{ExecutionGateway, PaperGateway};
pub use submitter::{OrderSubmitter, SubmitPolicy};
