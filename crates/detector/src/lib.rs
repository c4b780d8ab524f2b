//! Bastion Cascade Detector
//!
//! Classifies liquidation-cascade conditions from a stream of bars.
//!
//! Three tiers are computed bar-over-bar against the immediately preceding
//! bar, never over an aggregate window:
//!
//! | Tier | Ratio | Default threshold |
//! |------|-------|-------------------|
//! | 1 | `volume_t / volume_{t-1}` | 2.0 |
//! | 2 | `body_t / body_{t-1}` | 1.5 |
//! | 3 | `range_t / range_{t-1}` | 1.3 |
//!
//! A cascade is detected only when all three tiers trigger on the same bar.
//!
//! ```text
//!            detected                 !detected && strength declining
//!   Idle ─────────────► Active ──────────────────────────────► Exhausting
//!    ▲                   │  ▲                                      │
//!    │  !detected &&     │  └──────────── detected ────────────────┤
//!    │  not declining    │                                          │
//!    └───────────────────┘◄──── strength stable / grace elapsed ────┘
//! ```
//!
//! Every phase transition emits a [`CascadeEvent`](bastion_core::CascadeEvent).

pub mod config;
pub mod detector;
pub mod monitor;

pub use config::DetectorConfig;
pub use detector::{CascadeDetector, CascadeState};
pub use monitor::CascadeMonitor;
