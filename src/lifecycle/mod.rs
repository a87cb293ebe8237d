//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → verify key → open stores → build services → AppState
//!
//! Shutdown (shutdown.rs):
//!     Signal received → broadcast → stop accepting, drain, stop sweeper
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: a missing or malformed encryption key aborts startup
//! - Background tasks all subscribe to the same shutdown broadcast

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
pub use startup::{bootstrap, bootstrap_with_clock, Services, StartupError};
