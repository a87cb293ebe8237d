//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Log fields carry identifiers only; note content and tokens are never logged
//! - Request ID flows from the HTTP layer into every span
//! - Metric calls are no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
