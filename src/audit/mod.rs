//! Audit trail for security-relevant actions.
//!
//! # Data Flow
//! ```text
//! SessionNoteService / AuthGuard
//!     → AuditEntry (who, what, which entity, safe details)
//!     → writer.rs (stamp time + id, persist, swallow failures)
//!     → store.rs (memory or JSON-lines backend)
//! ```
//!
//! # Design Decisions
//! - Availability over durability: a failed audit write is logged and
//!   counted, never returned to the business operation
//! - Records are append-only; nothing here updates or deletes them
//! - Details carry identifiers and versions only, never clinical content

pub mod record;
pub mod store;
pub mod writer;

use thiserror::Error;

pub use record::{actions, AuditEntry, AuditRecord};
pub use store::{AuditSink, AuditStore, JsonlAuditStore, MemoryAuditStore};
pub use writer::{AuditOutcome, AuditWriter};

/// Failure to persist an audit record.
#[derive(Debug, Error)]
pub enum AuditWriteError {
    #[error("audit I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("audit serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("audit store unavailable: {0}")]
    Unavailable(String),
}
