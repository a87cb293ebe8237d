//! Best-effort audit writer.

use std::sync::Arc;

use crate::audit::{AuditEntry, AuditRecord, AuditSink, AuditWriteError};
use crate::clock::Clock;
use crate::observability::metrics;

/// Whether an entry made it to storage.
///
/// Failures are already logged by the writer; callers discard this explicitly
/// with `let _ =` to show the audit result does not steer the operation.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOutcome {
    Recorded,
    Dropped,
}

/// Stamps entries and hands them to a sink, never failing the caller.
#[derive(Clone)]
pub struct AuditWriter<S> {
    sink: S,
    clock: Arc<dyn Clock>,
}

impl<S: AuditSink> AuditWriter<S> {
    pub fn new(sink: S, clock: Arc<dyn Clock>) -> Self {
        Self { sink, clock }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Persist `entry`. Storage errors are logged and swallowed.
    pub async fn record(&self, entry: AuditEntry) -> AuditOutcome {
        let action = entry.action.clone();
        let entity_type = entry.entity_type.clone();
        match self.persist(entry).await {
            Ok(()) => AuditOutcome::Recorded,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    action = %action,
                    entity_type = %entity_type,
                    "Audit log write failed"
                );
                metrics::record_audit_failure();
                AuditOutcome::Dropped
            }
        }
    }

    async fn persist(&self, entry: AuditEntry) -> Result<(), AuditWriteError> {
        let record = AuditRecord::from_entry(entry, self.clock.now_ms());
        self.sink.append(record).await
    }
}
