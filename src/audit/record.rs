//! Audit record types.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Action names written by this crate.
pub mod actions {
    pub const NOTE_CREATED: &str = "note_created";
    pub const NOTE_VIEWED: &str = "note_viewed";
    pub const NOTE_UPDATED: &str = "note_updated";
    pub const NOTE_ACCESS_DENIED: &str = "note_access_denied";
    pub const NOTE_INTEGRITY_FAILURE: &str = "note_integrity_failure";
    pub const LOGIN_FAILED: &str = "login_failed";
    pub const LOGIN_RATE_LIMITED: &str = "login_rate_limited";
}

/// Entity type for session notes.
pub const ENTITY_SESSION_NOTE: &str = "session_note";
/// Entity type for authentication attempts.
pub const ENTITY_SESSION: &str = "session";

/// What the caller hands to the writer.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    pub user_id: Option<String>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub details: Option<Value>,
    pub ip_address: Option<String>,
}

impl AuditEntry {
    pub fn new(action: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            user_id: None,
            action: action.into(),
            entity_type: entity_type.into(),
            entity_id: None,
            details: None,
            ip_address: None,
        }
    }

    pub fn user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn entity(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    pub fn details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn ip(mut self, ip_address: impl Into<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self
    }
}

/// A persisted, append-only audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub user_id: Option<String>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub details: Option<Value>,
    pub ip_address: Option<String>,
    /// Unix milliseconds.
    pub created_at: u64,
}

impl AuditRecord {
    pub fn from_entry(entry: AuditEntry, created_at: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: entry.user_id,
            action: entry.action,
            entity_type: entry.entity_type,
            entity_id: entry.entity_id,
            details: entry.details,
            ip_address: entry.ip_address,
            created_at,
        }
    }
}
