//! Encrypted clinical session notes.
//!
//! # Data Flow
//! ```text
//! create/update:
//!     authorize (clinical roles, owner-or-admin for edits)
//!     → seal content (fresh nonce)
//!     → store write (all-or-nothing)
//!     → audit (only after the write is confirmed)
//!
//! read:
//!     authorize → load → owner-or-admin → open (tag verified) → audit
//! ```
//!
//! # Design Decisions
//! - Plaintext never reaches the store, the audit log or the logs
//! - A tag failure surfaces as `DataIntegrity`, distinct from `NotFound`
//! - Edits are version-checked; a stale writer gets `Conflict`

pub mod model;
pub mod service;
pub mod store;

use thiserror::Error;

use crate::crypto::EnvelopeError;
use crate::security::AccessError;

pub use model::{NoteContent, NoteFilter, NotePage, NoteSummary, NoteView, SessionNote};
pub use service::SessionNoteService;
pub use store::{MemoryNoteStore, NoteStore, StoreError};

/// Errors surfaced by the session note service.
#[derive(Debug, Error)]
pub enum NoteError {
    #[error(transparent)]
    Access(#[from] AccessError),

    #[error("session note not found")]
    NotFound,

    /// Stored ciphertext failed authentication.
    #[error("session note {note_id} failed integrity verification")]
    DataIntegrity { note_id: String },

    #[error("encryption misconfigured: {0}")]
    Config(String),

    #[error("session note {note_id} was modified concurrently")]
    Conflict { note_id: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("storage error: {0}")]
    Store(StoreError),
}

impl NoteError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            NoteError::Access(AccessError::Unauthenticated) => "unauthenticated",
            NoteError::Access(AccessError::Forbidden) => "forbidden",
            NoteError::NotFound => "not_found",
            NoteError::DataIntegrity { .. } => "integrity",
            NoteError::Config(_) => "config",
            NoteError::Conflict { .. } => "conflict",
            NoteError::InvalidInput(_) => "invalid",
            NoteError::Store(_) => "store",
        }
    }
}

impl From<StoreError> for NoteError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { id, .. } => NoteError::Conflict { note_id: id },
            StoreError::NotFound(_) => NoteError::NotFound,
            other => NoteError::Store(other),
        }
    }
}

/// Map a sealing failure. Opening failures are handled by the service.
impl From<EnvelopeError> for NoteError {
    fn from(err: EnvelopeError) -> Self {
        match err {
            EnvelopeError::Config(msg) => NoteError::Config(msg),
            EnvelopeError::Cipher => {
                NoteError::InvalidInput("content could not be encrypted".to_string())
            }
            EnvelopeError::Authentication => {
                NoteError::Config("unexpected authentication failure while sealing".to_string())
            }
        }
    }
}
