//! Session note orchestration.

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::audit::record::ENTITY_SESSION_NOTE;
use crate::audit::{actions, AuditEntry, AuditSink, AuditWriter};
use crate::clock::Clock;
use crate::crypto::{Envelope, EnvelopeError};
use crate::notes::model::{NoteFilter, NotePage, NoteSummary, NoteView, SessionNote};
use crate::notes::store::NoteStore;
use crate::notes::NoteError;
use crate::observability::metrics;
use crate::security::{require_owner_or_admin, require_role, AccessError, Principal, Role, RoleSet};

/// Default number of notes per listing page.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Authorizes, encrypts, persists and audits clinical session notes.
pub struct SessionNoteService<S, A> {
    store: S,
    envelope: Envelope,
    audit: AuditWriter<A>,
    clock: Arc<dyn Clock>,
    page_size: usize,
}

impl<S: NoteStore, A: AuditSink> SessionNoteService<S, A> {
    pub fn new(store: S, envelope: Envelope, audit: AuditWriter<A>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            envelope,
            audit,
            clock,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn audit(&self) -> &AuditWriter<A> {
        &self.audit
    }

    /// Document a session. Only the non-content fields come back.
    pub async fn create_note(
        &self,
        principal: Option<&Principal>,
        appointment_id: &str,
        plaintext: &str,
    ) -> Result<NoteSummary, NoteError> {
        let result = self.create_inner(principal, appointment_id, plaintext).await;
        metrics::record_note_operation("create", outcome(&result));
        result
    }

    /// Decrypt a note for its author or an admin.
    pub async fn read_note(
        &self,
        principal: Option<&Principal>,
        note_id: &str,
    ) -> Result<NoteView, NoteError> {
        let result = self.read_inner(principal, note_id).await;
        metrics::record_note_operation("read", outcome(&result));
        result
    }

    /// Re-seal a note with new content under a fresh nonce.
    ///
    /// `expected_version` lets the caller reject the edit if someone else saved
    /// first. Without it the edit is still checked against the version read at
    /// the start of this call.
    pub async fn update_note(
        &self,
        principal: Option<&Principal>,
        note_id: &str,
        plaintext: &str,
        expected_version: Option<u64>,
    ) -> Result<NoteSummary, NoteError> {
        let result = self
            .update_inner(principal, note_id, plaintext, expected_version)
            .await;
        metrics::record_note_operation("update", outcome(&result));
        result
    }

    /// List note summaries. Therapists only ever see their own notes.
    pub async fn list_notes(
        &self,
        principal: Option<&Principal>,
        filter: NoteFilter,
        page: usize,
    ) -> Result<NotePage, NoteError> {
        let result = self.list_inner(principal, filter, page).await;
        metrics::record_note_operation("list", outcome(&result));
        result
    }

    async fn create_inner(
        &self,
        principal: Option<&Principal>,
        appointment_id: &str,
        plaintext: &str,
    ) -> Result<NoteSummary, NoteError> {
        let principal = self.authorize(principal, "create", None).await?;

        let appointment_id = appointment_id.trim();
        if appointment_id.is_empty() {
            return Err(NoteError::InvalidInput("appointment is required".to_string()));
        }

        tracing::debug!(principal_id = %principal.id, appointment_id, "Creating session note");

        let encrypted_content = self.envelope.seal(plaintext)?;
        let now = self.clock.now_ms();
        let note = SessionNote {
            id: Uuid::new_v4().to_string(),
            appointment_id: appointment_id.to_string(),
            therapist_id: principal.id.clone(),
            encrypted_content,
            version: 1,
            created_at: now,
            updated_at: now,
        };
        let summary = NoteSummary::from(&note);

        self.store.insert(note).await?;

        let _ = self
            .audit
            .record(
                AuditEntry::new(actions::NOTE_CREATED, ENTITY_SESSION_NOTE)
                    .user(&principal.id)
                    .entity(&summary.id)
                    .details(json!({ "appointment_id": summary.appointment_id })),
            )
            .await;

        tracing::info!(note_id = %summary.id, principal_id = %principal.id, "Session note created");
        Ok(summary)
    }

    async fn read_inner(
        &self,
        principal: Option<&Principal>,
        note_id: &str,
    ) -> Result<NoteView, NoteError> {
        let principal = self.authorize(principal, "read", Some(note_id)).await?;
        let note = self.load_authorized(principal, note_id, "read").await?;

        let content = match self.envelope.open_payload(&note.encrypted_content) {
            Ok(content) => content,
            Err(EnvelopeError::Config(msg)) => return Err(NoteError::Config(msg)),
            Err(e) => {
                tracing::error!(note_id, error = %e, "Session note failed integrity check");
                let _ = self
                    .audit
                    .record(
                        AuditEntry::new(actions::NOTE_INTEGRITY_FAILURE, ENTITY_SESSION_NOTE)
                            .user(&principal.id)
                            .entity(note_id),
                    )
                    .await;
                return Err(NoteError::DataIntegrity {
                    note_id: note_id.to_string(),
                });
            }
        };

        let _ = self
            .audit
            .record(
                AuditEntry::new(actions::NOTE_VIEWED, ENTITY_SESSION_NOTE)
                    .user(&principal.id)
                    .entity(note_id),
            )
            .await;

        tracing::info!(note_id, principal_id = %principal.id, "Session note read");
        Ok(NoteView {
            note: NoteSummary::from(&note),
            content,
        })
    }

    async fn update_inner(
        &self,
        principal: Option<&Principal>,
        note_id: &str,
        plaintext: &str,
        expected_version: Option<u64>,
    ) -> Result<NoteSummary, NoteError> {
        let principal = self.authorize(principal, "update", Some(note_id)).await?;
        let existing = self.load_authorized(principal, note_id, "update").await?;

        if expected_version.is_some_and(|v| v != existing.version) {
            tracing::warn!(
                note_id,
                expected = ?expected_version,
                actual = existing.version,
                "Rejected stale session note update"
            );
            return Err(NoteError::Conflict {
                note_id: note_id.to_string(),
            });
        }

        tracing::debug!(note_id, principal_id = %principal.id, "Updating session note");

        let encrypted_content = self.envelope.seal(plaintext)?;
        let updated = SessionNote {
            encrypted_content,
            version: existing.version + 1,
            updated_at: self.clock.now_ms().max(existing.updated_at),
            ..existing.clone()
        };
        let summary = NoteSummary::from(&updated);

        self.store.update(updated, existing.version).await?;

        let _ = self
            .audit
            .record(
                AuditEntry::new(actions::NOTE_UPDATED, ENTITY_SESSION_NOTE)
                    .user(&principal.id)
                    .entity(note_id)
                    .details(json!({ "version": summary.version })),
            )
            .await;

        tracing::info!(note_id, principal_id = %principal.id, version = summary.version, "Session note updated");
        Ok(summary)
    }

    async fn list_inner(
        &self,
        principal: Option<&Principal>,
        filter: NoteFilter,
        page: usize,
    ) -> Result<NotePage, NoteError> {
        let principal = self.authorize(principal, "list", None).await?;

        let therapist_id = if principal.role == Role::Therapist {
            Some(principal.id.clone())
        } else {
            filter.therapist_id
        };

        let page = page.max(1);
        let offset = (page - 1).saturating_mul(self.page_size);
        let (notes, total) = self
            .store
            .list(therapist_id.as_deref(), offset, self.page_size)
            .await?;

        Ok(NotePage {
            notes: notes.iter().map(NoteSummary::from).collect(),
            total,
            total_pages: total.div_ceil(self.page_size),
            current_page: page,
        })
    }

    /// Clinical role check, auditing any denial.
    async fn authorize<'p>(
        &self,
        principal: Option<&'p Principal>,
        operation: &str,
        note_id: Option<&str>,
    ) -> Result<&'p Principal, NoteError> {
        match require_role(principal, RoleSet::CLINICAL) {
            Ok(p) => Ok(p),
            Err(e) => {
                self.record_denial(principal, operation, note_id, &e).await;
                Err(e.into())
            }
        }
    }

    /// Fetch a note only its author or an admin may touch.
    ///
    /// Non-admins get the same denial for a missing id as for a colleague's
    /// note, so existence is only revealed to admins.
    async fn load_authorized(
        &self,
        principal: &Principal,
        note_id: &str,
        operation: &str,
    ) -> Result<SessionNote, NoteError> {
        let note = match self.store.get(note_id).await? {
            Some(note) => note,
            None if principal.role == Role::Admin => return Err(NoteError::NotFound),
            None => {
                tracing::debug!(note_id, operation, "Denying access to unknown session note");
                let denial = AccessError::Forbidden;
                self.record_denial(Some(principal), operation, Some(note_id), &denial)
                    .await;
                return Err(denial.into());
            }
        };
        if let Err(e) = require_owner_or_admin(principal, &note.therapist_id) {
            self.record_denial(Some(principal), operation, Some(&note.id), &e)
                .await;
            return Err(e.into());
        }
        Ok(note)
    }

    async fn record_denial(
        &self,
        principal: Option<&Principal>,
        operation: &str,
        note_id: Option<&str>,
        reason: &AccessError,
    ) {
        tracing::warn!(
            principal_id = principal.map(|p| p.id.as_str()).unwrap_or("anonymous"),
            operation,
            note_id = note_id.unwrap_or("-"),
            reason = %reason,
            "Session note access denied"
        );

        let mut entry = AuditEntry::new(actions::NOTE_ACCESS_DENIED, ENTITY_SESSION_NOTE)
            .details(json!({ "operation": operation, "reason": reason.to_string() }));
        if let Some(p) = principal {
            entry = entry.user(&p.id);
        }
        if let Some(id) = note_id {
            entry = entry.entity(id);
        }
        let _ = self.audit.record(entry).await;
    }
}

fn outcome<T>(result: &Result<T, NoteError>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    }
}
