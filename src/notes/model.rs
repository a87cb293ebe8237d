//! Session note records and views.

use serde::{Deserialize, Serialize};

use crate::crypto::EncryptedPayload;

/// A stored session note. Content exists only in encrypted form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionNote {
    pub id: String,
    pub appointment_id: String,
    pub therapist_id: String,
    pub encrypted_content: EncryptedPayload,
    /// Starts at 1 and increases with every edit.
    pub version: u64,
    pub created_at: u64,
    pub updated_at: u64,
}

/// Non-content fields of a note, safe to return from any call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteSummary {
    pub id: String,
    pub appointment_id: String,
    pub therapist_id: String,
    pub version: u64,
    pub created_at: u64,
    pub updated_at: u64,
}

impl From<&SessionNote> for NoteSummary {
    fn from(note: &SessionNote) -> Self {
        Self {
            id: note.id.clone(),
            appointment_id: note.appointment_id.clone(),
            therapist_id: note.therapist_id.clone(),
            version: note.version,
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }
}

/// A note together with its decrypted content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteView {
    pub note: NoteSummary,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NoteFilter {
    pub therapist_id: Option<String>,
}

/// One page of note summaries, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotePage {
    pub notes: Vec<NoteSummary>,
    pub total: usize,
    pub total_pages: usize,
    pub current_page: usize,
}

/// SOAP-structured clinical content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteContent {
    pub subjective: String,
    pub objective: String,
    pub assessment: String,
    pub plan: String,
}

impl NoteContent {
    /// Serialize to the plaintext that gets sealed.
    pub fn to_plaintext(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse sealed plaintext. Text that is not a SOAP object is kept as the
    /// subjective section.
    pub fn from_plaintext(text: &str) -> Self {
        match serde_json::from_str::<NoteContent>(text) {
            Ok(content) => content,
            Err(_) => NoteContent {
                subjective: text.to_string(),
                ..Default::default()
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.subjective.trim().is_empty()
            && self.objective.trim().is_empty()
            && self.assessment.trim().is_empty()
            && self.plan.trim().is_empty()
    }
}
