//! Session note persistence.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;

use crate::notes::model::SessionNote;

/// Errors raised by a note store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("note {0} already exists")]
    Duplicate(String),

    #[error("note {0} does not exist")]
    NotFound(String),

    #[error("note {id} is at version {actual}, expected {expected}")]
    Conflict { id: String, expected: u64, actual: u64 },
}

/// Keyed storage for session notes. Every write is all-or-nothing.
pub trait NoteStore: Send + Sync {
    fn insert(&self, note: SessionNote) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn get(&self, id: &str) -> impl Future<Output = Result<Option<SessionNote>, StoreError>> + Send;

    /// Replace a note only if the stored version equals `expected_version`.
    fn update(
        &self,
        note: SessionNote,
        expected_version: u64,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Notes newest first, optionally for one therapist. Returns the page and
    /// the total number of matches.
    fn list(
        &self,
        therapist_id: Option<&str>,
        offset: usize,
        limit: usize,
    ) -> impl Future<Output = Result<(Vec<SessionNote>, usize), StoreError>> + Send;
}

/// Concurrent in-memory note store with an optional JSON snapshot file.
///
/// With a snapshot path, each mutation is written to disk first and only
/// then published to readers. A failed or cancelled write leaves the map
/// untouched.
#[derive(Clone, Default)]
pub struct MemoryNoteStore {
    notes: Arc<DashMap<String, SessionNote>>,
    snapshot_path: Option<Arc<PathBuf>>,
    write_lock: Arc<tokio::sync::Mutex<()>>,
}

impl MemoryNoteStore {
    /// Create an empty store without persistence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a store backed by `path`, loading it if it exists.
    pub async fn load_from_file(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let store = Self {
            snapshot_path: Some(Arc::new(path.clone())),
            ..Self::default()
        };

        match tokio::fs::read(&path).await {
            Ok(raw) if !raw.is_empty() => {
                let map: BTreeMap<String, SessionNote> = serde_json::from_slice(&raw)?;
                for (id, note) in map {
                    store.notes.insert(id, note);
                }
                tracing::info!(path = ?path, notes = store.notes.len(), "Loaded session notes");
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = ?path, "No session note snapshot yet, starting empty");
            }
            Err(e) => return Err(e.into()),
        }
        Ok(store)
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Write the snapshot file, if one is configured.
    pub async fn save_to_file(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.persist(None).await
    }

    // Writes the current notes plus `pending` (which replaces any note with
    // the same id). Callers must hold `write_lock`.
    async fn persist(&self, pending: Option<&SessionNote>) -> Result<(), StoreError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        let mut map: BTreeMap<String, SessionNote> = self
            .notes
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();
        if let Some(note) = pending {
            map.insert(note.id.clone(), note.clone());
        }
        let serialized = serde_json::to_vec_pretty(&map)?;

        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, &serialized).await?;
        tokio::fs::rename(&tmp, path.as_path()).await?;
        Ok(())
    }
}

impl NoteStore for MemoryNoteStore {
    async fn insert(&self, note: SessionNote) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        if self.notes.contains_key(&note.id) {
            return Err(StoreError::Duplicate(note.id));
        }
        self.persist(Some(&note)).await?;
        self.notes.insert(note.id.clone(), note);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<SessionNote>, StoreError> {
        Ok(self.notes.get(id).map(|r| r.value().clone()))
    }

    async fn update(&self, note: SessionNote, expected_version: u64) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let previous = self
            .notes
            .get(&note.id)
            .map(|r| r.value().clone())
            .ok_or_else(|| StoreError::NotFound(note.id.clone()))?;

        if previous.version != expected_version {
            return Err(StoreError::Conflict {
                id: note.id,
                expected: expected_version,
                actual: previous.version,
            });
        }

        self.persist(Some(&note)).await?;
        self.notes.insert(note.id.clone(), note);
        Ok(())
    }

    async fn list(
        &self,
        therapist_id: Option<&str>,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<SessionNote>, usize), StoreError> {
        let mut matching: Vec<SessionNote> = self
            .notes
            .iter()
            .filter(|r| therapist_id.map_or(true, |t| r.value().therapist_id == t))
            .map(|r| r.value().clone())
            .collect();
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        let total = matching.len();
        let page = matching.into_iter().skip(offset).take(limit).collect();
        Ok((page, total))
    }
}
