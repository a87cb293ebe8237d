//! Audit storage backends.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::io::AsyncWriteExt;

use crate::audit::{AuditRecord, AuditWriteError};
use crate::config::AuditConfig;

/// Append-only destination for audit records.
pub trait AuditSink: Send + Sync {
    fn append(
        &self,
        record: AuditRecord,
    ) -> impl Future<Output = Result<(), AuditWriteError>> + Send;
}

/// In-process audit log, readable for inspection.
#[derive(Clone, Default)]
pub struct MemoryAuditStore {
    records: Arc<Mutex<Vec<AuditRecord>>>,
}

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far, oldest first.
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl AuditSink for MemoryAuditStore {
    async fn append(&self, record: AuditRecord) -> Result<(), AuditWriteError> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| AuditWriteError::Unavailable("audit lock poisoned".to_string()))?;
        records.push(record);
        Ok(())
    }
}

/// Audit log stored as one JSON object per line.
#[derive(Clone)]
pub struct JsonlAuditStore {
    path: Arc<PathBuf>,
    write_lock: Arc<tokio::sync::Mutex<()>>,
}

impl JsonlAuditStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
            write_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole log back.
    pub async fn read_records(&self) -> Result<Vec<AuditRecord>, AuditWriteError> {
        let raw = match tokio::fs::read_to_string(&*self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        raw.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(AuditWriteError::from))
            .collect()
    }
}

impl AuditSink for JsonlAuditStore {
    async fn append(&self, record: AuditRecord) -> Result<(), AuditWriteError> {
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&*self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}

/// The backend selected by configuration.
#[derive(Clone)]
pub enum AuditStore {
    Memory(MemoryAuditStore),
    Jsonl(JsonlAuditStore),
}

impl AuditStore {
    pub fn from_config(config: &AuditConfig) -> Self {
        match &config.path {
            Some(path) => AuditStore::Jsonl(JsonlAuditStore::new(path)),
            None => AuditStore::Memory(MemoryAuditStore::new()),
        }
    }
}

impl AuditSink for AuditStore {
    async fn append(&self, record: AuditRecord) -> Result<(), AuditWriteError> {
        match self {
            AuditStore::Memory(store) => store.append(record).await,
            AuditStore::Jsonl(store) => store.append(record).await,
        }
    }
}
