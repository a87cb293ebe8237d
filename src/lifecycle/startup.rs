//! Startup orchestration.
//!
//! Subsystems initialize in dependency order and any failure is fatal: the
//! service never starts without a usable encryption key.

use std::sync::Arc;

use thiserror::Error;

use crate::audit::{AuditStore, AuditWriter};
use crate::auth::{AuthGuard, TokenSessions};
use crate::clock::{Clock, SystemClock};
use crate::config::VaultConfig;
use crate::crypto::{ConfiguredKey, Envelope, EnvelopeError};
use crate::http::AppState;
use crate::notes::{MemoryNoteStore, SessionNoteService, StoreError};
use crate::security::{RateLimitPolicy, RateLimiter};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("encryption key unavailable: {0}")]
    Key(#[from] EnvelopeError),

    #[error("could not open note store: {0}")]
    Store(#[from] StoreError),
}

/// Everything `main` needs after wiring.
pub struct Services {
    pub state: AppState,
    /// Shared with the envelope; swapped on config reload.
    pub key: Arc<ConfiguredKey>,
    pub limiter: RateLimiter,
}

pub async fn bootstrap(config: &VaultConfig) -> Result<Services, StartupError> {
    bootstrap_with_clock(config, Arc::new(SystemClock)).await
}

/// Wire all subsystems against an explicit clock.
pub async fn bootstrap_with_clock(
    config: &VaultConfig,
    clock: Arc<dyn Clock>,
) -> Result<Services, StartupError> {
    let key = Arc::new(ConfiguredKey::from_config(&config.encryption));
    let envelope = Envelope::new(key.clone());
    envelope.verify_key()?;
    tracing::info!("Encryption key loaded");

    let store = match &config.storage.notes_path {
        Some(path) => MemoryNoteStore::load_from_file(path).await?,
        None => {
            tracing::warn!("No storage.notes_path configured, notes are kept in memory only");
            MemoryNoteStore::new()
        }
    };

    let audit_store = AuditStore::from_config(&config.audit);
    if matches!(audit_store, AuditStore::Memory(_)) {
        tracing::warn!("No audit.path configured, audit records are kept in memory only");
    }

    let notes = SessionNoteService::new(
        store,
        envelope,
        AuditWriter::new(audit_store.clone(), clock.clone()),
        clock.clone(),
    )
    .with_page_size(config.storage.page_size);

    let limiter = RateLimiter::in_memory(RateLimitPolicy::from(&config.rate_limit), clock.clone());
    let guard = AuthGuard::new(
        TokenSessions::from_accounts(&config.accounts),
        limiter.clone(),
        AuditWriter::new(audit_store, clock.clone()),
    )
    .with_rate_limit(config.rate_limit.enabled);

    tracing::info!(
        accounts = config.accounts.len(),
        rate_limit = config.rate_limit.enabled,
        "Services initialized"
    );

    Ok(Services {
        state: AppState {
            notes: Arc::new(notes),
            guard: Arc::new(guard),
            clock,
        },
        key,
        limiter,
    })
}
