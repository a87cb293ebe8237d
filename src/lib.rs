//! Encrypted clinical session notes.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http (axum, request id, limits)
//!                        │
//!                        ▼
//!                     auth (rate limit per client, bearer token → Principal)
//!                        │
//!                        ▼
//!                     notes::SessionNoteService
//!                        │  security::access_control (role set, owner-or-admin)
//!                        │  crypto::Envelope (AES-256-GCM, fresh nonce)
//!                        │  notes::NoteStore (all-or-nothing writes)
//!                        ▼
//!                     audit::AuditWriter (after persistence, never fails the caller)
//!
//!     Cross-cutting: config (TOML + hot reload), observability (tracing, metrics),
//!     lifecycle (startup, signals, shutdown), clock (injectable time)
//! ```

// Core domain
pub mod audit;
pub mod clock;
pub mod crypto;
pub mod notes;
pub mod security;

// Service surface
pub mod auth;
pub mod http;
pub mod net;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::VaultConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use notes::SessionNoteService;
