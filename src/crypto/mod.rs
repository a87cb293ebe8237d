//! Field-level encryption for clinical content.
//!
//! # Data Flow
//! ```text
//! plaintext (UTF-8)
//!     → key.rs (resolve the current 32-byte key from config or env)
//!     → envelope.rs (AES-256-GCM, fresh 12-byte nonce per seal)
//!     → EncryptedPayload {ciphertext, nonce, auth_tag} (base64)
//!     → stored inside a SessionNote
//! ```
//!
//! # Design Decisions
//! - The key is resolved on every call so a rotated key applies immediately
//! - A tag mismatch is a hard error, never a best-effort decode
//! - Payload fields are private; only the envelope produces them

pub mod envelope;
pub mod key;

use thiserror::Error;

pub use envelope::{EncryptedPayload, Envelope};
pub use key::{ConfiguredKey, EncryptionKey, KeySource};

/// Errors produced by the encryption envelope.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// Key material is missing or malformed.
    #[error("encryption key misconfigured: {0}")]
    Config(String),

    /// The authentication tag did not verify (tampering, corruption or wrong key).
    #[error("encrypted payload failed authentication")]
    Authentication,

    /// The cipher refused to process the input.
    #[error("cipher operation failed")]
    Cipher,
}
