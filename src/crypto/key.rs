//! Key material resolution.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::config::schema::EncryptionConfig;
use crate::crypto::EnvelopeError;

/// Length of an AES-256 key in bytes.
pub const KEY_LEN: usize = 32;

/// A 256-bit encryption key.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKey([u8; KEY_LEN]);

impl EncryptionKey {
    /// Parse a key from its 64-character hex encoding.
    pub fn from_hex(encoded: &str) -> Result<Self, EnvelopeError> {
        if encoded.len() != KEY_LEN * 2 {
            return Err(EnvelopeError::Config(format!(
                "key must be {} hex characters, got {}",
                KEY_LEN * 2,
                encoded.len()
            )));
        }
        let decoded = hex::decode(encoded)
            .map_err(|e| EnvelopeError::Config(format!("key is not valid hex: {e}")))?;
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(&decoded);
        Ok(Self(key))
    }

    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey(<redacted>)")
    }
}

/// Anything that can hand out the current encryption key.
pub trait KeySource: Send + Sync {
    fn load(&self) -> Result<EncryptionKey, EnvelopeError>;
}

impl KeySource for EncryptionKey {
    fn load(&self) -> Result<EncryptionKey, EnvelopeError> {
        Ok(self.clone())
    }
}

/// Key taken from configuration, falling back to an environment variable.
///
/// The inline key can be swapped at runtime when the config file is reloaded.
/// Nothing is cached: each `load` re-reads the current inline value or the
/// environment.
pub struct ConfiguredKey {
    inline: ArcSwapOption<String>,
    env_var: String,
}

impl ConfiguredKey {
    pub fn new(inline: Option<String>, env_var: impl Into<String>) -> Self {
        Self {
            inline: ArcSwapOption::from(inline.map(Arc::new)),
            env_var: env_var.into(),
        }
    }

    pub fn from_config(config: &EncryptionConfig) -> Self {
        Self::new(config.key_hex.clone(), config.key_env.clone())
    }

    /// Replace the inline key (None falls back to the environment variable).
    pub fn replace_inline(&self, inline: Option<String>) {
        self.inline.store(inline.map(Arc::new));
    }
}

impl KeySource for ConfiguredKey {
    fn load(&self) -> Result<EncryptionKey, EnvelopeError> {
        if let Some(inline) = self.inline.load_full() {
            return EncryptionKey::from_hex(&inline);
        }
        let raw = std::env::var(&self.env_var)
            .map_err(|_| EnvelopeError::Config(format!("{} is not set", self.env_var)))?;
        // A single trailing line break is tolerated; other padding is not.
        let raw = raw.strip_suffix('\n').unwrap_or(raw.as_str());
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        EncryptionKey::from_hex(raw)
    }
}
