//! AES-256-GCM sealing and opening of clinical content.

use std::sync::Arc;

use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce, Tag};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::crypto::key::{EncryptionKey, KeySource};
use crate::crypto::EnvelopeError;

/// Nonce length for AES-GCM.
pub const NONCE_LEN: usize = 12;
/// Authentication tag length for AES-GCM.
pub const TAG_LEN: usize = 16;

/// Ciphertext, nonce and authentication tag, each base64 encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPayload {
    ciphertext: String,
    nonce: String,
    auth_tag: String,
}

impl EncryptedPayload {
    /// Rebuild a payload from its stored base64 columns.
    pub fn from_parts(
        ciphertext: impl Into<String>,
        nonce: impl Into<String>,
        auth_tag: impl Into<String>,
    ) -> Self {
        Self {
            ciphertext: ciphertext.into(),
            nonce: nonce.into(),
            auth_tag: auth_tag.into(),
        }
    }

    pub fn ciphertext(&self) -> &str {
        &self.ciphertext
    }

    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    pub fn auth_tag(&self) -> &str {
        &self.auth_tag
    }
}

/// Seals and opens strings with the key supplied by a [`KeySource`].
#[derive(Clone)]
pub struct Envelope {
    keys: Arc<dyn KeySource>,
}

impl Envelope {
    pub fn new(keys: Arc<dyn KeySource>) -> Self {
        Self { keys }
    }

    /// Check that usable key material is available right now.
    pub fn verify_key(&self) -> Result<(), EnvelopeError> {
        self.keys.load().map(|_| ())
    }

    /// Encrypt `plaintext` under a freshly generated nonce.
    pub fn seal(&self, plaintext: &str) -> Result<EncryptedPayload, EnvelopeError> {
        let cipher = cipher_for(&self.keys.load()?)?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);

        let mut buffer = plaintext.as_bytes().to_vec();
        let tag = cipher
            .encrypt_in_place_detached(Nonce::from_slice(&nonce_bytes), b"", &mut buffer)
            .map_err(|_| EnvelopeError::Cipher)?;

        Ok(EncryptedPayload {
            ciphertext: BASE64.encode(&buffer),
            nonce: BASE64.encode(nonce_bytes),
            auth_tag: BASE64.encode(tag),
        })
    }

    /// Decrypt base64 `ciphertext` after verifying `auth_tag`.
    ///
    /// Anything that cannot be decoded into a well-formed nonce and tag is
    /// reported as an authentication failure.
    pub fn open(
        &self,
        ciphertext: &str,
        nonce: &str,
        auth_tag: &str,
    ) -> Result<String, EnvelopeError> {
        let cipher = cipher_for(&self.keys.load()?)?;

        let nonce = decode_exact(nonce, NONCE_LEN)?;
        let tag = decode_exact(auth_tag, TAG_LEN)?;
        let mut buffer = BASE64
            .decode(ciphertext.as_bytes())
            .map_err(|_| EnvelopeError::Authentication)?;

        cipher
            .decrypt_in_place_detached(
                Nonce::from_slice(&nonce),
                b"",
                &mut buffer,
                Tag::from_slice(&tag),
            )
            .map_err(|_| EnvelopeError::Authentication)?;

        String::from_utf8(buffer).map_err(|_| EnvelopeError::Authentication)
    }

    pub fn open_payload(&self, payload: &EncryptedPayload) -> Result<String, EnvelopeError> {
        self.open(&payload.ciphertext, &payload.nonce, &payload.auth_tag)
    }
}

fn cipher_for(key: &EncryptionKey) -> Result<Aes256Gcm, EnvelopeError> {
    Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|_| EnvelopeError::Config("key length rejected by cipher".to_string()))
}

fn decode_exact(encoded: &str, len: usize) -> Result<Vec<u8>, EnvelopeError> {
    let raw = BASE64
        .decode(encoded.as_bytes())
        .map_err(|_| EnvelopeError::Authentication)?;
    if raw.len() != len {
        return Err(EnvelopeError::Authentication);
    }
    Ok(raw)
}
