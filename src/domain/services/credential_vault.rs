//! AES-256-GCM vault for tenant provider API keys.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

use crate::error::AppError;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("encryption key must decode to exactly 32 bytes")]
    InvalidKey,
    #[error("ciphertext failed integrity check")]
    Integrity,
    #[error("AES-GCM encrypt: {0}")]
    Encrypt(String),
}

impl From<VaultError> for AppError {
    fn from(err: VaultError) -> Self {
        match err {
            VaultError::Integrity => AppError::CredentialDecryption,
            other => AppError::InternalWithMsg(other.to_string()),
        }
    }
}

/// Holds one symmetric key for its lifetime. A single instance is built at
/// bootstrap and injected through app state; tests construct their own so no
/// key leaks between them. Key material, plaintext, and ciphertext are never
/// logged.
pub struct CredentialVault {
    cipher: Aes256Gcm,
}

impl CredentialVault {
    pub fn from_key(key: [u8; 32]) -> Self {
        Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key)),
        }
    }

    pub fn from_base64(encoded: &str) -> Result<Self, VaultError> {
        let bytes = STANDARD.decode(encoded).map_err(|_| VaultError::InvalidKey)?;
        let key: [u8; 32] = bytes.try_into().map_err(|_| VaultError::InvalidKey)?;
        Ok(Self::from_key(key))
    }

    /// Fresh random key for this process run. Ciphertext persisted under a
    /// generated key is unreadable after restart, so this is only suitable
    /// for non-persistent deployments.
    pub fn generate() -> Self {
        let mut key = [0u8; 32];
        OsRng.fill_bytes(&mut key);
        Self::from_key(key)
    }

    /// Returns `base64(nonce || ciphertext || tag)`. The empty string is the
    /// "no credential" sentinel and passes through untouched.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, VaultError> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }

        let mut nonce_bytes = [0u8; 12];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| VaultError::Encrypt(e.to_string()))?;

        let mut combined = nonce_bytes.to_vec();
        combined.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(combined))
    }

    /// Inverse of [`CredentialVault::encrypt`]. Malformed, truncated,
    /// tampered, or foreign-key input all fail with
    /// [`VaultError::Integrity`].
    pub fn decrypt(&self, encoded: &str) -> Result<String, VaultError> {
        if encoded.is_empty() {
            return Ok(String::new());
        }

        let combined = STANDARD.decode(encoded).map_err(|_| VaultError::Integrity)?;
        if combined.len() < 13 {
            return Err(VaultError::Integrity);
        }

        let (nonce_bytes, ciphertext) = combined.split_at(12);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| VaultError::Integrity)?;

        String::from_utf8(plaintext).map_err(|_| VaultError::Integrity)
    }
}
