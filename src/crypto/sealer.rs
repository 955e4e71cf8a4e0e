//! GitHub Actions secret sealing.
//!
//! GitHub only accepts secret values encrypted as libsodium anonymous sealed
//! boxes (`crypto_box_seal`: ephemeral X25519 + XSalsa20-Poly1305, ephemeral
//! public key prepended) under the repository's public key. Only GitHub holds
//! the matching private key, so there is intentionally no opening side here.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use crypto_box::{aead::OsRng, PublicKey, KEY_SIZE};
use serde::Deserialize;
use thiserror::Error;

use crate::crypto::Sensitive;

/// Bytes added to every sealed message: ephemeral public key + Poly1305 tag.
pub const SEAL_OVERHEAD: usize = KEY_SIZE + 16;

/// Sealing errors
#[derive(Debug, Error)]
pub enum SealError {
    #[error("Invalid repository public key: {0}")]
    InvalidPublicKey(String),

    #[error("Secret value could not be encoded for sealing")]
    Encoding,
}

/// Result type for sealing
pub type SealResult<T> = Result<T, SealError>;

/// A repository's current Actions public key, as served by GitHub.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RepoPublicKey {
    pub key_id: String,
    /// Base64 (standard alphabet) Curve25519 public key
    pub key: String,
}

/// Sealed secret ready for `PUT /repos/{owner}/{repo}/actions/secrets/{name}`.
#[derive(Debug, Clone)]
pub struct SealedSecret {
    pub name: String,
    pub encrypted_value: String,
    /// Identifier of the key used, passed through unmodified
    pub key_id: String,
}

impl RepoPublicKey {
    /// Seal a named secret under this key, carrying the key id along.
    pub fn seal_secret(&self, name: &str, value: &Sensitive) -> SealResult<SealedSecret> {
        Ok(SealedSecret {
            name: name.to_string(),
            encrypted_value: seal(value.expose(), &self.key)?,
            key_id: self.key_id.clone(),
        })
    }
}

/// Parse a base64 Curve25519 public key, enforcing the exact key length.
pub fn parse_public_key(public_key_b64: &str) -> SealResult<PublicKey> {
    let bytes = BASE64
        .decode(public_key_b64.trim())
        .map_err(|e| SealError::InvalidPublicKey(format!("invalid base64: {}", e)))?;
    let len = bytes.len();
    let key: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| {
        SealError::InvalidPublicKey(format!("expected {} bytes, got {}", KEY_SIZE, len))
    })?;
    Ok(PublicKey::from(key))
}

/// Seal a plaintext under a base64 public key; returns base64 ciphertext.
pub fn seal(plaintext: &str, recipient_public_key_b64: &str) -> SealResult<String> {
    let public_key = parse_public_key(recipient_public_key_b64)?;
    let sealed = public_key
        .seal(&mut OsRng, plaintext.as_bytes())
        .map_err(|_| SealError::Encoding)?;
    Ok(BASE64.encode(sealed))
}
