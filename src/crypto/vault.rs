//! Token vault: authenticated encryption of GitHub access tokens at rest.
//!
//! AES-256-GCM with a fresh random 96-bit nonce per call. Envelopes are
//! stored as `hex(nonce):hex(tag):hex(ciphertext)`.

use aes_gcm::{
    aead::{AeadCore, AeadInPlace, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce, Tag,
};
use thiserror::Error;
use zeroize::Zeroizing;

use crate::crypto::Sensitive;

pub const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const FIELD_SEPARATOR: char = ':';

/// Token vault errors
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Vault key misconfigured: {0}")]
    Configuration(String),

    #[error("Malformed ciphertext envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Ciphertext failed authentication (tampered or wrong key)")]
    AuthenticationFailure,

    #[error("Encryption failed: {0}")]
    EncryptionFailure(String),
}

/// Result type for vault operations
pub type VaultResult<T> = Result<T, VaultError>;

/// Symmetric vault keyed once at startup and shared read-only afterwards.
pub struct TokenVault {
    cipher: Aes256Gcm,
}

impl TokenVault {
    pub fn new(key: [u8; KEY_LEN]) -> Self {
        let key = Zeroizing::new(key);
        Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_slice())),
        }
    }

    /// Build a vault from a 64-character hex key.
    pub fn from_hex(key_hex: &str) -> VaultResult<Self> {
        let bytes = Zeroizing::new(
            hex::decode(key_hex.trim())
                .map_err(|e| VaultError::Configuration(format!("key is not valid hex: {}", e)))?,
        );
        let key: [u8; KEY_LEN] = bytes.as_slice().try_into().map_err(|_| {
            VaultError::Configuration(format!(
                "key must be {} bytes ({} hex chars), got {} bytes",
                KEY_LEN,
                KEY_LEN * 2,
                bytes.len()
            ))
        })?;
        Ok(Self::new(key))
    }

    /// Encrypt a plaintext into a self-describing envelope.
    pub fn encrypt(&self, plaintext: &str) -> VaultResult<String> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let mut buffer = plaintext.as_bytes().to_vec();
        let tag = self
            .cipher
            .encrypt_in_place_detached(&nonce, b"", &mut buffer)
            .map_err(|_| VaultError::EncryptionFailure("plaintext too long to encrypt".into()))?;

        Ok(format!(
            "{}{sep}{}{sep}{}",
            hex::encode(nonce),
            hex::encode(tag),
            hex::encode(&buffer),
            sep = FIELD_SEPARATOR
        ))
    }

    /// Decrypt an envelope produced by [`TokenVault::encrypt`].
    ///
    /// Fails loudly on any parse problem or tag mismatch; never returns
    /// partially recovered plaintext.
    pub fn decrypt(&self, envelope: &str) -> VaultResult<Sensitive> {
        let (nonce_bytes, tag_bytes, mut buffer) = parse_envelope(envelope)?;

        let nonce = Nonce::from_slice(&nonce_bytes);
        let tag = Tag::from_slice(&tag_bytes);
        self.cipher
            .decrypt_in_place_detached(nonce, b"", &mut buffer, tag)
            .map_err(|_| VaultError::AuthenticationFailure)?;

        String::from_utf8(buffer)
            .map(Sensitive::from)
            .map_err(|_| VaultError::MalformedEnvelope("plaintext is not UTF-8".into()))
    }
}

impl std::fmt::Debug for TokenVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVault").finish_non_exhaustive()
    }
}

fn parse_envelope(envelope: &str) -> VaultResult<(Vec<u8>, Vec<u8>, Vec<u8>)> {
    let fields: Vec<&str> = envelope.split(FIELD_SEPARATOR).collect();
    let [nonce_hex, tag_hex, ciphertext_hex] = fields.as_slice() else {
        return Err(VaultError::MalformedEnvelope(format!(
            "expected 3 fields, found {}",
            fields.len()
        )));
    };
    if nonce_hex.is_empty() || tag_hex.is_empty() {
        return Err(VaultError::MalformedEnvelope("missing nonce or tag".into()));
    }

    let nonce = decode_field("nonce", nonce_hex)?;
    let tag = decode_field("tag", tag_hex)?;
    let ciphertext = decode_field("ciphertext", ciphertext_hex)?;

    if nonce.len() != NONCE_LEN {
        return Err(VaultError::MalformedEnvelope(format!(
            "nonce must be {} bytes, got {}",
            NONCE_LEN,
            nonce.len()
        )));
    }
    if tag.len() != TAG_LEN {
        return Err(VaultError::MalformedEnvelope(format!(
            "tag must be {} bytes, got {}",
            TAG_LEN,
            tag.len()
        )));
    }

    Ok((nonce, tag, ciphertext))
}

fn decode_field(name: &str, value: &str) -> VaultResult<Vec<u8>> {
    hex::decode(value)
        .map_err(|e| VaultError::MalformedEnvelope(format!("{} is not valid hex: {}", name, e)))
}
