//! Token encryption at rest
//!
//! Access and refresh tokens are encrypted with AES-256-GCM under a key
//! derived from a deployment-provided pepper. When no pepper source is
//! available the cipher runs in an explicit degraded mode (reversible
//! base64 only); callers must construct that mode deliberately and are
//! expected to surface a warning.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use anyhow::{Result, anyhow};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use sha2::{Digest, Sha256};

/// AES-GCM nonce length in bytes
const NONCE_LEN: usize = 12;

/// Cipher for token material persisted in the settings store
#[derive(Clone)]
pub enum TokenCipher {
    /// AES-256-GCM with a key derived from a pepper
    Keyed(Box<Key<Aes256Gcm>>),
    /// No secure key source available; values are only base64 encoded.
    /// Reversible by anyone with read access to the store.
    Degraded,
}

impl TokenCipher {
    /// Create a keyed cipher from a pepper string
    pub fn keyed(pepper: &str) -> Self {
        Self::Keyed(Box::new(derive_key(pepper)))
    }

    /// Create the degraded (encoding-only) cipher.
    ///
    /// This is a deliberate opt-in; the caller owns making the
    /// degradation observable to the operator.
    pub fn degraded() -> Self {
        Self::Degraded
    }

    /// Whether this cipher provides real encryption
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded)
    }

    /// Encrypt (or encode) a plaintext token for storage
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        match self {
            Self::Keyed(key) => {
                let cipher = Aes256Gcm::new(key);
                let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
                let ciphertext = cipher
                    .encrypt(&nonce, plaintext.as_bytes())
                    .map_err(|e| anyhow!("encryption failed: {}", e))?;

                // Nonce is prepended so decrypt is self-contained
                let mut combined = nonce.to_vec();
                combined.extend_from_slice(&ciphertext);
                Ok(BASE64.encode(&combined))
            }
            Self::Degraded => Ok(BASE64.encode(plaintext.as_bytes())),
        }
    }

    /// Decrypt (or decode) a stored token
    pub fn decrypt(&self, stored: &str) -> Result<String> {
        let raw = BASE64
            .decode(stored)
            .map_err(|e| anyhow!("base64 decode failed: {}", e))?;

        match self {
            Self::Keyed(key) => {
                if raw.len() < NONCE_LEN {
                    return Err(anyhow!("stored token too short"));
                }
                let (nonce_bytes, ciphertext) = raw.split_at(NONCE_LEN);
                let nonce = Nonce::from_slice(nonce_bytes);
                let cipher = Aes256Gcm::new(key);
                let plaintext = cipher
                    .decrypt(nonce, ciphertext)
                    .map_err(|e| anyhow!("decryption failed: {}", e))?;
                Ok(String::from_utf8(plaintext)?)
            }
            Self::Degraded => Ok(String::from_utf8(raw)?),
        }
    }
}

/// Derive a 256-bit key from the pepper
fn derive_key(pepper: &str) -> Key<Aes256Gcm> {
    let mut hasher = Sha256::new();
    hasher.update(pepper.as_bytes());
    let digest = hasher.finalize();
    let mut key = Key::<Aes256Gcm>::default();
    key.copy_from_slice(&digest);
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyed_roundtrip() {
        let cipher = TokenCipher::keyed("unit-test-pepper");
        let encrypted = cipher.encrypt("tok1").unwrap();
        assert_ne!(encrypted, "tok1");
        assert_eq!(cipher.decrypt(&encrypted).unwrap(), "tok1");
    }

    #[test]
    fn test_keyed_nonce_varies() {
        let cipher = TokenCipher::keyed("unit-test-pepper");
        let a = cipher.encrypt("tok1").unwrap();
        let b = cipher.encrypt("tok1").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_degraded_roundtrip() {
        let cipher = TokenCipher::degraded();
        assert!(cipher.is_degraded());
        let encoded = cipher.encrypt("tok1").unwrap();
        assert_eq!(cipher.decrypt(&encoded).unwrap(), "tok1");
    }

    #[test]
    fn test_wrong_key_fails() {
        let cipher = TokenCipher::keyed("pepper-a");
        let encrypted = cipher.encrypt("tok1").unwrap();
        let other = TokenCipher::keyed("pepper-b");
        assert!(other.decrypt(&encrypted).is_err());
    }

    #[test]
    fn test_garbage_input_fails() {
        let cipher = TokenCipher::keyed("pepper");
        assert!(cipher.decrypt("not base64 at all!!!").is_err());
        assert!(cipher.decrypt("AAAA").is_err());
    }
}
