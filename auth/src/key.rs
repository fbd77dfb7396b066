use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::errors::ConfigurationError;

/// Minimum key length for HS256 (256 bits).
pub const MIN_KEY_BYTES: usize = 32;

/// Symmetric signing key derived from the configured secret.
///
/// The secret is read as standard base64 first; if it is not valid base64 its
/// raw UTF-8 bytes are used instead. Either way the key must be at least
/// [`MIN_KEY_BYTES`] long. A secret that decodes as base64 but is too short is
/// rejected outright and never reinterpreted as raw text.
///
/// Decoding is strict: padding must be present, whitespace or line breaks are
/// not skipped, and trailing bits must be zero. A wrapped or non-canonical
/// base64 secret is therefore used as raw text. The chosen interpretation is
/// logged at debug level.
#[derive(Clone)]
pub struct KeyMaterial(Vec<u8>);

impl KeyMaterial {
    /// Resolve the signing key from a configured secret.
    ///
    /// # Arguments
    /// * `secret` - Configured secret, standard base64 or plain text
    ///
    /// # Returns
    /// Key material of at least 32 bytes
    ///
    /// # Errors
    /// * `MissingSecret` - Secret is empty or whitespace
    /// * `KeyTooShort` - Resulting key is shorter than 32 bytes
    pub fn resolve(secret: &str) -> Result<Self, ConfigurationError> {
        if secret.trim().is_empty() {
            return Err(ConfigurationError::MissingSecret);
        }

        let bytes = match STANDARD.decode(secret) {
            Ok(decoded) => {
                tracing::debug!(key_bytes = decoded.len(), "Signing secret read as base64");
                decoded
            }
            Err(e) => {
                tracing::debug!(
                    key_bytes = secret.len(),
                    reason = %e,
                    "Signing secret is not base64, using raw bytes"
                );
                secret.as_bytes().to_vec()
            }
        };

        if bytes.len() < MIN_KEY_BYTES {
            return Err(ConfigurationError::KeyTooShort {
                len: bytes.len(),
                min: MIN_KEY_BYTES,
            });
        }

        Ok(Self(bytes))
    }

    /// Raw key bytes for HMAC signing and verification.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Key length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyMaterial([REDACTED; {} bytes])", self.0.len())
    }
}
