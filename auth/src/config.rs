use std::fmt;

use argon2::Params;
use chrono::Duration;
use serde::Deserialize;

use crate::errors::ConfigurationError;

/// Longest accepted token lifetime (ten years).
pub const MAX_EXPIRES_IN_MINUTES: i64 = 60 * 24 * 365 * 10;

fn default_expires_in_minutes() -> i64 {
    60
}

/// Token signing settings, loaded once at startup.
///
/// Empty `issuer` or `audience` disables the corresponding check on validation
/// and omits the claim on issuance.
#[derive(Clone, Deserialize)]
pub struct SigningConfig {
    #[serde(default)]
    pub issuer: String,

    #[serde(default)]
    pub audience: String,

    pub secret_key: String,

    #[serde(default = "default_expires_in_minutes")]
    pub expires_in_minutes: i64,
}

impl SigningConfig {
    pub fn new(
        issuer: impl Into<String>,
        audience: impl Into<String>,
        secret_key: impl Into<String>,
        expires_in_minutes: i64,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
            secret_key: secret_key.into(),
            expires_in_minutes,
        }
    }

    /// Token lifetime.
    ///
    /// # Returns
    /// `expires_in_minutes` as a duration
    ///
    /// # Errors
    /// * `InvalidExpiry` - Lifetime is not in `1..=MAX_EXPIRES_IN_MINUTES`
    pub fn lifetime(&self) -> Result<Duration, ConfigurationError> {
        if !(1..=MAX_EXPIRES_IN_MINUTES).contains(&self.expires_in_minutes) {
            return Err(ConfigurationError::InvalidExpiry(self.expires_in_minutes));
        }
        Duration::try_minutes(self.expires_in_minutes)
            .ok_or(ConfigurationError::InvalidExpiry(self.expires_in_minutes))
    }
}

impl fmt::Debug for SigningConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningConfig")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("secret_key", &"[REDACTED]")
            .field("expires_in_minutes", &self.expires_in_minutes)
            .finish()
    }
}

/// Argon2id cost settings for new password records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HasherSettings {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes
    pub iterations: u32,
    /// Degree of parallelism
    pub parallelism: u32,
}

impl HasherSettings {
    pub(crate) fn to_params(self) -> Result<Params, ConfigurationError> {
        Params::new(
            self.memory_kib,
            self.iterations,
            self.parallelism,
            Some(Params::DEFAULT_OUTPUT_LEN),
        )
        .map_err(|e| ConfigurationError::InvalidHasherSettings(e.to_string()))
    }
}

impl Default for HasherSettings {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}
