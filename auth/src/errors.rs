use thiserror::Error;

/// Fatal startup error: the owning component must not be built.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Signing secret is not configured")]
    MissingSecret,

    #[error("Signing key too short: {len} bytes, at least {min} required")]
    KeyTooShort { len: usize, min: usize },

    #[error(
        "Token lifetime must be between 1 and {max} minutes, got {0}",
        max = crate::config::MAX_EXPIRES_IN_MINUTES
    )]
    InvalidExpiry(i64),

    #[error("Invalid password hasher settings: {0}")]
    InvalidHasherSettings(String),
}
