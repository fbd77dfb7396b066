use jsonwebtoken::errors::Error as JsonWebTokenError;
use jsonwebtoken::errors::ErrorKind;
use thiserror::Error;

/// Error type for token issuance.
#[derive(Debug, Clone, Error)]
pub enum IssueError {
    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Token expiry is out of the representable time range")]
    ExpiryOutOfRange,
}

/// Reason a presented token was rejected.
///
/// Every variant means "reject the request"; none is retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationFailure {
    #[error("Token signature is invalid")]
    BadSignature,

    #[error("Token is malformed: {0}")]
    Malformed(String),

    #[error("Token issuer does not match")]
    IssuerMismatch,

    #[error("Token audience does not match")]
    AudienceMismatch,

    #[error("Token is expired")]
    Expired,

    #[error("Token is not valid yet")]
    NotYetValid,
}

impl From<JsonWebTokenError> for ValidationFailure {
    fn from(e: JsonWebTokenError) -> Self {
        match e.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                ValidationFailure::BadSignature
            }
            ErrorKind::InvalidIssuer => ValidationFailure::IssuerMismatch,
            ErrorKind::InvalidAudience => ValidationFailure::AudienceMismatch,
            ErrorKind::ExpiredSignature => ValidationFailure::Expired,
            ErrorKind::ImmatureSignature => ValidationFailure::NotYetValid,
            _ => ValidationFailure::Malformed(e.to_string()),
        }
    }
}
