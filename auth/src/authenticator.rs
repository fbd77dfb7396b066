use std::sync::Arc;

use crate::clock::Clock;
use crate::config::HasherSettings;
use crate::config::SigningConfig;
use crate::errors::ConfigurationError;
use crate::identity::Identity;
use crate::jwt::Claims;
use crate::jwt::ExtraClaims;
use crate::jwt::IssueError;
use crate::jwt::IssuedToken;
use crate::jwt::TokenIssuer;
use crate::jwt::TokenValidator;
use crate::jwt::ValidationFailure;
use crate::password::HashRecord;
use crate::password::PasswordError;
use crate::password::PasswordHasher;
use crate::password::PasswordVerdict;

/// Authentication coordinator combining password verification and JWT generation.
///
/// Provides the login and token refresh flows on top of the hasher, issuer and
/// validator. It never writes to a user store: a replacement password record
/// is handed back to the caller to persist.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    token_issuer: TokenIssuer,
    token_validator: TokenValidator,
}

/// Result of successful authentication.
#[derive(Debug)]
pub struct AuthenticationResult {
    /// JWT access token
    pub token: IssuedToken,

    /// Replacement for a weak stored record, to be persisted by the caller
    pub rehashed: Option<HashRecord>,
}

/// Authentication operation errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token does not carry a complete identity")]
    IncompleteClaims,

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("Token issue error: {0}")]
    IssueError(#[from] IssueError),

    #[error("Token validation error: {0}")]
    ValidationFailure(#[from] ValidationFailure),
}

impl Authenticator {
    /// Create a new authenticator.
    ///
    /// # Errors
    /// * `ConfigurationError` - Signing or hashing settings are unusable
    pub fn new(
        signing: SigningConfig,
        hashing: &HasherSettings,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigurationError> {
        Ok(Self {
            password_hasher: PasswordHasher::with_settings(hashing)?,
            token_issuer: TokenIssuer::new(signing.clone(), Arc::clone(&clock))?,
            token_validator: TokenValidator::new(signing, clock)?,
        })
    }

    /// Hash a password for storage.
    pub fn hash_password(&self, password: &str) -> Result<HashRecord, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Verify a password against a stored record.
    pub fn verify_password(&self, stored: impl AsRef<str>, password: &str) -> PasswordVerdict {
        self.password_hasher.verify(stored, password)
    }

    /// Verify credentials and issue an access token.
    ///
    /// # Arguments
    /// * `password` - Plaintext password from the login request
    /// * `stored` - Record held by the user store
    /// * `identity` - User the token is issued for
    /// * `extra` - Additional claims for the token
    ///
    /// # Returns
    /// The token, plus a replacement record when the stored one is weak
    ///
    /// # Errors
    /// * `InvalidCredentials` - Password does not match
    /// * `PasswordError` - Re-hashing a weak record failed
    /// * `IssueError` - Token generation failed
    pub fn authenticate(
        &self,
        password: &str,
        stored: impl AsRef<str>,
        identity: &Identity,
        extra: Option<&ExtraClaims>,
    ) -> Result<AuthenticationResult, AuthenticationError> {
        let rehashed = match self.password_hasher.verify(stored, password) {
            PasswordVerdict::NoMatch => return Err(AuthenticationError::InvalidCredentials),
            PasswordVerdict::Match => None,
            PasswordVerdict::MatchButWeak => {
                tracing::warn!(subject = %identity.id, "Stored password record is outdated, re-hashing");
                Some(self.password_hasher.hash(password)?)
            }
        };

        let token = self.token_issuer.issue(identity, extra)?;

        Ok(AuthenticationResult { token, rehashed })
    }

    /// Issue a token without password verification.
    ///
    /// Useful when authentication has already been verified by other means.
    pub fn generate_token(
        &self,
        identity: &Identity,
        extra: Option<&ExtraClaims>,
    ) -> Result<IssuedToken, IssueError> {
        self.token_issuer.issue(identity, extra)
    }

    /// Validate a token for request authorization (expiry enforced).
    pub fn validate_token(&self, token: &str) -> Result<Claims, ValidationFailure> {
        self.token_validator.validate(token, true)
    }

    /// Validate a token without the time window, e.g. to read an expired token.
    pub fn validate_expired_token(&self, token: &str) -> Result<Claims, ValidationFailure> {
        self.token_validator.validate(token, false)
    }

    /// Issue a fresh token for the identity of a possibly expired one.
    ///
    /// The old token must still carry a valid signature, issuer and audience.
    /// Non-registered extra claims are carried over.
    ///
    /// # Errors
    /// * `ValidationFailure` - Token is not one of ours
    /// * `IncompleteClaims` - Token lacks subject, display name or email
    pub fn reissue_token(&self, token: &str) -> Result<IssuedToken, AuthenticationError> {
        let claims = self.validate_expired_token(token)?;
        let identity = claims
            .identity()
            .ok_or(AuthenticationError::IncompleteClaims)?;

        let extra = (!claims.extra.is_empty()).then_some(&claims.extra);
        Ok(self.token_issuer.issue(&identity, extra)?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use chrono::TimeZone;
    use chrono::Utc;
    use serde_json::json;

    use super::*;
    use crate::clock::ManualClock;

    fn setup() -> (Authenticator, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        ));
        let authenticator = Authenticator::new(
            SigningConfig::new(
                "Exercise:Backend",
                "Exercise:Frontend",
                "test_secret_key_at_least_32_bytes!",
                60,
            ),
            &HasherSettings {
                memory_kib: 1024,
                iterations: 2,
                parallelism: 1,
            },
            clock.clone(),
        )
        .expect("Invalid configuration");
        (authenticator, clock)
    }

    fn alice() -> Identity {
        Identity::new("user123", "alice", "alice@example.com")
    }

    #[test]
    fn test_authenticate_success() {
        let (authenticator, _) = setup();

        let hash = authenticator
            .hash_password("my_password")
            .expect("Failed to hash password");

        let result = authenticator
            .authenticate("my_password", &hash, &alice(), None)
            .expect("Authentication failed");

        assert!(result.rehashed.is_none());
        let decoded = authenticator
            .validate_token(&result.token.token)
            .expect("Token validation failed");
        assert_eq!(decoded.subject(), Some("user123"));
    }

    #[test]
    fn test_authenticate_invalid_password() {
        let (authenticator, _) = setup();
        let hash = authenticator.hash_password("my_password").unwrap();

        let result = authenticator.authenticate("wrong_password", &hash, &alice(), None);
        assert!(matches!(
            result,
            Err(AuthenticationError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_authenticate_weak_record_returns_replacement() {
        let (authenticator, _) = setup();
        let legacy = crate::password::legacy::tests::identity_v2_record("my_password");

        let result = authenticator
            .authenticate("my_password", &legacy, &alice(), None)
            .expect("Authentication failed");

        let replacement = result.rehashed.expect("Expected a replacement record");
        assert!(replacement.as_str().starts_with("$argon2id$"));
        assert_eq!(
            authenticator.verify_password(&replacement, "my_password"),
            PasswordVerdict::Match
        );
    }

    #[test]
    fn test_reissue_from_expired_token() {
        let (authenticator, clock) = setup();
        let mut extra = ExtraClaims::new();
        extra.insert("role".to_string(), json!("admin"));
        let hash = authenticator.hash_password("my_password").unwrap();
        let first = authenticator
            .authenticate("my_password", &hash, &alice(), Some(&extra))
            .unwrap()
            .token;

        clock.advance(Duration::minutes(61));
        assert_eq!(
            authenticator.validate_token(&first.token).unwrap_err(),
            ValidationFailure::Expired
        );

        let second = authenticator.reissue_token(&first.token).unwrap();
        assert_eq!(second.subject, "user123");
        assert_ne!(second.token_id, first.token_id);

        let claims = authenticator.validate_token(&second.token).unwrap();
        assert_eq!(claims.display_name(), Some("alice"));
        assert_eq!(claims.get("role"), Some(&json!("admin")));
    }

    #[test]
    fn test_reissue_rejects_foreign_token() {
        let (authenticator, _) = setup();

        let result = authenticator.reissue_token("invalid.token.here");
        assert!(matches!(
            result,
            Err(AuthenticationError::ValidationFailure(
                ValidationFailure::Malformed(_)
            ))
        ));
    }
}
