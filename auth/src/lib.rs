//! Bearer credentials and password hashing
//!
//! Provides the authentication core consumed by login flows and
//! authorization middleware:
//! - Signing key resolution from a configured secret (base64 or raw text)
//! - HS256 access token issuance and validation with zero clock skew
//! - Argon2id password hashing with detection of outdated records
//! - Authentication coordination (login, token reissue)
//!
//! Time always comes from an injected [`Clock`], so issuance and expiry are
//! deterministic under test.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::{PasswordHasher, PasswordVerdict};
//!
//! let hasher = PasswordHasher::new();
//! let record = hasher.hash("my_password").unwrap();
//! assert_eq!(hasher.verify(&record, "my_password"), PasswordVerdict::Match);
//! assert_eq!(hasher.verify(&record, "wrong"), PasswordVerdict::NoMatch);
//! ```
//!
//! ## JWT Tokens
//! ```
//! use std::sync::Arc;
//! use auth::{Identity, SigningConfig, SystemClock, TokenIssuer, TokenValidator};
//!
//! let config = SigningConfig::new(
//!     "Exercise:Backend",
//!     "Exercise:Frontend",
//!     "secret_key_at_least_32_bytes_long!",
//!     60,
//! );
//! let issuer = TokenIssuer::new(config.clone(), Arc::new(SystemClock)).unwrap();
//! let validator = TokenValidator::new(config, Arc::new(SystemClock)).unwrap();
//!
//! let identity = Identity::new("u1", "alice", "alice@example.com");
//! let issued = issuer.issue(&identity, None).unwrap();
//! let claims = validator.validate(&issued.token, true).unwrap();
//! assert_eq!(claims.subject(), Some("u1"));
//! ```
//!
//! ## Complete Authentication Flow
//! ```
//! use std::sync::Arc;
//! use auth::{Authenticator, HasherSettings, Identity, SigningConfig, SystemClock};
//!
//! let auth = Authenticator::new(
//!     SigningConfig::new("", "", "secret_key_at_least_32_bytes_long!", 60),
//!     &HasherSettings::default(),
//!     Arc::new(SystemClock),
//! )
//! .unwrap();
//!
//! // Register: hash password
//! let record = auth.hash_password("password123").unwrap();
//!
//! // Login: verify and issue a token
//! let identity = Identity::new("u1", "alice", "alice@example.com");
//! let result = auth.authenticate("password123", &record, &identity, None).unwrap();
//! if let Some(replacement) = result.rehashed {
//!     // persist `replacement` in place of `record`
//! #   let _ = replacement;
//! }
//!
//! // Authorize a request
//! let claims = auth.validate_token(&result.token.token).unwrap();
//! assert_eq!(claims.subject(), Some("u1"));
//! ```

pub mod authenticator;
pub mod clock;
pub mod config;
pub mod errors;
pub mod identity;
pub mod jwt;
pub mod key;
pub mod password;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::AuthenticationResult;
pub use authenticator::Authenticator;
pub use clock::Clock;
pub use clock::ManualClock;
pub use clock::SystemClock;
pub use config::HasherSettings;
pub use config::SigningConfig;
pub use errors::ConfigurationError;
pub use identity::Identity;
pub use jwt::Claims;
pub use jwt::ExtraClaims;
pub use jwt::IssueError;
pub use jwt::IssuedToken;
pub use jwt::TokenIssuer;
pub use jwt::TokenValidator;
pub use jwt::ValidationFailure;
pub use key::KeyMaterial;
pub use password::HashRecord;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use password::PasswordVerdict;
