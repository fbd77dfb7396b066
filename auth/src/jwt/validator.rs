use std::sync::Arc;

use chrono::DateTime;
use chrono::Utc;

use super::claims::Claims;
use super::errors::ValidationFailure;
use super::handler::JwtHandler;
use crate::clock::Clock;
use crate::config::SigningConfig;
use crate::errors::ConfigurationError;
use crate::key::KeyMaterial;

/// Verifies access tokens and extracts their claims.
///
/// Checks run in a fixed order: signature, issuer, audience, then (strict mode
/// only) the `[nbf, exp)` window with zero clock skew.
pub struct TokenValidator {
    handler: JwtHandler,
    issuer: String,
    audience: String,
    clock: Arc<dyn Clock>,
}

impl TokenValidator {
    /// Create a validator, resolving the signing key once.
    ///
    /// # Errors
    /// * `MissingSecret` / `KeyTooShort` - Secret does not yield a 32-byte key
    pub fn new(config: SigningConfig, clock: Arc<dyn Clock>) -> Result<Self, ConfigurationError> {
        let key = KeyMaterial::resolve(&config.secret_key)?;

        Ok(Self {
            handler: JwtHandler::new(&key),
            issuer: config.issuer,
            audience: config.audience,
            clock,
        })
    }

    /// Validate at the clock's current time.
    ///
    /// With `check_expiry == false` (lenient mode) the time window is skipped,
    /// which lets a refresh flow read the subject of an expired token. The
    /// signature, issuer and audience are enforced in both modes.
    pub fn validate(&self, token: &str, check_expiry: bool) -> Result<Claims, ValidationFailure> {
        self.validate_at(token, check_expiry, self.clock.now())
    }

    /// Validate as of `now`.
    ///
    /// # Arguments
    /// * `token` - JWT token string
    /// * `check_expiry` - Enforce the `[nbf, exp)` window (strict mode)
    /// * `now` - Time the window is checked against
    ///
    /// # Returns
    /// The token's claims
    ///
    /// # Errors
    /// * `Malformed` - Not a three-segment JWT, undecodable, or no `exp` in strict mode
    /// * `BadSignature` - Signature does not verify under the configured key
    /// * `IssuerMismatch` / `AudienceMismatch` - Claim differs from configuration
    /// * `Expired` - `now >= exp`
    /// * `NotYetValid` - `now < nbf`
    pub fn validate_at(
        &self,
        token: &str,
        check_expiry: bool,
        now: DateTime<Utc>,
    ) -> Result<Claims, ValidationFailure> {
        let result = self.check(token, check_expiry, now.timestamp());

        if let Err(failure) = &result {
            tracing::debug!(reason = %failure, check_expiry, "Token rejected");
        }

        result
    }

    fn check(&self, token: &str, check_expiry: bool, now: i64) -> Result<Claims, ValidationFailure> {
        let claims = self.handler.decode(token)?;

        if !self.issuer.is_empty() && claims.iss.as_deref() != Some(self.issuer.as_str()) {
            return Err(ValidationFailure::IssuerMismatch);
        }

        if !self.audience.is_empty()
            && !claims
                .aud
                .as_ref()
                .is_some_and(|aud| aud.contains(&self.audience))
        {
            return Err(ValidationFailure::AudienceMismatch);
        }

        if check_expiry {
            let exp = claims
                .exp
                .ok_or_else(|| ValidationFailure::Malformed("missing exp claim".to_string()))?;
            if now >= exp {
                return Err(ValidationFailure::Expired);
            }
            if claims.nbf.is_some_and(|nbf| now < nbf) {
                return Err(ValidationFailure::NotYetValid);
            }
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use chrono::TimeZone;
    use jsonwebtoken::encode;
    use jsonwebtoken::EncodingKey;
    use jsonwebtoken::Header;

    use super::*;
    use crate::clock::ManualClock;
    use crate::identity::Identity;
    use crate::jwt::claims::Audience;
    use crate::jwt::issuer::TokenIssuer;

    const SECRET: &str = "THIS_IS_A_DEMO_SECRET_KEY_32+_CHARS!";

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    fn config() -> SigningConfig {
        SigningConfig::new("Exercise:Backend", "Exercise:Frontend", SECRET, 60)
    }

    fn validator(config: SigningConfig) -> TokenValidator {
        TokenValidator::new(config, Arc::new(ManualClock::new(t0()))).unwrap()
    }

    fn issue(config: SigningConfig) -> String {
        TokenIssuer::new(config, Arc::new(ManualClock::new(t0())))
            .unwrap()
            .issue(&Identity::new("u1", "alice", "alice@example.com"), None)
            .unwrap()
            .token
    }

    fn subject_only(sub: &str) -> Claims {
        Claims {
            sub: Some(sub.to_string()),
            ..Claims::default()
        }
    }

    fn sign(claims: &Claims) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_validate_round_trip() {
        let token = issue(config());
        let claims = validator(config()).validate(&token, true).unwrap();

        assert_eq!(claims.subject(), Some("u1"));
        assert_eq!(claims.display_name(), Some("alice"));
        assert_eq!(claims.email(), Some("alice@example.com"));
    }

    #[test]
    fn test_expiry_boundary_zero_skew() {
        let token = issue(config());
        let validator = validator(config());

        let just_before = t0() + Duration::minutes(59) + Duration::seconds(59);
        assert!(validator.validate_at(&token, true, just_before).is_ok());

        let at_expiry = t0() + Duration::minutes(60);
        assert_eq!(
            validator.validate_at(&token, true, at_expiry).unwrap_err(),
            ValidationFailure::Expired
        );

        let just_after = t0() + Duration::minutes(60) + Duration::seconds(1);
        assert_eq!(
            validator.validate_at(&token, true, just_after).unwrap_err(),
            ValidationFailure::Expired
        );
    }

    #[test]
    fn test_not_yet_valid() {
        let token = issue(config());
        let result = validator(config()).validate_at(&token, true, t0() - Duration::seconds(1));
        assert_eq!(result.unwrap_err(), ValidationFailure::NotYetValid);
    }

    #[test]
    fn test_lenient_mode_skips_time_window_only() {
        let token = issue(config());
        let validator = validator(config());
        let later = t0() + Duration::minutes(61);

        let claims = validator.validate_at(&token, false, later).unwrap();
        assert_eq!(claims.subject(), Some("u1"));

        let mut other_key = config();
        other_key.secret_key = "a-completely-different-secret-key-123".to_string();
        let foreign = issue(other_key);
        assert_eq!(
            validator.validate_at(&foreign, false, later).unwrap_err(),
            ValidationFailure::BadSignature
        );

        let other_issuer = issue(SigningConfig::new(
            "Someone:Else",
            "Exercise:Frontend",
            SECRET,
            60,
        ));
        assert_eq!(
            validator.validate_at(&other_issuer, false, later).unwrap_err(),
            ValidationFailure::IssuerMismatch
        );

        let other_audience = issue(SigningConfig::new(
            "Exercise:Backend",
            "Another:Audience",
            SECRET,
            60,
        ));
        assert_eq!(
            validator.validate_at(&other_audience, false, later).unwrap_err(),
            ValidationFailure::AudienceMismatch
        );
    }

    #[test]
    fn test_issuer_mismatch() {
        let token = issue(SigningConfig::new("Someone:Else", "Exercise:Frontend", SECRET, 60));
        assert_eq!(
            validator(config()).validate(&token, true).unwrap_err(),
            ValidationFailure::IssuerMismatch
        );
    }

    #[test]
    fn test_missing_issuer_is_mismatch() {
        let token = issue(SigningConfig::new("", "Exercise:Frontend", SECRET, 60));
        assert_eq!(
            validator(config()).validate(&token, true).unwrap_err(),
            ValidationFailure::IssuerMismatch
        );
    }

    #[test]
    fn test_audience_mismatch() {
        let token = issue(config());
        let altered = SigningConfig::new("Exercise:Backend", "Exercise:Frontend/wrong", SECRET, 60);
        assert_eq!(
            validator(altered).validate(&token, true).unwrap_err(),
            ValidationFailure::AudienceMismatch
        );
    }

    #[test]
    fn test_empty_configuration_skips_issuer_and_audience() {
        let token = issue(SigningConfig::new("Someone:Else", "Another:Audience", SECRET, 60));
        let lax = validator(SigningConfig::new("", "", SECRET, 60));
        assert!(lax.validate(&token, true).is_ok());
    }

    #[test]
    fn test_audience_array_accepted() {
        let mut claims = subject_only("u1")
            .with_lifetime(t0().timestamp(), (t0() + Duration::minutes(5)).timestamp())
            .with_issuer("Exercise:Backend");
        claims.aud = Some(Audience::Multiple(vec![
            "Other".to_string(),
            "Exercise:Frontend".to_string(),
        ]));

        let token = sign(&claims);
        assert!(validator(config()).validate(&token, true).is_ok());
    }

    #[test]
    fn test_strict_mode_requires_exp() {
        let claims = subject_only("u1")
            .with_issuer("Exercise:Backend")
            .with_audience("Exercise:Frontend");
        let token = sign(&claims);
        let validator = validator(config());

        assert!(matches!(
            validator.validate(&token, true),
            Err(ValidationFailure::Malformed(_))
        ));
        assert!(validator.validate(&token, false).is_ok());
    }
}
