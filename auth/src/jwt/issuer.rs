use std::fmt;
use std::sync::Arc;

use chrono::DateTime;
use chrono::Duration;
use chrono::SubsecRound;
use chrono::Utc;
use uuid::Uuid;

use super::claims::Claims;
use super::claims::ExtraClaims;
use super::errors::IssueError;
use super::handler::JwtHandler;
use crate::clock::Clock;
use crate::config::SigningConfig;
use crate::errors::ConfigurationError;
use crate::identity::Identity;
use crate::key::KeyMaterial;

/// A freshly minted access token and the times embedded in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub token_id: String,
    pub subject: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl IssuedToken {
    /// True while `now` is before the expiry (zero skew).
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

impl fmt::Display for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let preview: String = self.token.chars().take(16).collect();
        let ellipsis = if self.token.chars().count() > 16 { "..." } else { "" };
        write!(
            f,
            "TokenId={}, Subject={}, Token={}{}, IssuedAt={}, ExpiresAt={}",
            self.token_id,
            self.subject,
            preview,
            ellipsis,
            self.issued_at.to_rfc3339(),
            self.expires_at.to_rfc3339()
        )
    }
}

/// Mints HS256 access tokens for authenticated identities.
pub struct TokenIssuer {
    handler: JwtHandler,
    issuer: String,
    audience: String,
    lifetime: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenIssuer {
    /// Create an issuer, resolving the signing key once.
    ///
    /// # Arguments
    /// * `config` - Issuer, audience, secret and lifetime
    /// * `clock` - Time source for `issue`
    ///
    /// # Errors
    /// * `MissingSecret` / `KeyTooShort` - Secret does not yield a 32-byte key
    /// * `InvalidExpiry` - Lifetime is not positive or above the ten-year cap
    pub fn new(
        config: SigningConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigurationError> {
        let lifetime = config.lifetime()?;
        let key = KeyMaterial::resolve(&config.secret_key)?;

        tracing::debug!(
            issuer = %config.issuer,
            audience = %config.audience,
            key_bytes = key.len(),
            lifetime_minutes = config.expires_in_minutes,
            "Token issuer ready"
        );

        Ok(Self {
            handler: JwtHandler::new(&key),
            issuer: config.issuer,
            audience: config.audience,
            lifetime,
            clock,
        })
    }

    /// Issue a token at the clock's current time.
    pub fn issue(
        &self,
        identity: &Identity,
        extra: Option<&ExtraClaims>,
    ) -> Result<IssuedToken, IssueError> {
        self.issue_at(identity, extra, self.clock.now())
    }

    /// Issue a token as of `now`.
    ///
    /// # Arguments
    /// * `identity` - Subject, display name and email for the base claims
    /// * `extra` - Claims appended after the base set
    /// * `now` - Issuance time
    ///
    /// # Returns
    /// The signed token with its id, subject and embedded times
    ///
    /// `now` is truncated to whole seconds so the returned times equal the
    /// ones embedded in the token.
    ///
    /// # Errors
    /// * `ExpiryOutOfRange` - `now + lifetime` is past the latest representable time
    /// * `EncodingFailed` - Claims could not be serialized
    pub fn issue_at(
        &self,
        identity: &Identity,
        extra: Option<&ExtraClaims>,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, IssueError> {
        let issued_at = now.trunc_subsecs(0);
        let expires_at = issued_at
            .checked_add_signed(self.lifetime)
            .ok_or(IssueError::ExpiryOutOfRange)?;

        let mut claims = Claims::for_identity(
            identity,
            Uuid::new_v4().simple(),
            issued_at.timestamp(),
        );
        if let Some(extra) = extra {
            claims.merge_extra(extra);
        }
        let claims = claims
            .with_lifetime(issued_at.timestamp(), expires_at.timestamp())
            .with_issuer(&self.issuer)
            .with_audience(&self.audience);

        let token = self.handler.encode(&claims)?;
        let token_id = claims.jti.unwrap_or_default();
        let subject = claims.sub.unwrap_or_default();

        tracing::debug!(
            subject = %subject,
            token_id = %token_id,
            expires_at = %expires_at,
            "Access token issued"
        );

        Ok(IssuedToken {
            token,
            token_id,
            subject,
            issued_at,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::clock::ManualClock;

    const SECRET: &str = "THIS_IS_A_DEMO_SECRET_KEY_32+_CHARS!";

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    fn issuer(config: SigningConfig) -> TokenIssuer {
        TokenIssuer::new(config, Arc::new(ManualClock::new(fixed_now()))).unwrap()
    }

    fn alice() -> Identity {
        Identity::new("u1", "alice", "alice@example.com")
    }

    fn payload(token: &str) -> serde_json::Value {
        use base64::engine::general_purpose::URL_SAFE_NO_PAD;
        use base64::Engine;

        let segment = token.split('.').nth(1).unwrap();
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(segment).unwrap()).unwrap()
    }

    #[test]
    fn test_issue_embeds_claims() {
        let issuer = issuer(SigningConfig::new(
            "Exercise:Backend",
            "Exercise:Frontend",
            SECRET,
            60,
        ));

        let issued = issuer.issue(&alice(), None).unwrap();
        let payload = payload(&issued.token);

        assert_eq!(payload["sub"], "u1");
        assert_eq!(payload["unique_name"], "alice");
        assert_eq!(payload["email"], "alice@example.com");
        assert_eq!(payload["iss"], "Exercise:Backend");
        assert_eq!(payload["aud"], "Exercise:Frontend");
        assert_eq!(payload["iat"], fixed_now().timestamp());
        assert_eq!(payload["nbf"], fixed_now().timestamp());
        assert_eq!(
            payload["exp"],
            (fixed_now() + Duration::minutes(60)).timestamp()
        );
        assert_eq!(payload["jti"], issued.token_id.as_str());
        assert_eq!(issued.token_id.len(), 32);
    }

    #[test]
    fn test_issued_token_times() {
        let issuer = issuer(SigningConfig::new("", "", SECRET, 60));

        let now = fixed_now() + Duration::milliseconds(750);
        let issued = issuer.issue_at(&alice(), None, now).unwrap();

        assert_eq!(issued.issued_at, fixed_now());
        assert_eq!(issued.expires_at, fixed_now() + Duration::minutes(60));
        assert!(issued.expires_at > issued.issued_at);
        assert!(issued.is_live(fixed_now() + Duration::minutes(59)));
        assert!(!issued.is_live(fixed_now() + Duration::minutes(60)));
    }

    #[test]
    fn test_empty_issuer_and_audience_omitted() {
        let issuer = issuer(SigningConfig::new("", "", SECRET, 60));
        let payload = payload(&issuer.issue(&alice(), None).unwrap().token);

        assert!(payload.get("iss").is_none());
        assert!(payload.get("aud").is_none());
    }

    #[test]
    fn test_token_ids_are_unique() {
        let issuer = issuer(SigningConfig::new("", "", SECRET, 60));

        let first = issuer.issue(&alice(), None).unwrap();
        let second = issuer.issue(&alice(), None).unwrap();

        assert_ne!(first.token_id, second.token_id);
        assert_ne!(first.token, second.token);
    }

    #[test]
    fn test_extra_claims_appended() {
        let issuer = issuer(SigningConfig::new("", "", SECRET, 60));
        let mut extra = ExtraClaims::new();
        extra.insert("role".to_string(), json!("admin"));
        extra.insert("exp".to_string(), json!(0));

        let issued = issuer.issue(&alice(), Some(&extra)).unwrap();
        let payload = payload(&issued.token);

        assert_eq!(payload["role"], "admin");
        assert_eq!(payload["exp"], issued.expires_at.timestamp());
    }

    #[test]
    fn test_construction_rejects_bad_config() {
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(fixed_now()));

        assert!(matches!(
            TokenIssuer::new(SigningConfig::new("", "", "short", 60), clock.clone()),
            Err(ConfigurationError::KeyTooShort { .. })
        ));
        assert!(matches!(
            TokenIssuer::new(SigningConfig::new("", "", SECRET, 0), clock.clone()),
            Err(ConfigurationError::InvalidExpiry(0))
        ));
        assert!(matches!(
            TokenIssuer::new(SigningConfig::new("", "", SECRET, i64::MAX), clock.clone()),
            Err(ConfigurationError::InvalidExpiry(i64::MAX))
        ));
        assert!(matches!(
            TokenIssuer::new(SigningConfig::new("", "", SECRET, 1_000_000_000_000), clock),
            Err(ConfigurationError::InvalidExpiry(1_000_000_000_000))
        ));
    }

    #[test]
    fn test_expiry_past_time_range_is_an_error() {
        let issuer = issuer(SigningConfig::new("", "", SECRET, 60));

        let result = issuer.issue_at(&alice(), None, DateTime::<Utc>::MAX_UTC);
        assert!(matches!(result, Err(IssueError::ExpiryOutOfRange)));
    }

    #[test]
    fn test_display_previews_token() {
        let issuer = issuer(SigningConfig::new("", "", SECRET, 60));
        let issued = issuer.issue(&alice(), None).unwrap();

        let printed = issued.to_string();
        assert!(printed.contains(&issued.token[..16]));
        assert!(!printed.contains(&issued.token));
    }
}
