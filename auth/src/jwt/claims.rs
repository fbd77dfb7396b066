use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::identity::Identity;

/// Caller-supplied claims appended after the base claim set.
pub type ExtraClaims = Map<String, Value>;

/// Claims the issuer always owns; extra claims with these names are dropped.
pub const PROTOCOL_CLAIMS: [&str; 4] = ["iss", "aud", "nbf", "exp"];

/// `aud` is either a single string or an array of strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Multiple(Vec<String>),
}

impl Audience {
    /// Exact match against the single value or any array element.
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Audience::Single(aud) => aud == audience,
            Audience::Multiple(auds) => auds.iter().any(|aud| aud == audience),
        }
    }
}

/// JWT claim set carried by access tokens.
///
/// Registered claims are typed; the display name travels as `unique_name`.
/// Anything else lands in `extra`, in insertion order, after the base claims.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Claims {
    /// Subject (user identifier)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// JWT ID (unique per issuance)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    /// Issued at (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Display name
    #[serde(rename = "unique_name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Not before (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    /// Expiration time (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,

    #[serde(flatten)]
    pub extra: ExtraClaims,
}

impl Claims {
    /// Base claims for an identity: `sub`, `jti`, `iat`, `unique_name`, `email`.
    pub fn for_identity(identity: &Identity, token_id: impl ToString, issued_at: i64) -> Self {
        Self {
            sub: Some(identity.id.clone()),
            jti: Some(token_id.to_string()),
            iat: Some(issued_at),
            name: Some(identity.display_name.clone()),
            email: Some(identity.email.clone()),
            ..Self::default()
        }
    }

    /// Append caller-supplied claims.
    ///
    /// Identity claims are overwritten when the supplied value has the right
    /// JSON type (last write wins). Protocol claims and mistyped identity
    /// claims are dropped.
    pub fn merge_extra(&mut self, extra: &ExtraClaims) {
        for (name, value) in extra {
            let applied = match name.as_str() {
                "sub" => set_string(&mut self.sub, value),
                "jti" => set_string(&mut self.jti, value),
                "unique_name" => set_string(&mut self.name, value),
                "email" => set_string(&mut self.email, value),
                "iat" => match value.as_i64() {
                    Some(iat) => {
                        self.iat = Some(iat);
                        true
                    }
                    None => false,
                },
                reserved if PROTOCOL_CLAIMS.contains(&reserved) => false,
                _ => {
                    self.extra.insert(name.clone(), value.clone());
                    true
                }
            };

            if !applied {
                tracing::warn!(claim = %name, "Dropping extra claim that cannot override the base claim set");
            }
        }
    }

    /// Set `iss`; an empty issuer leaves it unset.
    pub fn with_issuer(mut self, iss: &str) -> Self {
        if !iss.is_empty() {
            self.iss = Some(iss.to_string());
        }
        self
    }

    /// Set `aud` to a single value; an empty audience leaves it unset.
    pub fn with_audience(mut self, aud: &str) -> Self {
        if !aud.is_empty() {
            self.aud = Some(Audience::Single(aud.to_string()));
        }
        self
    }

    /// Set the validity window.
    ///
    /// # Arguments
    /// * `not_before` - `nbf`, Unix seconds
    /// * `expires` - `exp`, Unix seconds (exclusive)
    pub fn with_lifetime(mut self, not_before: i64, expires: i64) -> Self {
        self.nbf = Some(not_before);
        self.exp = Some(expires);
        self
    }

    pub fn subject(&self) -> Option<&str> {
        self.sub.as_deref()
    }

    pub fn token_id(&self) -> Option<&str> {
        self.jti.as_deref()
    }

    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.iat.and_then(|iat| DateTime::from_timestamp(iat, 0))
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }

    /// Look up a caller-supplied claim.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }

    /// Rebuild the identity the token was issued for, if all parts are present.
    pub fn identity(&self) -> Option<Identity> {
        Some(Identity::new(
            self.sub.clone()?,
            self.name.clone()?,
            self.email.clone()?,
        ))
    }

    /// Check if the token is expired at `now` (zero skew: expired at `exp`).
    pub fn is_expired(&self, now: i64) -> bool {
        self.exp.map_or(false, |exp| now >= exp)
    }
}

fn set_string(slot: &mut Option<String>, value: &Value) -> bool {
    match value.as_str() {
        Some(s) => {
            *slot = Some(s.to_string());
            true
        }
        None => false,
    }
}
