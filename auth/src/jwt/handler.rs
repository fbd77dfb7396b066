use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::Claims;
use super::errors::IssueError;
use super::errors::ValidationFailure;
use crate::key::KeyMaterial;

/// HS256 signing and signature verification over a resolved key.
///
/// Only the signature and the token structure are checked here. Issuer,
/// audience and lifetime checks belong to the validator, which owns the clock.
pub(crate) struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtHandler {
    /// Create a handler for HS256 over `key`.
    ///
    /// Expiry, not-before and audience checks of `jsonwebtoken` are disabled
    /// and no claim is required.
    pub(crate) fn new(key: &KeyMaterial) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(key.as_bytes()),
            decoding_key: DecodingKey::from_secret(key.as_bytes()),
            validation,
        }
    }

    /// Sign claims into a compact `header.payload.signature` string.
    ///
    /// # Arguments
    /// * `claims` - Claim set to sign
    ///
    /// # Returns
    /// JWT token string
    ///
    /// # Errors
    /// * `EncodingFailed` - Claims could not be serialized
    pub(crate) fn encode(&self, claims: &Claims) -> Result<String, IssueError> {
        let header = Header::new(Algorithm::HS256);

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| IssueError::EncodingFailed(e.to_string()))
    }

    /// Verify the signature (constant-time) and decode the claims.
    ///
    /// # Arguments
    /// * `token` - JWT token string
    ///
    /// # Returns
    /// Decoded claims, not yet checked against issuer, audience or time
    ///
    /// # Errors
    /// * `BadSignature` - Signature mismatch or a non-HS256 header
    /// * `Malformed` - Wrong segment count, bad base64 or bad JSON
    pub(crate) fn decode(&self, token: &str) -> Result<Claims, ValidationFailure> {
        if token.split('.').count() != 3 {
            return Err(ValidationFailure::Malformed(
                "expected three dot-separated segments".to_string(),
            ));
        }

        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;

        Ok(token_data.claims)
    }
}
