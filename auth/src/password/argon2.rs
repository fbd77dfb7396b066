use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::PasswordHash;
use argon2::password_hash::PasswordHasher as Argon2PasswordHasher;
use argon2::password_hash::PasswordVerifier;
use argon2::password_hash::SaltString;
use argon2::Algorithm;
use argon2::Argon2;
use argon2::Params;
use argon2::Version;
use argon2::ARGON2ID_IDENT;

use super::errors::PasswordError;
use super::legacy;
use super::record::HashRecord;
use super::record::PasswordVerdict;
use crate::config::HasherSettings;
use crate::errors::ConfigurationError;

/// Stored records may cost at most this many times the configured settings.
const COST_CEILING_FACTOR: u32 = 16;

/// Password hashing implementation.
///
/// New records are Argon2id PHC strings. Verification also accepts older
/// Argon2 records and ASP.NET Identity records, reporting them as
/// `MatchButWeak` so they get replaced on the next successful login.
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    /// Create a password hasher with the Argon2 default costs.
    pub fn new() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }

    /// Create a password hasher with configured costs.
    ///
    /// # Errors
    /// * `InvalidHasherSettings` - Costs rejected by Argon2 (e.g. memory below 8 KiB per lane)
    pub fn with_settings(settings: &HasherSettings) -> Result<Self, ConfigurationError> {
        let params = settings.to_params()?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a plaintext password with a fresh random salt.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to hash
    ///
    /// # Returns
    /// PHC string (algorithm, version, costs, salt and digest)
    ///
    /// # Errors
    /// * `HashingFailed` - Password hashing operation failed
    pub fn hash(&self, password: &str) -> Result<HashRecord, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| HashRecord::from(hash.to_string()))
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }

    /// Verify a password against a stored record.
    ///
    /// Never fails: an unreadable record, or one whose costs exceed the
    /// verification ceiling, is simply `NoMatch`.
    ///
    /// # Arguments
    /// * `record` - Stored record (Argon2 PHC string or ASP.NET Identity base64)
    /// * `password` - Plaintext password to check
    ///
    /// # Returns
    /// `Match`, `MatchButWeak` (re-hash and store the replacement) or `NoMatch`
    pub fn verify(&self, record: impl AsRef<str>, password: &str) -> PasswordVerdict {
        let record = record.as_ref();

        let verdict = if record.starts_with('$') {
            self.verify_phc(record, password)
        } else if legacy::verify(record, password) {
            PasswordVerdict::MatchButWeak
        } else {
            PasswordVerdict::NoMatch
        };

        tracing::debug!(?verdict, "Password verified");
        verdict
    }

    fn verify_phc(&self, record: &str, password: &str) -> PasswordVerdict {
        let parsed_hash = match PasswordHash::new(record) {
            Ok(parsed_hash) => parsed_hash,
            Err(e) => {
                tracing::debug!(error = %e, "Invalid password hash");
                return PasswordVerdict::NoMatch;
            }
        };

        if !self.is_affordable(&parsed_hash) {
            tracing::debug!("Password hash costs exceed the verification ceiling");
            return PasswordVerdict::NoMatch;
        }

        if self
            .argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_err()
        {
            return PasswordVerdict::NoMatch;
        }

        if self.is_current(&parsed_hash) {
            PasswordVerdict::Match
        } else {
            PasswordVerdict::MatchButWeak
        }
    }

    /// No cost more than `COST_CEILING_FACTOR` times the configured one.
    ///
    /// Records that fail to yield Argon2 parameters cannot verify anyway.
    fn is_affordable(&self, hash: &PasswordHash<'_>) -> bool {
        let Ok(params) = Params::try_from(hash) else {
            return false;
        };
        let current = self.argon2.params();
        let ceiling = |cost: u32| cost.saturating_mul(COST_CEILING_FACTOR);

        params.m_cost() <= ceiling(current.m_cost())
            && params.t_cost() <= ceiling(current.t_cost())
            && params.p_cost() <= ceiling(current.p_cost())
    }

    /// Argon2id, version 0x13, and no cost below the configured one.
    fn is_current(&self, hash: &PasswordHash<'_>) -> bool {
        if hash.algorithm != ARGON2ID_IDENT || hash.version != Some(Version::V0x13 as u32) {
            return false;
        }

        let Ok(params) = Params::try_from(hash) else {
            return false;
        };
        let current = self.argon2.params();
        let output_len = |p: &Params| p.output_len().unwrap_or(Params::DEFAULT_OUTPUT_LEN);

        params.m_cost() >= current.m_cost()
            && params.t_cost() >= current.t_cost()
            && params.p_cost() >= current.p_cost()
            && output_len(&params) >= output_len(current)
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}
