use auth::Authenticator;
use auth::ExtraClaims;
use auth::Identity;
use auth::PasswordVerdict;
use serde_json::json;
use serde_json::Value;

/// What a command prints and whether it counts as success.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutput {
    pub stdout: String,
    pub success: bool,
}

impl CommandOutput {
    fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            success: true,
        }
    }

    fn rejected(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            success: false,
        }
    }
}

/// Parse a `key=value` claim. The value is read as JSON when possible,
/// otherwise kept as a string.
pub fn parse_claim(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {:?}", raw))?;
    if key.is_empty() {
        return Err("claim name must not be empty".to_string());
    }

    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

pub fn issue(
    authenticator: &Authenticator,
    identity: &Identity,
    claims: Vec<(String, Value)>,
) -> anyhow::Result<CommandOutput> {
    let extra: ExtraClaims = claims.into_iter().collect();
    let extra = (!extra.is_empty()).then_some(&extra);

    let issued = authenticator.generate_token(identity, extra)?;
    tracing::info!(subject = %issued.subject, token_id = %issued.token_id, "Token issued");

    let body = json!({
        "token": issued.token,
        "token_id": issued.token_id,
        "issued_at": issued.issued_at.to_rfc3339(),
        "expires_at": issued.expires_at.to_rfc3339(),
    });
    Ok(CommandOutput::ok(serde_json::to_string_pretty(&body)?))
}

pub fn validate(
    authenticator: &Authenticator,
    token: &str,
    lenient: bool,
) -> anyhow::Result<CommandOutput> {
    let result = if lenient {
        authenticator.validate_expired_token(token)
    } else {
        authenticator.validate_token(token)
    };

    match result {
        Ok(claims) => Ok(CommandOutput::ok(serde_json::to_string_pretty(&claims)?)),
        Err(failure) => {
            tracing::warn!(reason = %failure, lenient, "Token rejected");
            Ok(CommandOutput::rejected(format!("rejected: {}", failure)))
        }
    }
}

pub fn hash(authenticator: &Authenticator, password: &str) -> anyhow::Result<CommandOutput> {
    let record = authenticator.hash_password(password)?;
    Ok(CommandOutput::ok(record.into_string()))
}

pub fn verify(authenticator: &Authenticator, record: &str, password: &str) -> CommandOutput {
    match authenticator.verify_password(record, password) {
        PasswordVerdict::Match => CommandOutput::ok("match"),
        PasswordVerdict::MatchButWeak => CommandOutput::ok("match-but-weak"),
        PasswordVerdict::NoMatch => CommandOutput::rejected("no-match"),
    }
}
