use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Decoded access-token claims.
///
/// Never persisted: built at login, signed, then rebuilt from the token on
/// every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    /// Principal identity (email).
    pub subject: String,

    /// Granted scopes, in the order they were encoded.
    pub scopes: Vec<String>,

    /// Expiration timestamp (second precision).
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Bad signature, malformed structure or an algorithm other than the
    /// configured one.
    #[error("invalid token")]
    Invalid,

    #[error("token has expired")]
    Expired,

    #[error("failed to sign token: {0}")]
    Signing(String),

    /// `now + ttl` does not fit in a timestamp.
    #[error("token lifetime out of range")]
    LifetimeOutOfRange,
}

/// Payload as it appears inside the signed token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WireClaims {
    pub sub: String,
    #[serde(default)]
    pub scopes: String,
    pub exp: i64,
}

impl WireClaims {
    pub(crate) fn into_claims(self) -> Result<TokenClaims, TokenError> {
        let expires_at = DateTime::<Utc>::from_timestamp(self.exp, 0).ok_or(TokenError::Invalid)?;
        Ok(TokenClaims {
            subject: self.sub,
            scopes: split_scopes(&self.scopes),
            expires_at,
        })
    }
}

/// Split the wire scope string on single spaces. The empty string is the
/// empty sequence.
pub(crate) fn split_scopes(joined: &str) -> Vec<String> {
    if joined.is_empty() {
        return Vec::new();
    }
    joined.split(' ').map(str::to_owned).collect()
}

/// A token is expired once `now` reaches `expires_at`.
pub fn validate_expiry(claims: &TokenClaims, now: DateTime<Utc>) -> Result<(), TokenError> {
    if now >= claims.expires_at {
        return Err(TokenError::Expired);
    }
    Ok(())
}
