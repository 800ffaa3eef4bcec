//! Signed access tokens (compact JWS, HMAC).
//!
//! The codec is built once from [`TokenSettings`] and shared read-only across
//! requests. Only the configured algorithm is accepted on decode.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use crate::claims::{validate_expiry, TokenClaims, TokenError, WireClaims};

pub const DEFAULT_ALGORITHM: Algorithm = Algorithm::HS256;
pub const DEFAULT_TTL_MINUTES: i64 = 30;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenConfigError {
    #[error("unsupported signing algorithm '{0}' (expected HS256, HS384 or HS512)")]
    UnsupportedAlgorithm(String),

    #[error("signing secret must not be empty")]
    EmptySecret,
}

/// Process-wide token configuration.
#[derive(Clone)]
pub struct TokenSettings {
    pub secret: String,
    pub algorithm: Algorithm,
    pub ttl: Duration,
}

impl core::fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenSettings")
            .field("secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// Parse an algorithm name. The key is a shared secret, so only the HMAC
/// family is allowed.
pub fn parse_algorithm(name: &str) -> Result<Algorithm, TokenConfigError> {
    match name.trim().to_ascii_uppercase().as_str() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        _ => Err(TokenConfigError::UnsupportedAlgorithm(name.to_string())),
    }
}

pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    ttl: Duration,
    validation: Validation,
}

impl core::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.algorithm)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(settings: &TokenSettings) -> Result<Self, TokenConfigError> {
        if settings.secret.is_empty() {
            return Err(TokenConfigError::EmptySecret);
        }
        if !matches!(
            settings.algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(TokenConfigError::UnsupportedAlgorithm(format!(
                "{:?}",
                settings.algorithm
            )));
        }

        // Expiry is checked against our own clock (no leeway), so the library
        // only verifies structure, algorithm and signature.
        let mut validation = Validation::new(settings.algorithm);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims = HashSet::from(["exp".to_string(), "sub".to_string()]);

        Ok(Self {
            encoding: EncodingKey::from_secret(settings.secret.as_bytes()),
            decoding: DecodingKey::from_secret(settings.secret.as_bytes()),
            algorithm: settings.algorithm,
            ttl: settings.ttl,
            validation,
        })
    }

    /// Sign a token for `subject` valid for the configured TTL.
    pub fn issue<S: AsRef<str>>(&self, subject: &str, scopes: &[S]) -> Result<String, TokenError> {
        self.encode(subject, scopes, self.ttl)
    }

    pub fn encode<S: AsRef<str>>(
        &self,
        subject: &str,
        scopes: &[S],
        ttl: Duration,
    ) -> Result<String, TokenError> {
        self.encode_at(subject, scopes, ttl, Utc::now())
    }

    pub fn encode_at<S: AsRef<str>>(
        &self,
        subject: &str,
        scopes: &[S],
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or(TokenError::LifetimeOutOfRange)?;

        let claims = WireClaims {
            sub: subject.to_string(),
            scopes: scopes
                .iter()
                .map(AsRef::as_ref)
                .collect::<Vec<_>>()
                .join(" "),
            exp: expires_at.timestamp(),
        };

        jsonwebtoken::encode(&Header::new(self.algorithm), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    pub fn decode(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.decode_at(token, Utc::now())
    }

    /// Verify `token` and check its expiry against `now`.
    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenError> {
        let data = jsonwebtoken::decode::<WireClaims>(token, &self.decoding, &self.validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "token rejected");
                TokenError::Invalid
            })?;

        let claims = data.claims.into_claims()?;
        validate_expiry(&claims, now)?;
        Ok(claims)
    }
}
