use async_trait::async_trait;
use thiserror::Error;

use westeros_core::UserId;

use crate::ScopeSet;

/// Stored one-way hash of a principal's secret.
///
/// Redacted from `Debug` and deliberately not `Serialize`.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretHash(String);

impl SecretHash {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for SecretHash {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SecretHash(<redacted>)")
    }
}

/// An authenticable entity, as the auth subsystem sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: UserId,
    /// Unique identity (email).
    pub identity: String,
    pub secret_hash: SecretHash,
    pub active: bool,
    pub scopes: ScopeSet,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("principal directory unavailable: {0}")]
pub struct DirectoryError(pub String);

/// Read access to principals by identity.
///
/// Implemented by the persistence layer; the authenticator and guard only
/// ever read through this.
#[async_trait]
pub trait PrincipalDirectory: Send + Sync {
    async fn find_by_identity(&self, identity: &str) -> Result<Option<Principal>, DirectoryError>;
}
