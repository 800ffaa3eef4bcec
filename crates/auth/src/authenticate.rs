//! Login-time credential check.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use crate::{CredentialVerifier, DirectoryError, Principal, PrincipalDirectory};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown identity or wrong secret; callers never learn which.
    #[error("incorrect username or password")]
    InvalidCredentials,

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

/// Bearer token handed back at login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: &'static str,
}

impl AccessToken {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer",
        }
    }
}

#[derive(Clone)]
pub struct Authenticator {
    directory: Arc<dyn PrincipalDirectory>,
    verifier: Arc<dyn CredentialVerifier>,
}

impl Authenticator {
    pub fn new(directory: Arc<dyn PrincipalDirectory>, verifier: Arc<dyn CredentialVerifier>) -> Self {
        Self { directory, verifier }
    }

    #[instrument(skip(self, secret))]
    pub async fn authenticate(&self, identity: &str, secret: &str) -> Result<Principal, AuthError> {
        let Some(principal) = self.directory.find_by_identity(identity).await? else {
            tracing::debug!("no principal with this identity");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.verifier.verify(secret, principal.secret_hash.as_str()) {
            tracing::debug!("secret mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        Ok(principal)
    }
}

#[cfg(test)]
mod tests {
    use westeros_core::UserId;

    use super::*;
    use crate::principal::testing::MapDirectory;
    use crate::{Argon2Verifier, ScopeSet, SecretHash};

    fn principal(identity: &str, secret: &str, active: bool) -> Principal {
        Principal {
            id: UserId::new(1),
            identity: identity.to_string(),
            secret_hash: SecretHash::new(Argon2Verifier.hash(secret).unwrap()),
            active,
            scopes: ScopeSet::parse("houses:read"),
        }
    }

    fn authenticator(directory: MapDirectory) -> Authenticator {
        Authenticator::new(Arc::new(directory), Arc::new(Argon2Verifier))
    }

    #[tokio::test]
    async fn correct_secret_returns_principal() {
        let auth = authenticator(MapDirectory::with([principal("ned@winterfell.north", "ice", true)]));

        let p = auth.authenticate("ned@winterfell.north", "ice").await.unwrap();
        assert_eq!(p.identity, "ned@winterfell.north");
    }

    #[tokio::test]
    async fn wrong_secret_and_unknown_identity_look_the_same() {
        let auth = authenticator(MapDirectory::with([principal("ned@winterfell.north", "ice", true)]));

        let wrong = auth.authenticate("ned@winterfell.north", "needle").await.unwrap_err();
        let unknown = auth.authenticate("robb@winterfell.north", "ice").await.unwrap_err();

        assert_eq!(wrong, AuthError::InvalidCredentials);
        assert_eq!(unknown, AuthError::InvalidCredentials);
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn identity_lookup_is_exact() {
        let auth = authenticator(MapDirectory::with([principal("ned@winterfell.north", "ice", true)]));

        let err = auth.authenticate("NED@winterfell.north", "ice").await.unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn inactive_principal_still_authenticates() {
        let auth = authenticator(MapDirectory::with([principal("benjen@castleblack.north", "x", false)]));

        let p = auth.authenticate("benjen@castleblack.north", "x").await.unwrap();
        assert!(!p.active);
    }

    #[tokio::test]
    async fn directory_failure_is_not_a_credential_failure() {
        let auth = authenticator(MapDirectory::failing());

        let err = auth.authenticate("a@b.c", "x").await.unwrap_err();
        assert!(matches!(err, AuthError::Directory(_)));
    }

    #[test]
    fn access_token_is_bearer() {
        let json = serde_json::to_value(AccessToken::bearer("t".to_string())).unwrap();
        assert_eq!(json, serde_json::json!({"access_token": "t", "token_type": "bearer"}));
    }
}
