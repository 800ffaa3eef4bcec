//! Request-time access guard.
//!
//! `NoToken -> TokenPresent -> Decoded -> ScopeChecked -> Authorized`, with a
//! terminal failure at every arrow. No IO happens before the scope check; the
//! only IO is the final principal read.

use std::sync::Arc;

use thiserror::Error;
use tracing::instrument;

use crate::{DirectoryError, Principal, PrincipalDirectory, Scope, ScopeSet, TokenCodec, TokenError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GuardError {
    /// No usable bearer credential on the request.
    #[error("not authenticated")]
    Unauthenticated,

    #[error("token rejected: {0}")]
    InvalidToken(#[from] TokenError),

    #[error("missing scopes: {}", join_scopes(.missing))]
    InsufficientScope { missing: Vec<Scope> },

    /// Token subject no longer exists (e.g. deleted after issuance).
    #[error("unknown principal")]
    UnknownPrincipal,

    #[error("inactive account")]
    InactiveAccount,

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

fn join_scopes(scopes: &[Scope]) -> String {
    scopes.iter().map(Scope::as_str).collect::<Vec<_>>().join(" ")
}

/// Pull the token out of an `Authorization` header value.
///
/// The scheme is matched case-insensitively; anything other than a non-empty
/// `Bearer` credential is `Unauthenticated`.
pub fn extract_bearer(authorization: Option<&str>) -> Result<&str, GuardError> {
    let header = authorization.ok_or(GuardError::Unauthenticated)?;
    let (scheme, token) = header
        .trim()
        .split_once(' ')
        .ok_or(GuardError::Unauthenticated)?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(GuardError::Unauthenticated);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(GuardError::Unauthenticated);
    }

    Ok(token)
}

/// Every scope in `required` must be in `granted`.
pub fn check_scopes(granted: &ScopeSet, required: &ScopeSet) -> Result<(), GuardError> {
    let missing = granted.missing(required);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(GuardError::InsufficientScope {
            missing: missing.into_iter().cloned().collect(),
        })
    }
}

#[derive(Clone)]
pub struct AccessGuard {
    codec: Arc<TokenCodec>,
    directory: Arc<dyn PrincipalDirectory>,
}

impl AccessGuard {
    pub fn new(codec: Arc<TokenCodec>, directory: Arc<dyn PrincipalDirectory>) -> Self {
        Self { codec, directory }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Run the full guard against a raw `Authorization` header value.
    pub async fn authorize(
        &self,
        authorization: Option<&str>,
        required: &ScopeSet,
    ) -> Result<Principal, GuardError> {
        let token = extract_bearer(authorization)?;
        self.authorize_token(token, required).await
    }

    #[instrument(skip_all, fields(required = %required))]
    pub async fn authorize_token(&self, token: &str, required: &ScopeSet) -> Result<Principal, GuardError> {
        let claims = self.codec.decode(token)?;

        let granted: ScopeSet = claims.scopes.iter().map(|s| Scope::new(s.clone())).collect();
        check_scopes(&granted, required)?;

        let principal = self
            .directory
            .find_by_identity(&claims.subject)
            .await?
            .ok_or(GuardError::UnknownPrincipal)?;

        if !principal.active {
            return Err(GuardError::InactiveAccount);
        }

        Ok(principal)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use jsonwebtoken::Algorithm;
    use westeros_core::UserId;

    use super::*;
    use crate::principal::testing::MapDirectory;
    use crate::{SecretHash, TokenSettings};

    const ARYA: &str = "arya@braavos.essos";

    fn codec() -> Arc<TokenCodec> {
        Arc::new(
            TokenCodec::new(&TokenSettings {
                secret: "guard-secret".to_string(),
                algorithm: Algorithm::HS256,
                ttl: Duration::minutes(5),
            })
            .unwrap(),
        )
    }

    fn principal(active: bool) -> Principal {
        Principal {
            id: UserId::new(9),
            identity: ARYA.to_string(),
            secret_hash: SecretHash::new("unused"),
            active,
            scopes: ScopeSet::parse("houses:read"),
        }
    }

    fn guard(directory: MapDirectory) -> (AccessGuard, Arc<TokenCodec>) {
        let codec = codec();
        (AccessGuard::new(codec.clone(), Arc::new(directory)), codec)
    }

    fn bearer(token: &str) -> String {
        format!("Bearer {token}")
    }

    #[test]
    fn extract_bearer_variants() {
        assert_eq!(extract_bearer(Some("Bearer abc")), Ok("abc"));
        assert_eq!(extract_bearer(Some("bearer  abc ")), Ok("abc"));
        assert_eq!(extract_bearer(None), Err(GuardError::Unauthenticated));
        assert_eq!(extract_bearer(Some("Basic abc")), Err(GuardError::Unauthenticated));
        assert_eq!(extract_bearer(Some("Bearer")), Err(GuardError::Unauthenticated));
        assert_eq!(extract_bearer(Some("Bearer   ")), Err(GuardError::Unauthenticated));
        assert_eq!(extract_bearer(Some("")), Err(GuardError::Unauthenticated));
    }

    #[test]
    fn scope_check_is_set_containment() {
        let granted = ScopeSet::parse("houses:read");

        assert!(check_scopes(&granted, &ScopeSet::new()).is_ok());
        assert!(check_scopes(&granted, &ScopeSet::parse("houses:read")).is_ok());
        assert_eq!(
            check_scopes(&granted, &ScopeSet::parse("houses:write")),
            Err(GuardError::InsufficientScope {
                missing: vec![Scope::HOUSES_WRITE]
            })
        );
    }

    #[tokio::test]
    async fn authorizes_active_principal_with_scopes() {
        let (guard, codec) = guard(MapDirectory::with([principal(true)]));
        let token = codec.issue(ARYA, &["houses:read"]).unwrap();

        let p = guard
            .authorize(Some(&bearer(&token)), &ScopeSet::parse("houses:read"))
            .await
            .unwrap();
        assert_eq!(p.identity, ARYA);
    }

    #[tokio::test]
    async fn empty_requirement_still_needs_a_valid_token() {
        let (guard, codec) = guard(MapDirectory::with([principal(true)]));
        let token = codec.issue::<&str>(ARYA, &[]).unwrap();

        assert!(guard.authorize(Some(&bearer(&token)), &ScopeSet::new()).await.is_ok());
        assert_eq!(
            guard.authorize(None, &ScopeSet::new()).await,
            Err(GuardError::Unauthenticated)
        );
        assert_eq!(
            guard.authorize(Some("Bearer nope"), &ScopeSet::new()).await,
            Err(GuardError::InvalidToken(TokenError::Invalid))
        );
    }

    #[tokio::test]
    async fn rejects_missing_scope() {
        let (guard, codec) = guard(MapDirectory::with([principal(true)]));
        let token = codec.issue(ARYA, &["houses:read"]).unwrap();

        let err = guard
            .authorize(Some(&bearer(&token)), &ScopeSet::parse("houses:write"))
            .await
            .unwrap_err();
        assert!(matches!(err, GuardError::InsufficientScope { .. }));
    }

    #[tokio::test]
    async fn token_scopes_win_over_stored_scopes() {
        // Stored grants are only consulted at login; the token is authoritative.
        let (guard, codec) = guard(MapDirectory::with([principal(true)]));
        let token = codec.issue(ARYA, &["houses:write"]).unwrap();

        assert!(guard
            .authorize(Some(&bearer(&token)), &ScopeSet::parse("houses:write"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn rejects_expired_token() {
        let (guard, codec) = guard(MapDirectory::with([principal(true)]));
        let token = codec.encode(ARYA, &["houses:read"], Duration::seconds(-1)).unwrap();

        assert_eq!(
            guard.authorize(Some(&bearer(&token)), &ScopeSet::new()).await,
            Err(GuardError::InvalidToken(TokenError::Expired))
        );
    }

    #[tokio::test]
    async fn rejects_deleted_principal() {
        let directory = Arc::new(MapDirectory::with([principal(true)]));
        let codec = codec();
        let guard = AccessGuard::new(codec.clone(), directory.clone());
        let token = codec.issue(ARYA, &["houses:read"]).unwrap();

        directory.remove(ARYA);

        assert_eq!(
            guard.authorize(Some(&bearer(&token)), &ScopeSet::new()).await,
            Err(GuardError::UnknownPrincipal)
        );
    }

    #[tokio::test]
    async fn rejects_inactive_principal_after_scope_check() {
        let (guard, codec) = guard(MapDirectory::with([principal(false)]));
        let token = codec.issue(ARYA, &["houses:read"]).unwrap();

        assert_eq!(
            guard
                .authorize(Some(&bearer(&token)), &ScopeSet::parse("houses:read"))
                .await,
            Err(GuardError::InactiveAccount)
        );

        // Scope failures are reported before the account is even loaded.
        assert!(matches!(
            guard
                .authorize(Some(&bearer(&token)), &ScopeSet::parse("users:write"))
                .await,
            Err(GuardError::InsufficientScope { .. })
        ));
    }

    #[tokio::test]
    async fn directory_failure_surfaces() {
        let (guard, codec) = guard(MapDirectory::failing());
        let token = codec.issue(ARYA, &["houses:read"]).unwrap();

        assert!(matches!(
            guard.authorize(Some(&bearer(&token)), &ScopeSet::new()).await,
            Err(GuardError::Directory(_))
        ));
    }
}
