//! Per-route authorization requirements.
//!
//! Each protected handler names its required scopes at the type level through
//! one of these markers, e.g. `Authorized<HousesWrite>`.

use westeros_auth::{Scope, ScopeSet};

pub trait RequiredScopes: Send + Sync + 'static {
    const SCOPES: &'static [Scope];

    fn required() -> ScopeSet {
        Self::SCOPES.iter().cloned().collect()
    }
}

/// Any valid token for an active account, no particular scope.
pub struct AnyScope;

pub struct UsersRead;

pub struct UsersWrite;

pub struct HousesWrite;

impl RequiredScopes for AnyScope {
    const SCOPES: &'static [Scope] = &[];
}

impl RequiredScopes for UsersRead {
    const SCOPES: &'static [Scope] = &[Scope::USERS_READ];
}

impl RequiredScopes for UsersWrite {
    const SCOPES: &'static [Scope] = &[Scope::USERS_WRITE];
}

impl RequiredScopes for HousesWrite {
    const SCOPES: &'static [Scope] = &[Scope::HOUSES_WRITE];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_render_their_scopes() {
        assert!(AnyScope::required().is_empty());
        assert_eq!(UsersRead::required().to_string(), "users:read");
        assert_eq!(UsersWrite::required().to_string(), "users:write");
        assert_eq!(HousesWrite::required().to_string(), "houses:write");
    }
}
