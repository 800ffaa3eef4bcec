use std::fmt::Display;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use westeros_auth::{AuthError, GuardError, RegistrationError, ScopeSet};
use westeros_core::DomainError;
use westeros_infra::store::StoreError;

pub type ApiResult<T> = Result<T, Response>;

pub const NOT_AUTHENTICATED: &str = "Not authenticated";
pub const INVALID_CREDENTIALS: &str = "Could not validate credentials";
pub const NOT_ENOUGH_PERMISSIONS: &str = "Not enough permissions";
pub const INACTIVE_USER: &str = "Inactive user";
pub const LOGIN_FAILED: &str = "Incorrect username or password";
pub const INTERNAL_ERROR: &str = "Internal server error";

pub fn json_error(status: StatusCode, detail: impl Into<String>) -> Response {
    (status, axum::Json(json!({ "detail": detail.into() }))).into_response()
}

/// 401 with a `WWW-Authenticate` challenge.
pub fn unauthorized(detail: &str, challenge: String) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, challenge)],
        axum::Json(json!({ "detail": detail })),
    )
        .into_response()
}

/// `Bearer`, or `Bearer scope="..."` when the route declares scopes.
pub fn bearer_challenge(required: &ScopeSet) -> String {
    if required.is_empty() {
        "Bearer".to_string()
    } else {
        format!("Bearer scope=\"{required}\"")
    }
}

/// Log the failure and answer with an opaque 500.
pub fn internal_error(operation: &str, err: impl Display) -> Response {
    tracing::error!(operation, error = %err, "request failed");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR)
}

pub fn guard_error_to_response(err: GuardError, required: &ScopeSet) -> Response {
    match err {
        GuardError::Unauthenticated => unauthorized(NOT_AUTHENTICATED, "Bearer".to_string()),
        GuardError::InvalidToken(_) | GuardError::UnknownPrincipal => {
            unauthorized(INVALID_CREDENTIALS, bearer_challenge(required))
        }
        GuardError::InsufficientScope { .. } => {
            unauthorized(NOT_ENOUGH_PERMISSIONS, bearer_challenge(required))
        }
        GuardError::InactiveAccount => json_error(StatusCode::BAD_REQUEST, INACTIVE_USER),
        GuardError::Directory(e) => internal_error("authorize", e),
    }
}

pub fn auth_error_to_response(err: AuthError) -> Response {
    match err {
        AuthError::InvalidCredentials => unauthorized(LOGIN_FAILED, "Bearer".to_string()),
        AuthError::Directory(e) => internal_error("login", e),
    }
}

pub fn domain_error_to_response(err: DomainError) -> Response {
    json_error(StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
}

pub fn registration_error_to_response(err: RegistrationError) -> Response {
    match err {
        RegistrationError::Domain(e) => domain_error_to_response(e),
        RegistrationError::Credential(e) => internal_error("hash_password", e),
    }
}

/// Map a store failure. `conflict` and `not_found` are the client-facing
/// details for the resource at hand.
pub fn store_error_to_response(err: StoreError, conflict: &str, not_found: &str) -> Response {
    match err {
        StoreError::Conflict(_) => json_error(StatusCode::BAD_REQUEST, conflict),
        StoreError::NotFound => json_error(StatusCode::NOT_FOUND, not_found),
        StoreError::Backend(e) => internal_error("store", e),
    }
}

#[cfg(test)]
mod tests {
    use westeros_auth::TokenError;

    use super::*;

    fn challenge(response: &Response) -> Option<&str> {
        response
            .headers()
            .get(header::WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok())
    }

    #[test]
    fn guard_errors_map_to_stable_statuses() {
        let required = ScopeSet::parse("houses:write");

        let res = guard_error_to_response(GuardError::Unauthenticated, &required);
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(challenge(&res), Some("Bearer"));

        let res = guard_error_to_response(GuardError::InvalidToken(TokenError::Expired), &required);
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(challenge(&res), Some("Bearer scope=\"houses:write\""));

        let res = guard_error_to_response(GuardError::UnknownPrincipal, &ScopeSet::new());
        assert_eq!(challenge(&res), Some("Bearer"));

        let res = guard_error_to_response(
            GuardError::InsufficientScope { missing: vec![] },
            &required,
        );
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let res = guard_error_to_response(GuardError::InactiveAccount, &required);
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(challenge(&res).is_none());
    }

    #[test]
    fn store_errors() {
        let conflict = store_error_to_response(StoreError::Conflict("dup".into()), "taken", "missing");
        assert_eq!(conflict.status(), StatusCode::BAD_REQUEST);

        let missing = store_error_to_response(StoreError::NotFound, "taken", "missing");
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let backend = store_error_to_response(StoreError::Backend("down".into()), "taken", "missing");
        assert_eq!(backend.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn login_failure_challenges_bearer() {
        let res = auth_error_to_response(AuthError::InvalidCredentials);
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(challenge(&res), Some("Bearer"));
    }
}
