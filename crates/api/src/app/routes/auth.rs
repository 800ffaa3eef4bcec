use std::sync::Arc;

use axum::{Extension, Form, Json};

use westeros_auth::{AccessToken, AuthError, ScopeSet};

use crate::app::dto::LoginForm;
use crate::app::errors::{auth_error_to_response, internal_error, ApiResult};
use crate::app::services::AppServices;

/// Password grant. The token carries the granted scopes, narrowed to the
/// requested ones when the form names any.
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Form(form): Form<LoginForm>,
) -> ApiResult<Json<AccessToken>> {
    let principal = services
        .authenticator
        .authenticate(&form.username, &form.password)
        .await
        .map_err(|e| {
            if e == AuthError::InvalidCredentials {
                tracing::info!("login rejected");
            }
            auth_error_to_response(e)
        })?;

    let scopes = principal.scopes.narrow_to(&ScopeSet::parse(&form.scope));
    let token = services
        .guard
        .codec()
        .issue(&principal.identity, &scopes.to_vec())
        .map_err(|e| internal_error("issue_token", e))?;

    tracing::info!(user_id = %principal.id, scopes = %scopes, "access token issued");
    Ok(Json(AccessToken::bearer(token)))
}
