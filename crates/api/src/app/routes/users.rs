use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Extension, Json,
};

use westeros_auth::{RegisterUser, ScopeSet, UserView, DEFAULT_USER_SCOPES};
use westeros_core::UserId;
use westeros_infra::store::Page;

use crate::app::dto::CreateUserRequest;
use crate::app::errors::{json_error, registration_error_to_response, store_error_to_response, ApiResult};
use crate::app::services::AppServices;
use crate::context::{AnyScope, UsersRead, UsersWrite};
use crate::middleware::Authorized;

const EMAIL_TAKEN: &str = "Email already registered";
const USER_NOT_FOUND: &str = "User not found";

fn parse_user_id(raw: &str) -> ApiResult<UserId> {
    raw.parse::<UserId>()
        .map_err(|e| json_error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))
}

pub async fn create_user(
    _auth: Authorized<UsersWrite>,
    Extension(services): Extension<Arc<AppServices>>,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserView>)> {
    let register = RegisterUser::from(req);
    let existing = services
        .users
        .get_by_email(register.email.trim())
        .await
        .map_err(|e| store_error_to_response(e, EMAIL_TAKEN, USER_NOT_FOUND))?;
    if existing.is_some() {
        return Err(json_error(StatusCode::BAD_REQUEST, EMAIL_TAKEN));
    }

    let new_user = register
        .into_new_user(services.verifier.as_ref(), ScopeSet::parse(DEFAULT_USER_SCOPES))
        .map_err(registration_error_to_response)?;

    let user = services
        .users
        .create(new_user)
        .await
        .map_err(|e| store_error_to_response(e, EMAIL_TAKEN, USER_NOT_FOUND))?;

    tracing::info!(user_id = %user.id, "user created");
    Ok((StatusCode::CREATED, Json(user.view())))
}

pub async fn list_users(
    _auth: Authorized<UsersRead>,
    Extension(services): Extension<Arc<AppServices>>,
    Query(page): Query<Page>,
) -> ApiResult<Json<Vec<UserView>>> {
    let users = services
        .users
        .list(page)
        .await
        .map_err(|e| store_error_to_response(e, EMAIL_TAKEN, USER_NOT_FOUND))?;

    Ok(Json(users.iter().map(|u| u.view()).collect()))
}

pub async fn me(auth: Authorized<AnyScope>) -> Json<UserView> {
    Json(UserView::from(&auth.principal))
}

pub async fn get_user(
    _auth: Authorized<UsersRead>,
    Extension(services): Extension<Arc<AppServices>>,
    Path(key): Path<String>,
) -> ApiResult<Json<UserView>> {
    let id = parse_user_id(&key)?;
    let user = services
        .users
        .get(id)
        .await
        .map_err(|e| store_error_to_response(e, EMAIL_TAKEN, USER_NOT_FOUND))?
        .ok_or_else(|| json_error(StatusCode::NOT_FOUND, USER_NOT_FOUND))?;

    Ok(Json(user.view()))
}

pub async fn delete_user(
    _auth: Authorized<UsersWrite>,
    Extension(services): Extension<Arc<AppServices>>,
    Path(key): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_user_id(&key)?;
    let removed = services
        .users
        .delete(id)
        .await
        .map_err(|e| store_error_to_response(e, EMAIL_TAKEN, USER_NOT_FOUND))?;

    if removed == 0 {
        return Err(json_error(StatusCode::NOT_FOUND, USER_NOT_FOUND));
    }

    tracing::info!(user_id = %id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}
