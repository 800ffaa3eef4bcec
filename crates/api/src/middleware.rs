//! Request authorization extractor.

use std::marker::PhantomData;
use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    response::Response,
};

use westeros_auth::Principal;

use crate::app::errors::{guard_error_to_response, internal_error};
use crate::app::services::AppServices;
use crate::context::RequiredScopes;

/// The authorized principal of a request whose token carries every scope `R`
/// requires.
///
/// Rejections are complete responses (status, `WWW-Authenticate` challenge
/// and `{"detail": ...}` body).
pub struct Authorized<R> {
    pub principal: Principal,
    _required: PhantomData<R>,
}

#[axum::async_trait]
impl<S, R> FromRequestParts<S> for Authorized<R>
where
    S: Send + Sync,
    R: RequiredScopes,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let services = parts
            .extensions
            .get::<Arc<AppServices>>()
            .cloned()
            .ok_or_else(|| internal_error("authorize", "application services not installed"))?;

        // A header that is not valid visible ASCII is treated as absent.
        let authorization = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        let required = R::required();
        match services.guard.authorize(authorization, &required).await {
            Ok(principal) => Ok(Self {
                principal,
                _required: PhantomData,
            }),
            Err(err) => {
                tracing::debug!(reason = %err, required = %required, "request denied");
                Err(guard_error_to_response(err, &required))
            }
        }
    }
}
