//! Caller identity. Session management is an external collaborator; by the
//! time a request reaches these handlers the authenticated user id travels
//! in the `x-user-id` header, placed there by the auth proxy in front of
//! this service.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use cotiza_core::domain::user::UserId;

use crate::error::ApiError;

#[derive(Clone, Debug)]
pub struct Caller(pub UserId);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(ApiError::Unauthorized)?;

        Ok(Caller(UserId(user_id.to_string())))
    }
}
