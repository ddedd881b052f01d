//! Acting user extraction

use albums_core::AppError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::constants::USER_ID_HEADER;
use crate::error::HttpAppError;

/// The user a mutating request is attributed to, from the `X-User-Id` header.
///
/// Attribution only; the header is trusted as sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActingUser(pub Uuid);

impl<S> FromRequestParts<S> for ActingUser
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| {
                HttpAppError(AppError::BadRequest(
                    "Missing X-User-Id header".to_string(),
                ))
            })?
            .to_str()
            .map_err(|_| HttpAppError(AppError::BadRequest("Invalid X-User-Id header".to_string())))?;

        let user_id = Uuid::parse_str(raw.trim()).map_err(|_| {
            HttpAppError(AppError::BadRequest(
                "X-User-Id must be a UUID".to_string(),
            ))
        })?;

        Ok(ActingUser(user_id))
    }
}
