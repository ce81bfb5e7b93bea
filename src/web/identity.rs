//! Requester extraction from identity-provider headers.

use crate::{core::identity::Requester, errors::Error};
use axum::{extract::FromRequestParts, http::request::Parts};

/// Header carrying the authenticated user id
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying comma-separated role names
pub const USER_ROLES_HEADER: &str = "x-user-roles";

#[axum::async_trait]
impl<S> FromRequestParts<S> for Requester
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let user_id = header(USER_ID_HEADER).ok_or(Error::Unauthenticated)?;
        let roles = header(USER_ROLES_HEADER).unwrap_or_default();
        Ok(Self::with_role_list(user_id, roles))
    }
}
