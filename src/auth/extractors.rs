use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use super::middleware::NO_TOKEN;
use crate::{error::AppError, users::repo_types::Role};

/// Identity resolved by the authentication middleware and stored in the
/// request extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub role: Role,
}

/// Handler-side access to the authenticated caller. Only valid on routes
/// wrapped by [`super::middleware::authenticate`].
pub struct AuthUser(pub CurrentUser);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .copied()
            .map(AuthUser)
            .ok_or(AppError::Unauthenticated(NO_TOKEN))
    }
}
