use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use super::{
    access::{self, Action, Resource},
    extractors::CurrentUser,
};
use crate::{
    error::{AppError, AppResult},
    state::AppState,
};

pub const NO_TOKEN: &str = "Access denied. No token provided.";
pub const USER_GONE: &str = "Invalid token. User not found.";

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then_some(token)
}

/// Verifies the bearer token and re-resolves its subject, then attaches the
/// caller as [`CurrentUser`] for everything downstream.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> AppResult<Response> {
    let user_id = {
        let token = bearer_token(req.headers()).ok_or(AppError::Unauthenticated(NO_TOKEN))?;
        state.jwt.verify(token)?
    };

    let user = state
        .credentials
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| {
            warn!(user_id, "token subject no longer exists");
            AppError::Unauthenticated(USER_GONE)
        })?;

    req.extensions_mut().insert(CurrentUser {
        id: user.id,
        role: user.role,
    });
    Ok(next.run(req).await)
}

/// Route gate: rejects callers whose role the access table denies for
/// `(resource, action)`. Must sit inside [`authenticate`].
pub async fn require_role(
    State((resource, action)): State<(Resource, Action)>,
    req: Request,
    next: Next,
) -> AppResult<Response> {
    let caller = req
        .extensions()
        .get::<CurrentUser>()
        .copied()
        .ok_or(AppError::Unauthenticated(NO_TOKEN))?;
    if let Err(e) = access::ensure_allowed(resource, action, &caller) {
        warn!(user_id = caller.id, role = caller.role.as_str(), ?resource, ?action, "role gate denied");
        return Err(e);
    }
    Ok(next.run(req).await)
}
