use axum::{
    extract::State,
    middleware,
    routing::{get, put},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::{
        access::{self, Action, Resource},
        extractors::AuthUser,
        middleware::require_role,
    },
    error::{route_not_found, AppError, AppJson, AppPath, AppResult},
    state::AppState,
    users::dto::{ProfileResponse, ProfileUpdatedResponse, UpdateProfileRequest},
};

pub const USER_NOT_FOUND: &str = "User not found.";

/// Routes under `/api/users`; the caller wraps them in authentication.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/users/me",
            get(get_profile)
                .put(update_own_profile)
                .fallback(route_not_found),
        )
        .route(
            "/api/users/:id",
            put(update_user_profile)
                .route_layer(middleware::from_fn_with_state(
                    (Resource::Profile, Action::UpdateAny),
                    require_role,
                ))
                .fallback(route_not_found),
        )
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> AppResult<Json<ProfileResponse>> {
    access::ensure_owner_or_elevated(Resource::Profile, Action::Read, &caller, caller.id)?;
    let user = state
        .credentials
        .find_by_id(caller.id)
        .await?
        .ok_or(AppError::NotFound(USER_NOT_FOUND))?;
    Ok(Json(ProfileResponse { user }))
}

#[instrument(skip(state, payload))]
pub async fn update_own_profile(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> AppResult<Json<ProfileUpdatedResponse>> {
    access::ensure_owner_or_elevated(Resource::Profile, Action::Update, &caller, caller.id)?;
    let changes = payload.into_changes(false)?;
    let user = state
        .credentials
        .update(caller.id, changes)
        .await?
        .ok_or(AppError::NotFound(USER_NOT_FOUND))?;

    info!(user_id = user.id, "profile updated");
    Ok(Json(ProfileUpdatedResponse {
        message: "Profile updated successfully",
        user: user.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_user_profile(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    AppPath(id): AppPath<i64>,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> AppResult<Json<ProfileUpdatedResponse>> {
    access::ensure_allowed(Resource::Profile, Action::UpdateAny, &caller)?;
    let changes = payload.into_changes(true)?;
    let user = state
        .credentials
        .update(id, changes)
        .await?
        .ok_or(AppError::NotFound(USER_NOT_FOUND))?;

    info!(admin_id = caller.id, user_id = user.id, role = user.role.as_str(), "user profile updated by admin");
    Ok(Json(ProfileUpdatedResponse {
        message: "User profile updated successfully",
        user: user.into(),
    }))
}
