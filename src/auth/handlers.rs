use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::{info, instrument, warn};

use crate::{
    auth::dto::{AuthResponse, LoginRequest, RegisterRequest},
    error::{route_not_found, AppError, AppJson, AppResult},
    state::AppState,
};

pub const BAD_LOGIN: &str = "Invalid username or password.";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register).fallback(route_not_found))
        .route("/api/auth/login", post(login).fallback(route_not_found))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let (profile, password) = payload.into_profile()?;

    let user = state.credentials.create(profile, &password).await?;
    let token = state.jwt.issue(user.id)?;

    info!(user_id = user.id, role = user.role.as_str(), "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully",
            token,
            user: user.into(),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(mut payload): AppJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    payload.validate()?;

    // unknown user and wrong password answer identically
    let Some(user) = state.credentials.find_by_username(&payload.username).await? else {
        warn!("login with unknown username");
        return Err(AppError::Unauthenticated(BAD_LOGIN));
    };
    if !state.credentials.verify_secret(&user, &payload.password)? {
        warn!(user_id = user.id, "login with invalid password");
        return Err(AppError::Unauthenticated(BAD_LOGIN));
    }

    let token = state.jwt.issue(user.id)?;

    info!(user_id = user.id, "user logged in");
    Ok(Json(AuthResponse {
        message: "Login successful",
        token,
        user: user.into(),
    }))
}
