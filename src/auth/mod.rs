use crate::state::AppState;
use axum::Router;

pub mod access;
mod claims;
pub mod credentials;
pub(crate) mod dto;
pub(crate) mod extractors;
pub mod handlers;
pub mod jwt;
pub mod middleware;

/// Public routes: registration and login.
pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::auth_routes())
}
