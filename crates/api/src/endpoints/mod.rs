//! API endpoints.

mod admin;
mod auth;
mod polls;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .nest("/polls", polls::router())
        .nest("/admin", admin::router())
}
