//! HTTP API layer for the polls service.
//!
//! - **Endpoints**: sign-up/sign-in, poll listing, detail, voting and
//!   results, plus the admin surface for questions and choices
//! - **Extractors**: authenticated, optional and admin users; client IP
//! - **Middleware**: bearer-token authentication
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

use axum::Router;

pub use endpoints::router;
pub use middleware::AppState;

/// Mount point of the API router.
pub const API_PREFIX: &str = "/api";

/// The API mounted under [`API_PREFIX`] with authentication applied.
pub fn app(state: AppState) -> Router {
    Router::new()
        .nest(API_PREFIX, router())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ))
        .with_state(state)
}
