//! Authentication endpoints.

use axum::{Json, Router, extract::State, routing::post};
use polls_common::AppResult;
use polls_core::SignupInput;
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthUser, ClientIp},
    middleware::AppState,
    response::ApiResponse,
};

/// Where a client lands after signing in without a `next` path.
const DEFAULT_REDIRECT: &str = "/api/polls";

/// Signup response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub id: String,
    pub username: String,
}

/// Create a new user account.
async fn signup(
    State(state): State<AppState>,
    Json(input): Json<SignupInput>,
) -> AppResult<ApiResponse<SignupResponse>> {
    let user = state.account_service.signup(input).await?;

    Ok(ApiResponse::ok(SignupResponse {
        id: user.id,
        username: user.username,
    }))
}

/// Signin request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigninRequest {
    pub username: String,
    pub password: String,
    /// Path to return to, as handed out in a `loginUrl`.
    pub next: Option<String>,
}

/// Signin response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SigninResponse {
    pub id: String,
    pub username: String,
    pub token: String,
    pub is_admin: bool,
    pub redirect_to: String,
}

/// Sign in to an existing account.
async fn signin(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Json(req): Json<SigninRequest>,
) -> AppResult<ApiResponse<SigninResponse>> {
    let session = state
        .account_service
        .signin(&req.username, &req.password, &ip)
        .await?;

    Ok(ApiResponse::ok(SigninResponse {
        id: session.user.id,
        username: session.user.username,
        token: session.token,
        is_admin: session.user.is_admin,
        redirect_to: redirect_target(req.next.as_deref()),
    }))
}

/// Signout response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignoutResponse {
    pub ok: bool,
}

/// Sign out (invalidate current token by regenerating).
async fn signout(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
) -> AppResult<ApiResponse<SignoutResponse>> {
    state.account_service.signout(user, &ip).await?;

    Ok(ApiResponse::ok(SignoutResponse { ok: true }))
}

/// Only same-site absolute paths are followed.
fn redirect_target(next: Option<&str>) -> String {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path.to_string(),
        _ => DEFAULT_REDIRECT.to_string(),
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
        .route("/signout", post(signout))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_target() {
        assert_eq!(redirect_target(Some("/api/polls/1")), "/api/polls/1");
        assert_eq!(redirect_target(None), DEFAULT_REDIRECT);
        assert_eq!(redirect_target(Some("https://evil.example")), DEFAULT_REDIRECT);
        assert_eq!(redirect_target(Some("//evil.example")), DEFAULT_REDIRECT);
    }
}
