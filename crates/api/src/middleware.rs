//! API middleware.

#![allow(missing_docs)]

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{FromRef, State},
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use polls_common::config::AuthConfig;
use polls_core::{AccountService, AuthEventListenerService, PollAdminService, VotingService};
use polls_db::repositories::{
    ChoiceRepository, QuestionRepository, UserRepository, VoteRepository,
};
use sea_orm::DatabaseConnection;
use tracing::debug;

use crate::extractors::ProxyPolicy;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub voting_service: VotingService,
    pub admin_service: PollAdminService,
    pub account_service: AccountService,
    pub proxy: ProxyPolicy,
}

impl FromRef<AppState> for ProxyPolicy {
    fn from_ref(state: &AppState) -> Self {
        state.proxy
    }
}

impl AppState {
    /// Wire repositories and services over one connection pool.
    #[must_use]
    pub fn new(
        db: &Arc<DatabaseConnection>,
        auth_listener: AuthEventListenerService,
        auth_config: &AuthConfig,
    ) -> Self {
        let question_repo = QuestionRepository::new(Arc::clone(db));
        let choice_repo = ChoiceRepository::new(Arc::clone(db));
        let vote_repo = VoteRepository::new(Arc::clone(db));
        let user_repo = UserRepository::new(Arc::clone(db));

        Self {
            voting_service: VotingService::new(
                question_repo.clone(),
                choice_repo.clone(),
                vote_repo,
            ),
            admin_service: PollAdminService::new(question_repo, choice_repo),
            account_service: AccountService::new(user_repo, auth_listener, auth_config),
            proxy: ProxyPolicy::default(),
        }
    }

    /// Trust `X-Forwarded-For` for client addresses.
    #[must_use]
    pub const fn trusting_proxy(mut self, trust: bool) -> Self {
        self.proxy.trust_forwarded_for = trust;
        self
    }
}

/// Authentication middleware.
///
/// A valid `Authorization: Bearer <token>` header puts the account into the
/// request extensions. Anything else passes through anonymously.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get(AUTHORIZATION)
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.account_service.authenticate_by_token(token).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) => debug!(error = %e, "Bearer token rejected"),
        }
    }

    next.run(req).await
}
