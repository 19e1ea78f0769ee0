//! Account service: sign-up, sign-in and bearer tokens.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use polls_common::{AppError, AppResult, IdGenerator, config::AuthConfig};
use polls_db::{entities::user, repositories::UserRepository};
use sea_orm::Set;
use serde::Deserialize;
use tracing::{debug, info, warn};
use validator::Validate;

use super::auth_events::{AuthEvent, AuthEventListenerService};

/// Message for any rejected sign-up form.
pub const FORM_NOT_VALID: &str = "Form is not valid";

/// Account service for business logic.
#[derive(Clone)]
pub struct AccountService {
    user_repo: UserRepository,
    listener: AuthEventListenerService,
    id_gen: IdGenerator,
    allow_signup: bool,
}

/// Input for creating an account.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupInput {
    #[validate(length(min = 1, max = 150))]
    pub username: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    pub password_confirmation: String,
}

/// A successful sign-in.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: user::Model,
    pub token: String,
}

impl AccountService {
    /// Create a new account service.
    #[must_use]
    pub fn new(
        user_repo: UserRepository,
        listener: AuthEventListenerService,
        config: &AuthConfig,
    ) -> Self {
        Self {
            user_repo,
            listener,
            id_gen: IdGenerator::new(),
            allow_signup: config.allow_signup,
        }
    }

    /// Whether new accounts may be created.
    #[must_use]
    pub const fn signup_allowed(&self) -> bool {
        self.allow_signup
    }

    /// Create a regular account.
    pub async fn signup(&self, input: SignupInput) -> AppResult<user::Model> {
        if !self.allow_signup {
            return Err(AppError::Forbidden("Sign-up is disabled".to_string()));
        }

        if let Err(e) = input.validate() {
            debug!(error = %e, "Sign-up form rejected");
            return Err(AppError::Validation(FORM_NOT_VALID.to_string()));
        }
        if !is_valid_username(&input.username) || input.password != input.password_confirmation {
            return Err(AppError::Validation(FORM_NOT_VALID.to_string()));
        }
        if self.user_repo.find_by_username(&input.username).await?.is_some() {
            debug!(username = %input.username, "Username already taken");
            return Err(AppError::Validation(FORM_NOT_VALID.to_string()));
        }

        let user = self
            .insert_user(&input.username, &input.password, false)
            .await?;
        info!(user_id = %user.id, username = %user.username, "Account created");
        Ok(user)
    }

    /// Check credentials and hand out the account's bearer token.
    pub async fn signin(&self, username: &str, password: &str, ip: &str) -> AppResult<Session> {
        let user = match self.user_repo.find_by_username(username).await? {
            Some(user) if password_matches(password, &user) => user,
            _ => {
                self.listener
                    .on_event(&AuthEvent::LoginFailed {
                        username: username.to_string(),
                        ip: ip.to_string(),
                    })
                    .await;
                return Err(AppError::Unauthorized);
            }
        };

        let (user, token) = match user.token.clone() {
            Some(token) => (user, token),
            None => self.rotate_token(user).await?,
        };

        self.listener
            .on_event(&AuthEvent::LoggedIn {
                username: user.username.clone(),
                ip: ip.to_string(),
            })
            .await;

        Ok(Session { user, token })
    }

    /// End the session by replacing the account's token.
    pub async fn signout(&self, user: user::Model, ip: &str) -> AppResult<()> {
        let username = user.username.clone();
        self.rotate_token(user).await?;

        self.listener
            .on_event(&AuthEvent::LoggedOut {
                username,
                ip: ip.to_string(),
            })
            .await;

        Ok(())
    }

    /// Resolve a bearer token to its account.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Make sure an administrator with this username exists.
    ///
    /// An existing account is promoted and keeps its password.
    pub async fn ensure_admin(&self, username: &str, password: &str) -> AppResult<user::Model> {
        if let Some(existing) = self.user_repo.find_by_username(username).await? {
            if existing.is_admin {
                return Ok(existing);
            }
            let mut active: user::ActiveModel = existing.into();
            active.is_admin = Set(true);
            active.updated_at = Set(Some(Utc::now()));
            let user = self.user_repo.update(active).await?;
            info!(username = %user.username, "Account promoted to admin");
            return Ok(user);
        }

        let user = self.insert_user(username, password, true).await?;
        info!(username = %user.username, "Admin account created");
        Ok(user)
    }

    async fn insert_user(
        &self,
        username: &str,
        password: &str,
        is_admin: bool,
    ) -> AppResult<user::Model> {
        let password_hash = hash_password(password)?;

        self.user_repo
            .create(user::ActiveModel {
                id: Set(self.id_gen.user_id()),
                username: Set(username.to_string()),
                username_lower: Set(username.to_lowercase()),
                password_hash: Set(password_hash),
                token: Set(Some(self.id_gen.access_token())),
                is_admin: Set(is_admin),
                created_at: Set(Utc::now()),
                updated_at: Set(None),
            })
            .await
    }

    async fn rotate_token(&self, user: user::Model) -> AppResult<(user::Model, String)> {
        let token = self.id_gen.access_token();

        let mut active: user::ActiveModel = user.into();
        active.token = Set(Some(token.clone()));
        active.updated_at = Set(Some(Utc::now()));

        let user = self.user_repo.update(active).await?;
        Ok((user, token))
    }
}

/// Letters, digits and `@ . + - _`.
fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

/// A stored hash that cannot be parsed never matches.
fn password_matches(password: &str, user: &user::Model) -> bool {
    verify_password(password, &user.password_hash).unwrap_or_else(|e| {
        warn!(user_id = %user.id, error = %e, "Stored password hash is unreadable");
        false
    })
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::auth_events::NoOpAuthEventListener;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    #[test]
    fn test_hash_password() {
        let hash = hash_password("test_password_123").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(hash.len() > 50);
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("test_password_123").unwrap();

        assert!(verify_password("test_password_123", &hash).unwrap());
        assert!(!verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        assert!(verify_password("test", "invalid_hash").is_err());
    }

    #[test]
    fn test_hash_password_salted() {
        let hash1 = hash_password("same_password").unwrap();
        let hash2 = hash_password("same_password").unwrap();

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_username_characters() {
        assert!(is_valid_username("kitty"));
        assert!(is_valid_username("first.last+tag@example-1_x"));
        assert!(!is_valid_username("has space"));
        assert!(!is_valid_username("semi;colon"));
        assert!(!is_valid_username(""));
    }

    fn service(allow_signup: bool) -> AccountService {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let config = AuthConfig {
            allow_signup,
            ..AuthConfig::default()
        };
        AccountService::new(
            UserRepository::new(db),
            Arc::new(NoOpAuthEventListener),
            &config,
        )
    }

    #[tokio::test]
    async fn test_signup_disabled() {
        let input = SignupInput {
            username: "kitty".to_string(),
            password: "password123".to_string(),
            password_confirmation: "password123".to_string(),
        };

        let result = service(false).signup(input).await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_signup_confirmation_mismatch() {
        let input = SignupInput {
            username: "kitty".to_string(),
            password: "password123".to_string(),
            password_confirmation: "password124".to_string(),
        };

        let result = service(true).signup(input).await;

        match result {
            Err(AppError::Validation(msg)) => assert_eq!(msg, FORM_NOT_VALID),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_authenticate_by_token_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );
        let service = AccountService::new(
            UserRepository::new(db),
            Arc::new(NoOpAuthEventListener),
            &AuthConfig::default(),
        );

        let result = service.authenticate_by_token("missing").await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }
}
