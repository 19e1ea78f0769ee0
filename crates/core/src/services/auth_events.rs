//! Authentication event hooks.
//!
//! The account service reports sign-ins, sign-outs and failed sign-ins to an
//! [`AuthEventListener`]. Voting never depends on it.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Something that happened to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// Credentials were accepted.
    LoggedIn { username: String, ip: String },
    /// A session was ended and its token rotated.
    LoggedOut { username: String, ip: String },
    /// Credentials were rejected. `username` is what the client sent.
    LoginFailed { username: String, ip: String },
}

/// Receiver for authentication events.
#[async_trait]
pub trait AuthEventListener: Send + Sync {
    /// Handle one event. Listeners must not fail the request.
    async fn on_event(&self, event: &AuthEvent);
}

/// Writes every event to the tracing log.
#[derive(Clone, Default)]
pub struct TracingAuthEventListener;

#[async_trait]
impl AuthEventListener for TracingAuthEventListener {
    async fn on_event(&self, event: &AuthEvent) {
        match event {
            AuthEvent::LoggedIn { username, ip } => {
                info!("user: {username} - login using ip: {ip}");
            }
            AuthEvent::LoggedOut { username, ip } => {
                info!("user: {username} - logout using ip: {ip}");
            }
            AuthEvent::LoginFailed { username, ip } => {
                warn!("user: {username} - failed to login using ip: {ip}");
            }
        }
    }
}

/// A listener that drops every event.
#[derive(Clone, Default)]
pub struct NoOpAuthEventListener;

#[async_trait]
impl AuthEventListener for NoOpAuthEventListener {
    async fn on_event(&self, _event: &AuthEvent) {}
}

/// Shared listener handle.
pub type AuthEventListenerService = Arc<dyn AuthEventListener>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording(Mutex<Vec<AuthEvent>>);

    #[async_trait]
    impl AuthEventListener for Recording {
        async fn on_event(&self, event: &AuthEvent) {
            if let Ok(mut events) = self.0.lock() {
                events.push(event.clone());
            }
        }
    }

    #[tokio::test]
    async fn test_listener_trait_object_receives_events() {
        let recording = Arc::new(Recording::default());
        let listener: AuthEventListenerService = recording.clone();

        listener
            .on_event(&AuthEvent::LoggedIn {
                username: "kitty".to_string(),
                ip: "127.0.0.1".to_string(),
            })
            .await;

        let events = recording.0.lock().map(|e| e.clone()).unwrap_or_default();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], AuthEvent::LoggedIn { username, .. } if username == "kitty"));
    }

    #[tokio::test]
    async fn test_builtin_listeners_accept_all_events() {
        let event = AuthEvent::LoginFailed {
            username: "nobody".to_string(),
            ip: "10.0.0.1".to_string(),
        };
        TracingAuthEventListener.on_event(&event).await;
        NoOpAuthEventListener.on_event(&event).await;
    }
}
