//! Request extractors.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRef, FromRequestParts, OriginalUri},
    http::request::Parts,
};
use polls_common::AppError;
use polls_db::entities::user;

/// Authenticated user extractor.
///
/// Anonymous requests are rejected with a login redirect that remembers the
/// path they asked for.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by auth middleware
        parts
            .extensions
            .get::<user::Model>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| AppError::LoginRequired {
                next: requested_path(parts),
            })
    }
}

/// Optional authenticated user extractor.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<user::Model>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<user::Model>().cloned()))
    }
}

/// Authenticated administrator extractor.
#[derive(Debug, Clone)]
pub struct AdminUser(pub user::Model);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }
        Ok(Self(user))
    }
}

/// Whether `X-Forwarded-For` may name the client.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProxyPolicy {
    /// Set only when a reverse proxy rewrites the header.
    pub trust_forwarded_for: bool,
}

/// Client address for audit logs.
///
/// The TCP peer by default. The first `X-Forwarded-For` hop is used only
/// when the [`ProxyPolicy`] trusts it.
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
    ProxyPolicy: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = if ProxyPolicy::from_ref(state).trust_forwarded_for {
            parts
                .headers
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        } else {
            None
        };

        let ip = forwarded
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip().to_string())
            })
            .unwrap_or_else(|| "unknown".to_string());

        Ok(Self(ip))
    }
}

/// Path (and query) the client originally asked for, before nesting.
fn requested_path(parts: &Parts) -> String {
    let uri = parts
        .extensions
        .get::<OriginalUri>()
        .map_or(&parts.uri, |OriginalUri(uri)| uri);

    uri.path_and_query()
        .map_or_else(|| uri.path().to_string(), ToString::to_string)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(req: Request<()>) -> Parts {
        req.into_parts().0
    }

    #[tokio::test]
    async fn test_auth_user_rejects_with_original_path() {
        let mut parts = parts(
            Request::builder()
                .uri("/polls/3")
                .extension(OriginalUri("/api/polls/3".parse().unwrap()))
                .body(())
                .unwrap(),
        );

        let result = AuthUser::from_request_parts(&mut parts, &()).await;

        match result {
            Err(AppError::LoginRequired { next }) => assert_eq!(next, "/api/polls/3"),
            other => panic!("expected LoginRequired, got {other:?}"),
        }
    }

    const TRUSTED: ProxyPolicy = ProxyPolicy {
        trust_forwarded_for: true,
    };

    fn forwarded_request(addr: SocketAddr) -> Parts {
        parts(
            Request::builder()
                .uri("/")
                .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
                .extension(ConnectInfo(addr))
                .body(())
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_client_ip_ignores_forwarded_header_by_default() {
        let addr: SocketAddr = "192.0.2.1:4000".parse().unwrap();
        let mut parts = forwarded_request(addr);

        let ClientIp(ip) = ClientIp::from_request_parts(&mut parts, &ProxyPolicy::default())
            .await
            .unwrap();

        assert_eq!(ip, "192.0.2.1");
    }

    #[tokio::test]
    async fn test_client_ip_uses_forwarded_header_behind_trusted_proxy() {
        let addr: SocketAddr = "192.0.2.1:4000".parse().unwrap();
        let mut parts = forwarded_request(addr);

        let ClientIp(ip) = ClientIp::from_request_parts(&mut parts, &TRUSTED)
            .await
            .unwrap();

        assert_eq!(ip, "203.0.113.7");
    }

    #[tokio::test]
    async fn test_client_ip_falls_back_to_peer() {
        let addr: SocketAddr = "192.0.2.1:4000".parse().unwrap();
        let mut parts = parts(
            Request::builder()
                .uri("/")
                .extension(ConnectInfo(addr))
                .body(())
                .unwrap(),
        );

        let ClientIp(ip) = ClientIp::from_request_parts(&mut parts, &TRUSTED)
            .await
            .unwrap();

        assert_eq!(ip, "192.0.2.1");
    }
}
