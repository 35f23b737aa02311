use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRef, FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::auth::{extract_bearer_token, AuthError, AuthService, ClientInfo, RateLimitConfig, UserSession};

pub const SESSION_COOKIE: &str = "session_token";

/// Session authentication middleware. Accepts `Authorization: Bearer` or the session cookie.
pub async fn session_auth_middleware(
    State(auth_service): State<AuthService>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = token_from_headers(request.headers())?;

    let session = auth_service.validate_session(&token).await?;

    request.extensions_mut().insert(session);

    Ok(next.run(request).await)
}

/// The bearer header wins over the cookie when both are present.
pub fn token_from_headers(headers: &HeaderMap) -> Result<String, AuthError> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        let auth_header = auth_header
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeaderFormat)?;
        return extract_bearer_token(auth_header).map(str::to_string);
    }

    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(AuthError::MissingAuthHeader)
}

/// Handler-side access to the session placed by [`session_auth_middleware`].
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserSession);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<UserSession>()
            .cloned()
            .map(AuthUser)
            .ok_or(AuthError::MissingAuthHeader)
    }
}

/// Client address and user agent, as recorded on new sessions.
#[async_trait]
impl<S> FromRequestParts<S> for ClientInfo
where
    RateLimiter: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let trust_proxy = RateLimiter::from_ref(state).trust_proxy;
        let user_agent = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.chars().take(512).collect());

        Ok(ClientInfo {
            ip_address: Some(client_ip(&parts.headers, parts.extensions.get(), trust_proxy))
                .filter(|ip| ip != "unknown"),
            user_agent,
        })
    }
}

/// Peer address of the connection. Forwarded headers are only read behind a trusted proxy,
/// since any client can set them.
fn client_ip(
    headers: &HeaderMap,
    connect_info: Option<&ConnectInfo<SocketAddr>>,
    trust_proxy: bool,
) -> String {
    let forwarded = || {
        headers
            .get("x-forwarded-for")
            .and_then(|header| header.to_str().ok())
            .and_then(|value| value.split(',').next())
            .or_else(|| headers.get("x-real-ip").and_then(|header| header.to_str().ok()))
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };

    trust_proxy
        .then(forwarded)
        .flatten()
        .or_else(|| connect_info.map(|ConnectInfo(addr)| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// CORS configuration; credentials require an explicit origin.
pub fn cors_layer(public_url: &str) -> CorsLayer {
    let origin = HeaderValue::from_str(public_url.trim_end_matches('/'))
        .map(AllowOrigin::exact)
        .unwrap_or_else(|_| AllowOrigin::list(Vec::<HeaderValue>::new()));

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::PATCH,
            axum::http::Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Security headers middleware
pub fn security_headers_layer() -> tower_http::set_header::SetResponseHeaderLayer<HeaderValue> {
    tower_http::set_header::SetResponseHeaderLayer::overriding(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    )
}

/// Sliding-window request counter keyed by client IP
#[derive(Debug, Clone)]
pub struct RateLimiter {
    requests: Arc<Mutex<HashMap<String, Vec<Instant>>>>,
    max_requests: usize,
    window: Duration,
    trust_proxy: bool,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            requests: Arc::new(Mutex::new(HashMap::new())),
            max_requests: config.max_requests,
            window: Duration::from_secs(config.window_seconds),
            trust_proxy: false,
        }
    }

    /// Key clients by `X-Forwarded-For` / `X-Real-IP` instead of the peer address.
    pub fn trusting_proxy(mut self, trust_proxy: bool) -> Self {
        self.trust_proxy = trust_proxy;
        self
    }

    pub fn check_rate_limit(&self, key: &str) -> bool {
        let mut requests = self
            .requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let now = Instant::now();

        // Forget clients whose window has fully passed
        requests.retain(|_, times| {
            times.retain(|&time| now.duration_since(time) < self.window);
            !times.is_empty()
        });

        let entry = requests.entry(key.to_string()).or_default();

        if entry.len() >= self.max_requests {
            return false;
        }

        entry.push(now);
        true
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

/// Rate limiting middleware function
pub async fn rate_limit_middleware(
    State(rate_limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let client_ip = client_ip(
        request.headers(),
        request.extensions().get(),
        rate_limiter.trust_proxy,
    );

    if !rate_limiter.check_rate_limit(&client_ip) {
        tracing::warn!(client_ip = %client_ip, path = %request.uri().path(), "Rate limit exceeded");
        return Err(AuthError::RateLimitExceeded);
    }

    Ok(next.run(request).await)
}
