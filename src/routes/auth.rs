/**
 * Authentication Routes
 * Single admin account, JWT access tokens and rotating refresh tokens
 */
use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::distr::{Alphanumeric, SampleString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::{collections::HashMap, net::SocketAddr};
use tokio::sync::RwLock;

use crate::error::ApiError;

// ============================================================================
// Configuration
// ============================================================================

pub const DEFAULT_JWT_SECRET: &str = "default-jwt-secret-change-in-production";

lazy_static::lazy_static! {
    pub static ref JWT_SECRET: String = std::env::var("JWT_SECRET")
        .unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string());

    pub static ref ADMIN_EMAIL: String = std::env::var("ADMIN_EMAIL")
        .unwrap_or_else(|_| "admin@ningratwedding.id".to_string());

    /// bcrypt hash from ADMIN_HASH_PASSWORD, else ADMIN_PASSWORD hashed at
    /// first use, else the development password `admin123`.
    pub static ref ADMIN_PASSWORD_HASH: String = match std::env::var("ADMIN_HASH_PASSWORD") {
        Ok(hashed) => hashed,
        Err(_) => {
            let plain = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string());
            hash(&plain, DEFAULT_COST).unwrap_or_default()
        }
    };

    static ref REFRESH_TOKENS: RefreshTokenStore = RefreshTokenStore::default();

    // Router tests log in repeatedly from one mock address.
    static ref LOGIN_LIMITER: LoginRateLimiter =
        LoginRateLimiter::new(if cfg!(test) { 0 } else { RATE_LIMIT_WINDOW_SECS });
}

const ACCESS_TOKEN_EXPIRY_MINUTES: i64 = 15;
const REFRESH_TOKEN_EXPIRY_DAYS: i64 = 7;

/// One login attempt per IP per window.
const RATE_LIMIT_WINDOW_SECS: i64 = 10;

const ADMIN_USER_ID: &str = "admin";
const ADMIN_ROLE: &str = "ADMIN";

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Clone)]
struct RefreshTokenData {
    email: String,
    expires_at: i64,
    revoked: bool,
}

impl RefreshTokenData {
    fn usable(&self, now: i64) -> bool {
        !self.revoked && self.expires_at > now
    }
}

/// Refresh tokens keyed by their SHA-256 hash. Lost on restart.
#[derive(Default)]
struct RefreshTokenStore {
    tokens: RwLock<HashMap<String, RefreshTokenData>>,
}

impl RefreshTokenStore {
    /// Issue and remember a fresh token for `email`. Revoked and expired
    /// entries are dropped on the way.
    async fn issue(&self, email: &str) -> String {
        let token = Alphanumeric.sample_string(&mut rand::rng(), 64);
        let now = Utc::now();

        let mut tokens = self.tokens.write().await;
        tokens.retain(|_, data| data.usable(now.timestamp()));
        tokens.insert(
            hash_refresh_token(&token),
            RefreshTokenData {
                email: email.to_string(),
                expires_at: (now + Duration::days(REFRESH_TOKEN_EXPIRY_DAYS)).timestamp(),
                revoked: false,
            },
        );
        token
    }

    /// Revoke `token` and return its owner if it was still usable.
    async fn consume(&self, token: &str) -> Option<String> {
        let now = Utc::now().timestamp();
        let mut tokens = self.tokens.write().await;
        let data = tokens.get_mut(&hash_refresh_token(token))?;
        if !data.usable(now) {
            return None;
        }
        data.revoked = true;
        Some(data.email.clone())
    }

    async fn revoke(&self, token: &str) {
        if let Some(data) = self.tokens.write().await.get_mut(&hash_refresh_token(token)) {
            data.revoked = true;
        }
    }

    async fn revoke_all(&self, email: &str) {
        for data in self.tokens.write().await.values_mut() {
            if data.email == email {
                data.revoked = true;
            }
        }
    }
}

/// IP -> time of the last login attempt.
struct LoginRateLimiter {
    window_secs: i64,
    attempts: RwLock<HashMap<String, i64>>,
}

impl LoginRateLimiter {
    fn new(window_secs: i64) -> Self {
        Self {
            window_secs,
            attempts: RwLock::new(HashMap::new()),
        }
    }

    /// False when `ip` already tried within the window. Stale entries are
    /// evicted on every call so the map tracks active IPs only.
    async fn allow(&self, ip: &str, now: i64) -> bool {
        let mut attempts = self.attempts.write().await;
        attempts.retain(|_, last| now - *last < self.window_secs);
        if attempts.contains_key(ip) {
            return false;
        }
        attempts.insert(ip.to_string(), now);
        true
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub user_id: String,
    pub email: String,
    pub role: String,
}

impl UserInfo {
    fn admin(email: &str) -> Self {
        Self {
            user_id: ADMIN_USER_ID.to_string(),
            email: email.to_string(),
            role: ADMIN_ROLE.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub user: Option<UserInfo>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LoginResponse {
    fn failed(status: StatusCode, error: &str) -> (StatusCode, Json<Self>) {
        (
            status,
            Json(Self {
                error: Some(error.to_string()),
                ..Self::default()
            }),
        )
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub success: bool,
    pub is_valid: bool,
    pub user: Option<UserInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub success: bool,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RefreshResponse {
    fn failed(status: StatusCode, error: &str) -> (StatusCode, Json<Self>) {
        (
            status,
            Json(Self {
                error: Some(error.to_string()),
                ..Self::default()
            }),
        )
    }
}

#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

// ============================================================================
// Helper Functions
// ============================================================================

fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub(crate) fn create_access_token(email: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: ADMIN_USER_ID.to_string(),
        email: email.to_string(),
        role: ADMIN_ROLE.to_string(),
        exp: (now + Duration::minutes(ACCESS_TOKEN_EXPIRY_MINUTES)).timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
}

pub fn verify_access_token(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(JWT_SECRET.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

async fn check_credentials(email: &str, password: &str) -> bool {
    if !email.eq_ignore_ascii_case(&ADMIN_EMAIL) {
        return false;
    }
    let password = password.to_string();
    // bcrypt is CPU-bound; keep it off the async workers.
    tokio::task::spawn_blocking(move || verify(&password, &ADMIN_PASSWORD_HASH).unwrap_or(false))
        .await
        .unwrap_or(false)
}

// ============================================================================
// Admin session extractor
// ============================================================================

/// Proof of an authenticated admin. Rejects with 401 JSON, or a redirect to
/// the login page when the client asked for HTML.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub claims: Claims,
}

impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let reason = match extract_bearer_token(&parts.headers).map(verify_access_token) {
            Some(Ok(claims)) if claims.role == ADMIN_ROLE => return Ok(AdminSession { claims }),
            Some(Ok(_)) | Some(Err(_)) => "Invalid or expired token",
            None => "Authorization required",
        };

        tracing::debug!(uri = %parts.uri, reason, "admin session rejected");

        let wants_html = parts
            .headers
            .get(header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|accept| accept.contains("text/html"));
        if wants_html {
            return Err(Redirect::to("/login").into_response());
        }
        Err(ApiError::Unauthorized(reason.to_string()).into_response())
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/login
pub async fn login(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(payload): Json<LoginRequest>,
) -> impl IntoResponse {
    let ip = addr.ip().to_string();

    if !LOGIN_LIMITER.allow(&ip, Utc::now().timestamp()).await {
        return LoginResponse::failed(
            StatusCode::TOO_MANY_REQUESTS,
            "Too many requests. Please try again later.",
        );
    }

    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return LoginResponse::failed(StatusCode::BAD_REQUEST, "Email and password are required");
    }
    if !payload.email.contains('@') {
        return LoginResponse::failed(StatusCode::BAD_REQUEST, "Invalid email format");
    }

    let email = payload.email.trim().to_lowercase();
    if !check_credentials(&email, &payload.password).await {
        tracing::warn!(%ip, %email, "failed admin login");
        return LoginResponse::failed(StatusCode::UNAUTHORIZED, "Invalid credentials");
    }

    let access_token = match create_access_token(&email) {
        Ok(token) => token,
        Err(e) => {
            tracing::error!("Failed to create access token: {}", e);
            return LoginResponse::failed(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create token",
            );
        }
    };
    let refresh_token = REFRESH_TOKENS.issue(&email).await;

    tracing::info!(%ip, %email, "admin logged in");
    (
        StatusCode::OK,
        Json(LoginResponse {
            success: true,
            user: Some(UserInfo::admin(&email)),
            access_token: Some(access_token),
            refresh_token: Some(refresh_token),
            error: None,
        }),
    )
}

/// POST /api/auth/verify
pub async fn verify_token(headers: HeaderMap) -> impl IntoResponse {
    let result = match extract_bearer_token(&headers) {
        None => Err("No authorization token provided"),
        Some(token) => verify_access_token(token).map_err(|e| {
            tracing::debug!("Token verification failed: {}", e);
            "Invalid or expired token"
        }),
    };

    let body = match result {
        Ok(claims) => VerifyResponse {
            success: true,
            is_valid: true,
            user: Some(UserInfo {
                user_id: claims.sub,
                email: claims.email,
                role: claims.role,
            }),
            error: None,
        },
        Err(error) => VerifyResponse {
            success: false,
            is_valid: false,
            user: None,
            error: Some(error.to_string()),
        },
    };
    (StatusCode::OK, Json(body))
}

/// POST /api/auth/refresh
/// Exchange a refresh token for a new access token. The refresh token is
/// rotated: the presented one is revoked.
pub async fn refresh(Json(payload): Json<RefreshRequest>) -> impl IntoResponse {
    if payload.refresh_token.is_empty() {
        return RefreshResponse::failed(StatusCode::BAD_REQUEST, "Refresh token is required");
    }

    let Some(email) = REFRESH_TOKENS.consume(&payload.refresh_token).await else {
        return RefreshResponse::failed(
            StatusCode::UNAUTHORIZED,
            "Invalid or expired refresh token",
        );
    };

    let access_token = match create_access_token(&email) {
        Ok(token) => token,
        Err(e) => {
            tracing::error!("Failed to create access token: {}", e);
            return RefreshResponse::failed(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create token",
            );
        }
    };
    let refresh_token = REFRESH_TOKENS.issue(&email).await;

    (
        StatusCode::OK,
        Json(RefreshResponse {
            success: true,
            access_token: Some(access_token),
            refresh_token: Some(refresh_token),
            error: None,
        }),
    )
}

/// POST /api/auth/logout
/// Revokes the given refresh token; with a valid bearer token, revokes every
/// refresh token of the admin. Always succeeds.
pub async fn logout(headers: HeaderMap, body: Option<Json<LogoutRequest>>) -> impl IntoResponse {
    let payload = body.map(|Json(p)| p).unwrap_or_default();

    if let Some(refresh_token) = payload.refresh_token {
        REFRESH_TOKENS.revoke(&refresh_token).await;
    }

    if let Some(Ok(claims)) = extract_bearer_token(&headers).map(verify_access_token) {
        REFRESH_TOKENS.revoke_all(&claims.email).await;
        tracing::info!(email = %claims.email, "admin logged out");
    }

    (StatusCode::OK, Json(LogoutResponse { success: true }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::{get, post};
    use axum::Router;
    use tower::ServiceExt;

    fn auth_router() -> Router {
        use axum::extract::connect_info::MockConnectInfo;

        Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/verify", post(verify_token))
            .route("/api/auth/refresh", post(refresh))
            .route("/api/auth/logout", post(logout))
            .route("/admin-only", get(|_: AdminSession| async { "ok" }))
            .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 12345))))
    }

    async fn post_json(
        app: Router,
        uri: &str,
        json: &impl serde::Serialize,
    ) -> (StatusCode, axum::body::Bytes) {
        let body = Body::from(serde_json::to_vec(json).unwrap());
        let req = Request::post(uri)
            .header("content-type", "application/json")
            .body(body)
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes)
    }

    #[test]
    fn test_verify_access_token_invalid_returns_err() {
        assert!(verify_access_token("invalid.jwt.token").is_err());
    }

    #[test]
    fn test_access_token_round_trip() {
        let token = create_access_token("owner@example.com").unwrap();
        let claims = verify_access_token(&token).unwrap();
        assert_eq!(claims.email, "owner@example.com");
        assert_eq!(claims.role, ADMIN_ROLE);
        assert!(claims.exp > claims.iat);
    }

    #[tokio::test]
    async fn test_login_empty_email_returns_bad_request() {
        let (status, _) = post_json(
            auth_router(),
            "/api/auth/login",
            &LoginRequest {
                email: "".to_string(),
                password: "admin123".to_string(),
            },
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_invalid_email_format_returns_bad_request() {
        let (status, _) = post_json(
            auth_router(),
            "/api/auth/login",
            &LoginRequest {
                email: "no-at-sign".to_string(),
                password: "admin123".to_string(),
            },
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_wrong_credentials_returns_unauthorized() {
        let (status, bytes) = post_json(
            auth_router(),
            "/api/auth/login",
            &LoginRequest {
                email: "someone@example.com".to_string(),
                password: "wrongpassword".to_string(),
            },
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let body: LoginResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(!body.success);
        assert!(body.access_token.is_none());
    }

    #[tokio::test]
    async fn test_verify_no_token_returns_error_in_body() {
        let req = Request::post("/api/auth/verify").body(Body::empty()).unwrap();
        let res = auth_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: VerifyResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(!body.success);
        assert!(!body.is_valid);
    }

    #[tokio::test]
    async fn test_refresh_rotates_token() {
        let first = REFRESH_TOKENS.issue("owner@example.com").await;

        let (status, bytes) = post_json(
            auth_router(),
            "/api/auth/refresh",
            &RefreshRequest {
                refresh_token: first.clone(),
            },
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let body: RefreshResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(body.success);
        assert!(body.access_token.is_some());
        assert_ne!(body.refresh_token.as_deref(), Some(first.as_str()));

        // The presented token was revoked by the rotation.
        let (status, _) = post_json(
            auth_router(),
            "/api/auth/refresh",
            &RefreshRequest {
                refresh_token: first,
            },
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_refresh_empty_token_returns_bad_request() {
        let (status, _) = post_json(
            auth_router(),
            "/api/auth/refresh",
            &RefreshRequest {
                refresh_token: "".to_string(),
            },
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_logout_revokes_refresh_token() {
        let token = REFRESH_TOKENS.issue("owner@example.com").await;
        let (status, bytes) = post_json(
            auth_router(),
            "/api/auth/logout",
            &LogoutRequest {
                refresh_token: Some(token.clone()),
            },
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let body: LogoutResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(body.success);

        let (status, _) = post_json(
            auth_router(),
            "/api/auth/refresh",
            &RefreshRequest {
                refresh_token: token,
            },
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_session_requires_bearer_token() {
        let req = Request::get("/admin-only").body(Body::empty()).unwrap();
        let res = auth_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let token = create_access_token("owner@example.com").unwrap();
        let req = Request::get("/admin-only")
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        let res = auth_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_admin_session_redirects_browsers_to_login() {
        let req = Request::get("/admin-only")
            .header("accept", "text/html,application/xhtml+xml")
            .body(Body::empty())
            .unwrap();
        let res = auth_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()["location"], "/login");
    }

    #[tokio::test]
    async fn test_rate_limiter_window() {
        let limiter = LoginRateLimiter::new(RATE_LIMIT_WINDOW_SECS);
        assert!(limiter.allow("10.0.0.1", 1_000).await);
        assert!(!limiter.allow("10.0.0.1", 1_005).await);
        assert!(limiter.allow("10.0.0.2", 1_005).await);
        assert!(limiter.allow("10.0.0.1", 1_010).await);
    }

    #[tokio::test]
    async fn test_revoke_all_for_email() {
        let store = RefreshTokenStore::default();
        let a = store.issue("owner@example.com").await;
        let b = store.issue("owner@example.com").await;
        let other = store.issue("other@example.com").await;

        store.revoke_all("owner@example.com").await;
        assert_eq!(store.consume(&a).await, None);
        assert_eq!(store.consume(&b).await, None);
        assert_eq!(store.consume(&other).await.as_deref(), Some("other@example.com"));
        assert_eq!(store.consume(&other).await, None);
    }
}
