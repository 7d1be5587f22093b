use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Admin password + session settings used by the login handler.
///
/// The password never reaches any client; login verifies it server-side and
/// issues a short-lived token whose digest is checked on every admin request.
#[derive(Clone)]
pub struct AdminState {
    password: Option<Arc<str>>,
    pub session_ttl_secs: i64,
}

impl AdminState {
    /// Builds admin settings from config.
    ///
    /// In development a missing password disables admin login for local
    /// iteration. In non-development envs a missing password fails startup.
    ///
    /// # Errors
    ///
    /// Returns an error outside development when `SOVDB_ADMIN_PASSWORD` is
    /// unset.
    pub fn from_config(
        password: Option<&str>,
        session_ttl_secs: u64,
        is_development: bool,
    ) -> anyhow::Result<Self> {
        let ttl = i64::try_from(session_ttl_secs).unwrap_or(i64::MAX);

        match password {
            Some(p) if !p.trim().is_empty() => Ok(Self {
                password: Some(Arc::from(p)),
                session_ttl_secs: ttl,
            }),
            _ if is_development => {
                tracing::warn!(
                    "SOVDB_ADMIN_PASSWORD not set; admin login disabled in development environment"
                );
                Ok(Self {
                    password: None,
                    session_ttl_secs: ttl,
                })
            }
            _ => anyhow::bail!(
                "SOVDB_ADMIN_PASSWORD is required outside development; set it server-side only"
            ),
        }
    }

    #[must_use]
    pub fn login_enabled(&self) -> bool {
        self.password.is_some()
    }

    /// Constant-time password check.
    #[must_use]
    pub fn verify_password(&self, candidate: &str) -> bool {
        self.password.as_ref().is_some_and(|expected| {
            expected.as_bytes().ct_eq(candidate.as_bytes()).into()
        })
    }
}

/// Lowercase hex SHA-256 of a session token; the only form ever stored.
#[must_use]
pub fn token_digest(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    digest.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

/// State for the admin-session middleware: validation happens against the
/// `admin_sessions` table on every request.
#[derive(Clone)]
pub struct AdminSessionGuard {
    pub pool: PgPool,
}

#[derive(Debug, Clone)]
struct RateLimitWindow {
    started_at: Instant,
    count: usize,
}

/// Fixed-window limiter for simple API protection.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    state: Arc<Mutex<RateLimitWindow>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            state: Arc::new(Mutex::new(RateLimitWindow {
                started_at: Instant::now(),
                count: 0,
            })),
        }
    }
}

#[derive(Debug, Serialize)]
struct MiddlewareErrorBody {
    error: MiddlewareError,
}

#[derive(Debug, Serialize)]
struct MiddlewareError {
    code: &'static str,
    message: &'static str,
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware validating the `x-admin-token` header against unexpired
/// `admin_sessions` rows. Auth failures are always surfaced, never sampled.
pub async fn require_admin_session(
    State(guard): State<AdminSessionGuard>,
    req: Request,
    next: Next,
) -> Response {
    let token = req
        .headers()
        .get("x-admin-token")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let Some(token) = token else {
        return admin_unauthorized("missing x-admin-token header");
    };

    match sovdb_db::is_valid_admin_session(&guard.pool, &token_digest(token)).await {
        Ok(true) => next.run(req).await,
        Ok(false) => admin_unauthorized("invalid or expired admin session"),
        Err(e) => {
            tracing::error!(error = %e, "admin session lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MiddlewareErrorBody {
                    error: MiddlewareError {
                        code: "internal_error",
                        message: "admin session lookup failed",
                    },
                }),
            )
                .into_response()
        }
    }
}

fn admin_unauthorized(message: &'static str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(MiddlewareErrorBody {
            error: MiddlewareError {
                code: "unauthorized",
                message,
            },
        }),
    )
        .into_response()
}

/// Middleware enforcing a fixed request-per-window limit.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let mut window = rate_limit.state.lock().await;
    let elapsed = window.started_at.elapsed();

    if elapsed >= rate_limit.window {
        window.started_at = Instant::now();
        window.count = 0;
    }

    if window.count >= rate_limit.max_requests {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(MiddlewareErrorBody {
                error: MiddlewareError {
                    code: "rate_limited",
                    message: "rate limit exceeded",
                },
            }),
        )
            .into_response();
    }

    window.count += 1;
    drop(window);

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_digest_is_stable_lowercase_hex() {
        let digest = token_digest("session-token");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(digest, token_digest("session-token"));
        assert_ne!(digest, token_digest("other-token"));
    }

    #[test]
    fn verify_password_accepts_exact_match_only() {
        let state = AdminState::from_config(Some("hunter2"), 1_800, false).expect("configured");
        assert!(state.verify_password("hunter2"));
        assert!(!state.verify_password("hunter"));
        assert!(!state.verify_password("hunter22"));
    }

    #[test]
    fn missing_password_disables_login_in_dev() {
        let state = AdminState::from_config(None, 1_800, true).expect("dev allows missing");
        assert!(!state.login_enabled());
        assert!(!state.verify_password("anything"));
    }

    #[test]
    fn missing_password_fails_startup_outside_dev() {
        assert!(AdminState::from_config(None, 1_800, false).is_err());
        assert!(AdminState::from_config(Some("   "), 1_800, false).is_err());
    }
}
