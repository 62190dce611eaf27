//! Session guard.
//!
//! Runs in front of every route. The caller's credential is read from the
//! `Authorization: Bearer` header or the session cookie and resolved through
//! a [`SessionStore`]. [`GuardPolicy::decide`] then allows the request,
//! rejects it, or redirects the browser.

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::{FromRequestParts, Query, State};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use database::models::Session;
use database::{session, Database};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::state::AppState;

/// Query parameter carrying the page to return to after sign-in.
pub const REDIRECT_PARAM: &str = "redirectedFrom";

/// The signed-in caller, inserted into request extensions by the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: String,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(ApiError::Unauthorized)
    }
}

/// Resolves opaque session tokens issued by the identity provider.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// The live session for `token`, if any.
    async fn resolve(&self, token: &str) -> database::Result<Option<Session>>;
}

/// [`SessionStore`] over the `sessions` table.
pub struct DatabaseSessions {
    db: Database,
}

impl DatabaseSessions {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionStore for DatabaseSessions {
    async fn resolve(&self, token: &str) -> database::Result<Option<Session>> {
        session::resolve_session(self.db.pool(), token).await
    }
}

/// What to do with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    /// API request without a session.
    Unauthorized,
    /// Page request without a session; sign in, then come back here.
    RedirectToLogin { redirected_from: String },
    /// Signed-in caller landing on home with a pending return target.
    RedirectBack(String),
}

/// Which paths are reachable without a session.
#[derive(Debug, Clone)]
pub struct GuardPolicy {
    pub public_paths: Vec<String>,
    pub public_prefixes: Vec<String>,
}

impl Default for GuardPolicy {
    fn default() -> Self {
        Self {
            public_paths: [
                "/",
                "/health",
                "/api/webhook/paystack",
                "/payment/verify",
                "/api/payment/verify",
                "/reset-password",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            public_prefixes: ["/api/auth", "/static", "/_next"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl GuardPolicy {
    /// Whether `path` is reachable without a session.
    pub fn is_public(&self, path: &str) -> bool {
        if self.public_paths.iter().any(|p| p == path) {
            return true;
        }
        if self
            .public_prefixes
            .iter()
            .any(|prefix| path == prefix || path.starts_with(&format!("{}/", prefix)))
        {
            return true;
        }
        // Static assets such as /favicon.ico or /logo.png. Never API routes.
        !is_api_path(path) && path.rsplit('/').next().is_some_and(|last| last.contains('.'))
    }

    /// Decide what to do with a request for `path`.
    pub fn decide(
        &self,
        path: &str,
        redirected_from: Option<&str>,
        has_session: bool,
    ) -> GuardDecision {
        if has_session {
            if path == "/" {
                if let Some(target) = redirected_from.filter(|t| is_local_target(t)) {
                    return GuardDecision::RedirectBack(target.to_string());
                }
            }
            return GuardDecision::Allow;
        }

        if self.is_public(path) {
            return GuardDecision::Allow;
        }

        if is_api_path(path) {
            GuardDecision::Unauthorized
        } else {
            GuardDecision::RedirectToLogin {
                redirected_from: path.to_string(),
            }
        }
    }
}

fn is_api_path(path: &str) -> bool {
    path == "/api" || path.starts_with("/api/")
}

/// Only same-origin paths are valid redirect targets.
fn is_local_target(target: &str) -> bool {
    target.starts_with('/') && !target.starts_with("//") && !target.contains('\\')
}

/// The sign-in location remembering `path`.
fn login_location(path: &str) -> String {
    format!("/?{}={}", REDIRECT_PARAM, urlencoding::encode(path))
}

/// The session token carried by a request.
///
/// A bearer token wins over cookies. Cookies are read under `cookie_name`
/// and its `__Secure-` variant.
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        return Some(token.to_string());
    }

    let secure_name = format!("__Secure-{}", cookie_name);
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| (*name == cookie_name || *name == secure_name) && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

#[derive(Debug, Default, Deserialize)]
struct GuardQuery {
    #[serde(rename = "redirectedFrom")]
    redirected_from: Option<String>,
}

/// Middleware enforcing [`GuardPolicy`] on every request.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();

    let user = match session_token(req.headers(), &state.config.session_cookie) {
        Some(token) => match state.sessions.resolve(&token).await {
            Ok(session) => session.map(|s| CurrentUser { user_id: s.user_id }),
            Err(e) => {
                warn!("Session lookup failed, treating as signed out: {}", e);
                None
            }
        },
        None => None,
    };

    let query = Query::<GuardQuery>::try_from_uri(req.uri())
        .map(|Query(q)| q)
        .unwrap_or_default();

    match state
        .policy
        .decide(&path, query.redirected_from.as_deref(), user.is_some())
    {
        GuardDecision::Allow => {
            if let Some(user) = user {
                req.extensions_mut().insert(user);
            }
            next.run(req).await
        }
        GuardDecision::Unauthorized => {
            debug!(path = %path, "Rejecting unauthenticated API request");
            ApiError::Unauthorized.into_response()
        }
        GuardDecision::RedirectToLogin { redirected_from } => {
            debug!(path = %path, "Redirecting to sign-in");
            Redirect::to(&login_location(&redirected_from)).into_response()
        }
        GuardDecision::RedirectBack(target) => Redirect::to(&target).into_response(),
    }
}
