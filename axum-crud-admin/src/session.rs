//! Session gate
//!
//! Every request to the panel passes through [`session_gate`]: it resolves
//! the session token from the request cookie against the authentication
//! collaborator ([`SessionStore`]), redirects unauthenticated requests to
//! the login path, and bounces authenticated requests off the login page
//! back into the panel. The resolved [`SessionContext`] travels in request
//! extensions; there is no module-level session state.

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::pages;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "crm_session";

/// Explicit session context for one authenticated admin
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub token: String,
    pub email: String,
}

/// The authentication collaborator
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Verify credentials and open a session
    async fn login(&self, email: &str, password: &str) -> Option<SessionContext>;

    /// Resolve a session token to its context
    async fn resolve(&self, token: &str) -> Option<SessionContext>;

    /// Close a session
    async fn logout(&self, token: &str);
}

/// In-memory session store guarding a single admin credential
pub struct InMemorySessionStore {
    admin_email: String,
    admin_password: String,
    sessions: RwLock<HashMap<String, String>>,
}

impl InMemorySessionStore {
    pub fn new(admin_email: impl Into<String>, admin_password: impl Into<String>) -> Self {
        Self {
            admin_email: admin_email.into(),
            admin_password: admin_password.into(),
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn login(&self, email: &str, password: &str) -> Option<SessionContext> {
        if email != self.admin_email || password != self.admin_password {
            tracing::warn!(email, "rejected login attempt");
            return None;
        }

        let token = uuid::Uuid::new_v4().to_string();
        self.sessions
            .write()
            .await
            .insert(token.clone(), email.to_string());
        tracing::info!(email, "session opened");
        Some(SessionContext {
            token,
            email: email.to_string(),
        })
    }

    async fn resolve(&self, token: &str) -> Option<SessionContext> {
        self.sessions
            .read()
            .await
            .get(token)
            .map(|email| SessionContext {
                token: token.to_string(),
                email: email.clone(),
            })
    }

    async fn logout(&self, token: &str) {
        if self.sessions.write().await.remove(token).is_some() {
            tracing::info!("session closed");
        }
    }
}

/// State required by the gate middleware and the login handlers
#[derive(Clone)]
pub struct GateState {
    pub sessions: Arc<dyn SessionStore>,
    pub base_path: Arc<String>,
}

impl GateState {
    fn login_path(&self) -> String {
        format!("{}/login", self.base_path)
    }
}

/// Gate decision for one request
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateOutcome {
    /// Let the request through
    Proceed,

    /// Unauthenticated request to a protected path
    RedirectToLogin,

    /// Authenticated request to the login path
    RedirectToPanel,
}

/// Pure gate policy: every path except the login path is protected
pub fn gate(path: &str, login_path: &str, authenticated: bool) -> GateOutcome {
    let on_login_page = path == login_path;
    match (authenticated, on_login_page) {
        (false, false) => GateOutcome::RedirectToLogin,
        (true, true) => GateOutcome::RedirectToPanel,
        _ => GateOutcome::Proceed,
    }
}

/// Extract the session token from a Cookie header value
pub fn session_token(cookie_header: &str) -> Option<&str> {
    cookie_header.split(';').find_map(|pair| {
        let mut parts = pair.trim().splitn(2, '=');
        match (parts.next(), parts.next()) {
            (Some(name), Some(value)) if name == SESSION_COOKIE => Some(value),
            _ => None,
        }
    })
}

fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(session_token)
        .map(str::to_string)
}

/// Middleware applying the gate policy to every panel request
pub async fn session_gate(
    State(state): State<GateState>,
    mut request: Request,
    next: Next,
) -> Response {
    let session = match token_from_headers(request.headers()) {
        Some(token) => state.sessions.resolve(&token).await,
        None => None,
    };

    let login_path = state.login_path();
    match gate(request.uri().path(), &login_path, session.is_some()) {
        GateOutcome::Proceed => {
            if let Some(session) = session {
                request.extensions_mut().insert(session);
            }
            next.run(request).await
        }
        GateOutcome::RedirectToLogin => Redirect::to(&login_path).into_response(),
        GateOutcome::RedirectToPanel => Redirect::to(&state.base_path).into_response(),
    }
}

/// Login form body
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Handler for GET {base}/login
pub async fn login_page_handler(State(state): State<GateState>) -> Html<String> {
    Html(pages::login_page(&state.base_path, None))
}

/// Handler for POST {base}/login
pub async fn login_submit_handler(
    State(state): State<GateState>,
    Form(form): Form<LoginForm>,
) -> Response {
    match state.sessions.login(&form.email, &form.password).await {
        Some(session) => {
            let cookie = format!(
                "{}={}; Path=/; HttpOnly; SameSite=Lax",
                SESSION_COOKIE, session.token
            );
            (
                [(header::SET_COOKIE, cookie)],
                Redirect::to(&state.base_path),
            )
                .into_response()
        }
        None => (
            StatusCode::UNAUTHORIZED,
            Html(pages::login_page(
                &state.base_path,
                Some("Ongeldige inloggegevens"),
            )),
        )
            .into_response(),
    }
}

/// Handler for POST {base}/logout
pub async fn logout_handler(State(state): State<GateState>, headers: HeaderMap) -> Response {
    if let Some(token) = token_from_headers(&headers) {
        state.sessions.logout(&token).await;
    }

    let cookie = format!("{}=; Path=/; HttpOnly; Max-Age=0", SESSION_COOKIE);
    (
        [(header::SET_COOKIE, cookie)],
        Redirect::to(&state.login_path()),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_redirects_unauthenticated_to_login() {
        assert_eq!(
            gate("/admin/t/klanten", "/admin/login", false),
            GateOutcome::RedirectToLogin
        );
        assert_eq!(
            gate("/admin", "/admin/login", false),
            GateOutcome::RedirectToLogin
        );
    }

    #[test]
    fn test_gate_lets_login_page_through_unauthenticated() {
        assert_eq!(
            gate("/admin/login", "/admin/login", false),
            GateOutcome::Proceed
        );
    }

    #[test]
    fn test_gate_bounces_authenticated_off_login_page() {
        assert_eq!(
            gate("/admin/login", "/admin/login", true),
            GateOutcome::RedirectToPanel
        );
        assert_eq!(
            gate("/admin/t/klanten", "/admin/login", true),
            GateOutcome::Proceed
        );
    }

    #[test]
    fn test_session_token_parsing() {
        assert_eq!(
            session_token("crm_session=abc123"),
            Some("abc123")
        );
        assert_eq!(
            session_token("theme=dark; crm_session=abc123; lang=nl"),
            Some("abc123")
        );
        assert_eq!(session_token("theme=dark"), None);
        assert_eq!(session_token(""), None);
    }

    #[tokio::test]
    async fn test_store_login_resolve_logout() {
        let store = InMemorySessionStore::new("admin@example.com", "geheim");

        assert!(store.login("admin@example.com", "fout").await.is_none());
        assert!(store.login("ander@example.com", "geheim").await.is_none());

        let session = store.login("admin@example.com", "geheim").await.unwrap();
        let resolved = store.resolve(&session.token).await.unwrap();
        assert_eq!(resolved.email, "admin@example.com");

        store.logout(&session.token).await;
        assert!(store.resolve(&session.token).await.is_none());
    }
}
