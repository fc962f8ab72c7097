//! Auth routes — session resolution, login, logout over credential cookies.
//!
//! Handlers are thin protocol translation over `services::session`: extract
//! the jar, run the lifecycle operation, return the updated jar with the
//! response so cookie writes land on the same request/response cycle.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use crate::identity::types::User;
use crate::services::session::{self as session_svc, SessionError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: Option<User>,
}

/// `GET /api/auth/session` — resolve the current session from cookies,
/// refreshing credentials when possible. Never errors: an unresolvable
/// session is `{"user": null}`.
pub async fn current_session(State(state): State<AppState>, jar: CookieJar) -> Response {
    let (jar, user) = session_svc::resolve_current_session(state.backend.as_ref(), &state.cookies, jar).await;
    (jar, Json(SessionResponse { user })).into_response()
}

/// `POST /api/auth/login` — authenticate and persist the token bundle.
///
/// Credential rejection maps to 401 with a stable message the UI displays
/// verbatim; a backend that issues no tokens is a 500.
pub async fn login(State(state): State<AppState>, jar: CookieJar, Json(body): Json<LoginRequest>) -> Response {
    match session_svc::login(state.backend.as_ref(), &state.cookies, jar, &body.email, &body.password).await {
        Ok((jar, user)) => (jar, Json(SessionResponse { user })).into_response(),
        Err(error @ SessionError::InvalidCredentials) => {
            (StatusCode::UNAUTHORIZED, error.to_string()).into_response()
        }
        Err(error @ SessionError::MissingTokens) => {
            tracing::error!(error = %error, "login misconfigured");
            (StatusCode::INTERNAL_SERVER_ERROR, error.to_string()).into_response()
        }
    }
}

/// `POST /api/auth/logout` — revoke remotely when possible, always clear the
/// credential cookies.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    let jar = session_svc::logout(state.backend.as_ref(), jar).await;
    (jar, StatusCode::NO_CONTENT).into_response()
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
