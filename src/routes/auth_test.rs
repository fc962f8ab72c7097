use super::*;
use axum::http::HeaderMap;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum_extra::extract::cookie::CookieJar;

use crate::services::tokens;
use crate::state::test_helpers::{MockBackend, alice, full_bundle, test_app_state};

async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_owned())
        .collect()
}

// Jar as the extractor would build it from a real request. Seeding through
// the request Cookie header matters: the jar only emits removal Set-Cookie
// entries for cookies it saw on the request, not for same-response additions.
fn seeded_jar() -> CookieJar {
    let mut headers = HeaderMap::new();
    headers.insert(
        COOKIE,
        "tb_auth_token=auth-1; tb_refresh_token=refresh-1; tb_csrf_token=csrf-1"
            .parse()
            .unwrap(),
    );
    CookieJar::from_headers(&headers)
}

// =============================================================================
// GET /api/auth/session
// =============================================================================

#[tokio::test]
async fn session_without_cookies_is_null_user() {
    let backend = MockBackend::new();
    let state = test_app_state(&backend);

    let response = current_session(State(state), CookieJar::new()).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, r#"{"user":null}"#);
    assert_eq!(backend.clients_created(), 0);
}

#[tokio::test]
async fn session_with_failed_refresh_clears_cookies_in_response() {
    // Default mock refresh fails; the response must carry removal cookies.
    let backend = MockBackend::new();
    let state = test_app_state(&backend);

    let response = current_session(State(state), seeded_jar()).await;

    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    for name in [tokens::AUTH_COOKIE, tokens::REFRESH_COOKIE, tokens::CSRF_COOKIE] {
        assert!(
            cookies
                .iter()
                .any(|c| c.starts_with(&format!("{name}=")) && c.contains("Max-Age=0")),
            "expected removal cookie for {name}, got {cookies:?}"
        );
    }
}

// =============================================================================
// POST /api/auth/login
// =============================================================================

#[tokio::test]
async fn login_success_sets_cookies_and_returns_user() {
    let backend = MockBackend::new()
        .with_login_issuing(Some(full_bundle()))
        .with_user(alice());
    let state = test_app_state(&backend);

    let body = LoginRequest { email: "a@b.com".into(), password: "pw".into() };
    let response = login(State(state), CookieJar::new(), Json(body)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    assert!(cookies.iter().any(|c| c.starts_with("tb_auth_token=auth-1")), "{cookies:?}");
    assert!(cookies.iter().any(|c| c.starts_with("tb_refresh_token=refresh-1")));
    assert!(body_string(response).await.contains("alice@example.com"));
}

#[tokio::test]
async fn login_rejection_is_401_with_stable_body() {
    let backend = MockBackend::new();
    let state = test_app_state(&backend);

    let body = LoginRequest { email: "a@b.com".into(), password: "wrong".into() };
    let response = login(State(state), CookieJar::new(), Json(body)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(&response).is_empty());
    assert_eq!(body_string(response).await, "invalid email or password");
}

#[tokio::test]
async fn login_without_issued_tokens_is_500() {
    let backend = MockBackend::new().with_login_issuing(None);
    let state = test_app_state(&backend);

    let body = LoginRequest { email: "a@b.com".into(), password: "pw".into() };
    let response = login(State(state), CookieJar::new(), Json(body)).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

// =============================================================================
// POST /api/auth/logout
// =============================================================================

#[tokio::test]
async fn logout_is_204_and_clears_cookies() {
    let backend = MockBackend::new();
    let state = test_app_state(&backend);

    let response = logout(State(state), seeded_jar()).await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cookies = set_cookies(&response);
    for name in [tokens::AUTH_COOKIE, tokens::REFRESH_COOKIE, tokens::CSRF_COOKIE] {
        assert!(
            cookies
                .iter()
                .any(|c| c.starts_with(&format!("{name}=")) && c.contains("Max-Age=0")),
            "expected removal cookie for {name}"
        );
    }
    assert_eq!(backend.revoke_calls(), 1);
}

#[tokio::test]
async fn logout_still_clears_when_revoke_fails() {
    let backend = MockBackend::new().with_revoke_failing();
    let state = test_app_state(&backend);

    let response = logout(State(state), seeded_jar()).await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(
        set_cookies(&response)
            .iter()
            .any(|c| c.starts_with("tb_auth_token=") && c.contains("Max-Age=0"))
    );
}
