use super::*;

fn held_bundle() -> Tokens {
    Tokens {
        auth_token: "auth-1".into(),
        refresh_token: Some("refresh-1".into()),
        csrf_token: Some("csrf-1".into()),
    }
}

// =============================================================================
// merge_refreshed
// =============================================================================

#[test]
fn merge_replaces_auth_token() {
    let fresh = TokenResponse { auth_token: "auth-2".into(), refresh_token: None, csrf_token: None };
    let merged = merge_refreshed(&held_bundle(), fresh);
    assert_eq!(merged.auth_token, "auth-2");
}

#[test]
fn merge_keeps_held_optionals_when_response_omits_them() {
    // The usual rotation: new auth token, refresh/csrf untouched.
    let fresh = TokenResponse { auth_token: "auth-2".into(), refresh_token: None, csrf_token: None };
    let merged = merge_refreshed(&held_bundle(), fresh);
    assert_eq!(merged.refresh_token.as_deref(), Some("refresh-1"));
    assert_eq!(merged.csrf_token.as_deref(), Some("csrf-1"));
}

#[test]
fn merge_prefers_fresh_optionals_when_present() {
    let fresh = TokenResponse {
        auth_token: "auth-2".into(),
        refresh_token: Some("refresh-2".into()),
        csrf_token: Some("csrf-2".into()),
    };
    let merged = merge_refreshed(&held_bundle(), fresh);
    assert_eq!(merged.refresh_token.as_deref(), Some("refresh-2"));
    assert_eq!(merged.csrf_token.as_deref(), Some("csrf-2"));
}

#[test]
fn merge_with_empty_held_optionals_stays_empty() {
    let held = Tokens { auth_token: "auth-1".into(), refresh_token: None, csrf_token: None };
    let fresh = TokenResponse { auth_token: "auth-2".into(), refresh_token: None, csrf_token: None };
    let merged = merge_refreshed(&held, fresh);
    assert_eq!(merged.refresh_token, None);
    assert_eq!(merged.csrf_token, None);
}

// =============================================================================
// wire parsing
// =============================================================================

#[test]
fn token_response_parses_full_payload() {
    let parsed: TokenResponse =
        serde_json::from_str(r#"{"auth_token":"a","refresh_token":"r","csrf_token":"c"}"#).unwrap();
    assert_eq!(parsed.auth_token, "a");
    assert_eq!(parsed.refresh_token.as_deref(), Some("r"));
    assert_eq!(parsed.csrf_token.as_deref(), Some("c"));
}

#[test]
fn token_response_parses_auth_only_payload() {
    let parsed: TokenResponse = serde_json::from_str(r#"{"auth_token":"a"}"#).unwrap();
    assert_eq!(parsed.auth_token, "a");
    assert_eq!(parsed.refresh_token, None);
    assert_eq!(parsed.csrf_token, None);
}

#[test]
fn token_response_without_auth_token_is_an_error() {
    let result: Result<TokenResponse, _> = serde_json::from_str(r#"{"refresh_token":"r"}"#);
    assert!(result.is_err());
}

// =============================================================================
// backend construction
// =============================================================================

#[test]
fn backend_builds_from_config() {
    let config = IdentityConfig {
        base_url: "http://localhost:4000".into(),
        request_timeout_secs: 1,
        connect_timeout_secs: 1,
    };
    let backend = HttpIdentityBackend::from_config(&config).unwrap();

    // A fresh client holds exactly what it was seeded with.
    let client = backend.client(Some(held_bundle()));
    assert_eq!(client.tokens(), Some(held_bundle()));
    let client = backend.client(None);
    assert_eq!(client.tokens(), None);
}
