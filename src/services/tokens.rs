//! Credential cookie codec — the token bundle and its persistence policy.
//!
//! CONTRACT
//! ========
//! Three cookies make up the credential state other components must honor:
//! `tb_auth_token` (short-lived, mandatory for "has session"),
//! `tb_refresh_token` and `tb_csrf_token` (long-lived, optional). All are
//! `HttpOnly`, `SameSite=Lax`, path `/`. The bundle is persisted or cleared
//! as a unit; a jar can never hold a refresh token without an auth token.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

pub const AUTH_COOKIE: &str = "tb_auth_token";
pub const REFRESH_COOKIE: &str = "tb_refresh_token";
pub const CSRF_COOKIE: &str = "tb_csrf_token";

const AUTH_MAX_AGE: Duration = Duration::hours(1);
const LONG_MAX_AGE: Duration = Duration::days(30);

/// Opaque credential bundle issued by the identity backend.
///
/// `auth_token` is structurally mandatory: a bundle without one cannot exist,
/// which is what makes a partial cookie write unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tokens {
    pub auth_token: String,
    pub refresh_token: Option<String>,
    pub csrf_token: Option<String>,
}

/// Deployment-dependent cookie attributes, fixed at startup.
#[derive(Debug, Clone, Copy)]
pub struct CookiePolicy {
    /// Set the `Secure` attribute on every credential cookie.
    pub secure: bool,
}

impl CookiePolicy {
    /// `COOKIE_SECURE` wins when set; otherwise secure in production
    /// (`APP_ENV=production`).
    #[must_use]
    pub fn from_env() -> Self {
        let secure = env_bool("COOKIE_SECURE")
            .unwrap_or_else(|| std::env::var("APP_ENV").is_ok_and(|v| v.trim() == "production"));
        Self { secure }
    }
}

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

fn credential_cookie(name: &'static str, value: String, max_age: Duration, policy: &CookiePolicy) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(policy.secure)
        .max_age(max_age)
        .build()
}

fn read_optional(jar: &CookieJar, name: &str) -> Option<String> {
    jar.get(name)
        .map(Cookie::value)
        .filter(|v| !v.is_empty())
        .map(ToOwned::to_owned)
}

/// Read the credential bundle from the jar.
///
/// Returns `None` unless a non-empty auth cookie is present; refresh and CSRF
/// cookies are meaningless on their own. Empty values read as absent.
#[must_use]
pub fn read_tokens(jar: &CookieJar) -> Option<Tokens> {
    let auth = jar.get(AUTH_COOKIE).map(Cookie::value).unwrap_or_default();
    if auth.is_empty() {
        return None;
    }

    Some(Tokens {
        auth_token: auth.to_owned(),
        refresh_token: read_optional(jar, REFRESH_COOKIE),
        csrf_token: read_optional(jar, CSRF_COOKIE),
    })
}

/// Write the bundle into the jar, overwriting prior values.
///
/// The auth cookie is always written; refresh and CSRF cookies only when the
/// backend returned them, with their long lifetime.
#[must_use]
pub fn persist_tokens(jar: CookieJar, tokens: &Tokens, policy: &CookiePolicy) -> CookieJar {
    let mut jar = jar.add(credential_cookie(AUTH_COOKIE, tokens.auth_token.clone(), AUTH_MAX_AGE, policy));

    if let Some(refresh) = &tokens.refresh_token {
        jar = jar.add(credential_cookie(REFRESH_COOKIE, refresh.clone(), LONG_MAX_AGE, policy));
    }

    if let Some(csrf) = &tokens.csrf_token {
        jar = jar.add(credential_cookie(CSRF_COOKIE, csrf.clone(), LONG_MAX_AGE, policy));
    }

    jar
}

/// Remove all three credential cookies.
#[must_use]
pub fn clear_tokens(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build((AUTH_COOKIE, "")).path("/"))
        .remove(Cookie::build((REFRESH_COOKIE, "")).path("/"))
        .remove(Cookie::build((CSRF_COOKIE, "")).path("/"))
}

#[cfg(test)]
#[path = "tokens_test.rs"]
mod tests;
