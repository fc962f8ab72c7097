//! Token lifecycle manager — the boundary side of session handling.
//!
//! ARCHITECTURE
//! ============
//! Every operation runs per request and is strictly sequential: read the
//! cookie jar, talk to the identity backend, then persist or clear the jar.
//! The jar is passed by value and returned updated, so there is no shared
//! mutable credential state between requests.
//!
//! TRADE-OFFS
//! ==========
//! Any refresh failure is session-invalidating: cookies are cleared before
//! the failure surfaces, so a caller can never observe a stale bundle after a
//! failed refresh. Retry policy, if any, belongs to the backend client.

use axum_extra::extract::cookie::CookieJar;

use crate::identity::types::{IdentityApi, IdentityBackend, IdentityError, User};
use crate::services::tokens::{self, CookiePolicy};

/// Errors surfaced to login callers. Everything else in this module is
/// absorbed into state transitions.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Login rejected by the backend. The backend's reason is logged but
    /// never forwarded, to avoid leaking account-enumeration signals.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The backend accepted the login but returned no token bundle.
    /// A deployment problem, not a user error.
    #[error("identity backend did not return auth tokens")]
    MissingTokens,
}

/// Resolve the current session from the request's credential cookies.
///
/// Absent cookies resolve to `None` immediately with zero backend calls.
/// Present cookies go through a refresh-and-persist cycle first; a failed
/// refresh clears the jar and resolves to `None` rather than erroring.
pub async fn resolve_current_session(
    backend: &dyn IdentityBackend,
    policy: &CookiePolicy,
    jar: CookieJar,
) -> (CookieJar, Option<User>) {
    let Some(held) = tokens::read_tokens(&jar) else {
        tracing::debug!("no credential cookies; session unresolved");
        return (jar, None);
    };

    let client = backend.client(Some(held));
    let jar = match refresh_and_persist(client.as_ref(), policy, jar).await {
        Ok(jar) => jar,
        Err((jar, error)) => {
            tracing::warn!(error = %error, "token refresh failed; credentials cleared");
            return (jar, None);
        }
    };

    let user = client.user().await;
    tracing::debug!(user_resolved = user.is_some(), "session resolved");
    (jar, user)
}

/// Refresh the held bundle and re-persist it with configured lifetimes.
///
/// On failure the jar comes back with all three cookies cleared — clearing
/// happens before the error is returned, which is the atomicity guarantee.
async fn refresh_and_persist(
    client: &dyn IdentityApi,
    policy: &CookiePolicy,
    jar: CookieJar,
) -> Result<CookieJar, (CookieJar, IdentityError)> {
    if let Err(error) = client.refresh().await {
        return Err((tokens::clear_tokens(jar), error));
    }

    Ok(match client.tokens() {
        Some(rotated) => tokens::persist_tokens(jar, &rotated, policy),
        None => jar,
    })
}

/// Authenticate with email + password and persist the issued bundle.
///
/// Identity resolution after login is best-effort: a backend that issues
/// tokens but cannot resolve a user still counts as a successful login.
///
/// # Errors
///
/// [`SessionError::InvalidCredentials`] when the backend rejects the login;
/// [`SessionError::MissingTokens`] when it accepts but issues no bundle.
pub async fn login(
    backend: &dyn IdentityBackend,
    policy: &CookiePolicy,
    jar: CookieJar,
    email: &str,
    password: &str,
) -> Result<(CookieJar, Option<User>), SessionError> {
    let client = backend.client(None);

    if let Err(error) = client.login(email, password).await {
        tracing::warn!(error = %error, email, "login rejected by identity backend");
        return Err(SessionError::InvalidCredentials);
    }

    let Some(bundle) = client.tokens() else {
        tracing::error!(email, "login succeeded but backend returned no tokens");
        return Err(SessionError::MissingTokens);
    };

    let jar = tokens::persist_tokens(jar, &bundle, policy);

    let user = client.user().await;
    if user.is_none() {
        // Token-only session: the backend issued credentials it cannot
        // resolve to an identity. Accepted, but worth seeing in the field.
        tracing::warn!(email, "login succeeded without a resolvable user");
    } else {
        tracing::info!(email, "login succeeded");
    }

    Ok((jar, user))
}

/// Revoke the session remotely when possible and always clear the cookies.
///
/// Revoke errors are swallowed: logout is defined to succeed locally
/// regardless of the remote outcome, and clearing is unconditionally last.
pub async fn logout(backend: &dyn IdentityBackend, jar: CookieJar) -> CookieJar {
    if let Some(held) = tokens::read_tokens(&jar) {
        let client = backend.client(Some(held));
        if let Err(error) = client.revoke().await {
            tracing::warn!(error = %error, "remote revoke failed; clearing local session anyway");
        }
    }

    tokens::clear_tokens(jar)
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
