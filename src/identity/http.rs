//! HTTP identity backend client.
//!
//! Thin reqwest wrapper over the backend's auth API (`/api/auth/v1/*`).
//! Request and connect timeouts come from [`IdentityConfig`], so a slow
//! backend fails a call instead of hanging the request that triggered it.
//! Pure token merging lives in `merge_refreshed` for testability.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::config::IdentityConfig;
use super::types::{IdentityApi, IdentityBackend, IdentityError, User};
use crate::services::tokens::Tokens;

// =============================================================================
// BACKEND (CLIENT FACTORY)
// =============================================================================

pub struct HttpIdentityBackend {
    base_url: String,
    http: reqwest::Client,
}

impl HttpIdentityBackend {
    /// Build the backend handle and its shared HTTP connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::HttpClientBuild`] if the reqwest client
    /// cannot be constructed.
    pub fn from_config(config: &IdentityConfig) -> Result<Self, IdentityError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| IdentityError::HttpClientBuild(e.to_string()))?;
        Ok(Self { base_url: config.base_url.clone(), http })
    }
}

impl IdentityBackend for HttpIdentityBackend {
    fn client(&self, tokens: Option<Tokens>) -> Arc<dyn IdentityApi> {
        Arc::new(HttpIdentityClient {
            base_url: self.base_url.clone(),
            http: self.http.clone(),
            held: Mutex::new(tokens),
        })
    }
}

// =============================================================================
// PER-REQUEST CLIENT
// =============================================================================

struct HttpIdentityClient {
    base_url: String,
    http: reqwest::Client,
    /// Bundle currently held by this client. Never locked across an await;
    /// rotated whole on login/refresh so a reader sees old or new, not a mix.
    held: Mutex<Option<Tokens>>,
}

impl HttpIdentityClient {
    fn held(&self) -> MutexGuard<'_, Option<Tokens>> {
        self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/auth/v1/{path}", self.base_url)
    }

    async fn read_body(response: reqwest::Response) -> Result<(u16, String), IdentityError> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| IdentityError::Request(e.to_string()))?;
        Ok((status, body))
    }
}

#[async_trait::async_trait]
impl IdentityApi for HttpIdentityClient {
    async fn login(&self, email: &str, password: &str) -> Result<(), IdentityError> {
        let response = self
            .http
            .post(self.url("login"))
            .json(&LoginRequest { email, password })
            .send()
            .await
            .map_err(|e| IdentityError::Request(e.to_string()))?;

        let (status, body) = Self::read_body(response).await?;
        if !(200..300).contains(&status) {
            return Err(IdentityError::Rejected { status, body });
        }

        let issued: TokenResponse = serde_json::from_str(&body).map_err(|e| IdentityError::Parse(e.to_string()))?;
        *self.held() = Some(Tokens {
            auth_token: issued.auth_token,
            refresh_token: issued.refresh_token,
            csrf_token: issued.csrf_token,
        });
        Ok(())
    }

    async fn refresh(&self) -> Result<(), IdentityError> {
        let current = self.held().clone().ok_or(IdentityError::NoCredentials)?;
        let refresh_token = current
            .refresh_token
            .clone()
            .ok_or(IdentityError::NoCredentials)?;

        let response = self
            .http
            .post(self.url("refresh"))
            .bearer_auth(&current.auth_token)
            .json(&RefreshRequest { refresh_token: &refresh_token })
            .send()
            .await
            .map_err(|e| IdentityError::Request(e.to_string()))?;

        let (status, body) = Self::read_body(response).await?;
        if !(200..300).contains(&status) {
            return Err(IdentityError::Rejected { status, body });
        }

        let rotated: TokenResponse = serde_json::from_str(&body).map_err(|e| IdentityError::Parse(e.to_string()))?;
        *self.held() = Some(merge_refreshed(&current, rotated));
        Ok(())
    }

    fn tokens(&self) -> Option<Tokens> {
        self.held().clone()
    }

    async fn user(&self) -> Option<User> {
        let auth_token = self.held().as_ref().map(|t| t.auth_token.clone())?;

        let response = self
            .http
            .get(self.url("me"))
            .bearer_auth(auth_token)
            .send()
            .await
            .ok()?;

        if !response.status().is_success() {
            return None;
        }
        response.json::<User>().await.ok()
    }

    async fn revoke(&self) -> Result<(), IdentityError> {
        let current = self.held().clone().ok_or(IdentityError::NoCredentials)?;

        let response = self
            .http
            .post(self.url("logout"))
            .bearer_auth(&current.auth_token)
            .json(&LogoutRequest { refresh_token: current.refresh_token.as_deref() })
            .send()
            .await
            .map_err(|e| IdentityError::Request(e.to_string()))?;

        let (status, body) = Self::read_body(response).await?;
        if !(200..300).contains(&status) {
            return Err(IdentityError::Rejected { status, body });
        }
        Ok(())
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(serde::Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(serde::Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(serde::Serialize)]
struct LogoutRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<&'a str>,
}

#[derive(Debug, serde::Deserialize)]
struct TokenResponse {
    auth_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    csrf_token: Option<String>,
}

// =============================================================================
// MERGING
// =============================================================================

/// Merge a refresh response over the previously held bundle.
///
/// The auth token is always replaced; refresh and CSRF tokens keep their
/// prior values when the backend omits them (a refresh response normally
/// rotates the auth token only).
fn merge_refreshed(held: &Tokens, fresh: TokenResponse) -> Tokens {
    Tokens {
        auth_token: fresh.auth_token,
        refresh_token: fresh.refresh_token.or_else(|| held.refresh_token.clone()),
        csrf_token: fresh.csrf_token.or_else(|| held.csrf_token.clone()),
    }
}

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;
