//! Identity backend configuration parsed from environment variables.

use super::types::IdentityError;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityConfig {
    /// Backend base URL without a trailing slash.
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl IdentityConfig {
    /// Build typed backend config from environment variables.
    ///
    /// Required:
    /// - `IDENTITY_URL`: backend base URL
    ///
    /// Optional:
    /// - `IDENTITY_REQUEST_TIMEOUT_SECS`: default 10
    /// - `IDENTITY_CONNECT_TIMEOUT_SECS`: default 5
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::MissingBaseUrl`] when `IDENTITY_URL` is unset
    /// or blank. This is a fatal configuration error, not a retryable one.
    pub fn from_env() -> Result<Self, IdentityError> {
        let base_url = std::env::var("IDENTITY_URL")
            .ok()
            .map(|v| v.trim().trim_end_matches('/').to_owned())
            .filter(|v| !v.is_empty())
            .ok_or(IdentityError::MissingBaseUrl { var: "IDENTITY_URL".into() })?;

        Ok(Self {
            base_url,
            request_timeout_secs: env_parse_u64("IDENTITY_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_timeout_secs: env_parse_u64("IDENTITY_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        })
    }
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
