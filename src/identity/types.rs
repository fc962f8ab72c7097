//! Identity backend types — user record, errors, and the client traits the
//! rest of the crate consumes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::tokens::Tokens;

/// Identity record resolved by the backend.
///
/// Opaque to this crate beyond presence or absence; fields exist only so the
/// record can round-trip to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
}

/// Errors produced by identity backend operations.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The required backend base URL environment variable is not set.
    #[error("identity backend URL is not configured: set {var}")]
    MissingBaseUrl { var: String },

    /// The HTTP request to the backend failed (includes timeouts).
    #[error("request failed: {0}")]
    Request(String),

    /// The backend returned a non-success HTTP status.
    #[error("backend rejected the call: status {status}")]
    Rejected { status: u16, body: String },

    /// The backend response body could not be deserialized.
    #[error("response parse failed: {0}")]
    Parse(String),

    /// The operation requires credentials the client does not hold.
    #[error("no credentials held for this operation")]
    NoCredentials,

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

/// A stateful per-request identity client.
///
/// The client holds the credential bundle it was seeded with; `login` and
/// `refresh` rotate it in place, and `tokens` snapshots whatever is currently
/// held. `user` is best-effort: any failure reads as "no resolvable identity".
#[async_trait::async_trait]
pub trait IdentityApi: Send + Sync {
    /// Authenticate with email + password, storing the issued bundle.
    async fn login(&self, email: &str, password: &str) -> Result<(), IdentityError>;

    /// Exchange the held refresh token for a rotated bundle.
    async fn refresh(&self) -> Result<(), IdentityError>;

    /// Snapshot of the currently held bundle.
    fn tokens(&self) -> Option<Tokens>;

    /// Resolve the held credentials to a user. Best-effort.
    async fn user(&self) -> Option<User>;

    /// Revoke the held credentials on the backend.
    async fn revoke(&self) -> Result<(), IdentityError>;
}

/// Factory for per-request identity clients.
///
/// Each request gets its own client seeded with the tokens read from that
/// request's cookies, so no credential state is shared across requests.
pub trait IdentityBackend: Send + Sync {
    fn client(&self, tokens: Option<Tokens>) -> Arc<dyn IdentityApi>;
}
