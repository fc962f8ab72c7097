//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the identity backend handle and the cookie policy — both fixed at
//! startup. Per-request credential state lives in the cookie jar, never here.

use std::sync::Arc;

use crate::identity::types::IdentityBackend;
use crate::services::tokens::CookiePolicy;

/// Shared application state. Clone is required by Axum — inner fields are
/// Arc-wrapped or Copy.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn IdentityBackend>,
    pub cookies: CookiePolicy,
}

impl AppState {
    #[must_use]
    pub fn new(backend: Arc<dyn IdentityBackend>, cookies: CookiePolicy) -> Self {
        Self { backend, cookies }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
