//! Identity backend — the external collaborator that issues, refreshes, and
//! revokes credentials and resolves them to a user.
//!
//! DESIGN
//! ======
//! Consumed through two traits so the lifecycle manager and the client store
//! never depend on transport details: [`IdentityBackend`] hands out a fresh
//! stateful [`IdentityApi`] client per request, and tests substitute scripted
//! implementations for both.

pub mod config;
pub mod http;
pub mod types;

pub use config::IdentityConfig;
pub use http::HttpIdentityBackend;
pub use types::{IdentityApi, IdentityBackend, IdentityError, User};
