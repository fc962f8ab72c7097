//! Boundary-side services.
//!
//! Service modules own the token lifecycle and cookie codec so route handlers
//! stay focused on protocol translation.

pub mod session;
pub mod tokens;
