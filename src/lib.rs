//! authgate — session and token lifecycle manager.
//!
//! Two cooperating components around an external identity backend:
//!
//! - [`store`]: the client-resident observable auth store — one snapshot,
//!   subscriber registry, single-flight session resolution.
//! - [`services`]: the boundary-resident token lifecycle manager — credential
//!   cookies, transparent refresh, atomic persist-or-clear.
//!
//! [`routes`] exposes the boundary over HTTP; [`identity`] holds the backend
//! traits and the reqwest client.

pub mod identity;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
