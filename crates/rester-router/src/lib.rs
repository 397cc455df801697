//! # Rester Router
//!
//! Registers controllers (types built from nested layers) at paths and binds
//! each HTTP verb a controller declares to a method chain:
//!
//! ```text
//! Router
//!   "/users"  ─▶ Users   GET ─▶ chain "get"   (Control → Auth → Users)
//!                        POST ─▶ chain "post"
//!   "/health" ─▶ Health  GET ─▶ chain "get"
//! ```
//!
//! The router only keeps the registry; it carries no transport. A server
//! integration parses the request, builds a [`Resolver`](rester_core::Resolver)
//! for it and calls [`Router::dispatch`].

pub mod config;
pub mod error;
pub mod method;
pub mod router;

pub use config::RouterConfig;
pub use error::RouteError;
pub use method::Method;
pub use router::{Route, Router};
