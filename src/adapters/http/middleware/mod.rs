//! HTTP middleware for axum.
//!
//! - `auth` - Forwarded-identity middleware and extractors

pub mod auth;

pub use auth::{identity_middleware, AuthRejection, OptionalAuth, RequireAuth};
