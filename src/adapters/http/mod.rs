//! HTTP adapter - REST API over axum.
//!
//! Each area has its own `dto`, `handlers` and `routes`; they share one
//! [`AppState`] because every payment path goes through the same reconciler.

pub mod error;
pub mod middleware;
pub mod orders;
pub mod payments;
pub mod routes;
pub mod state;
pub mod webhooks;

pub use error::{ApiError, ErrorResponse};
pub use routes::api_router;
pub use state::{AppDependencies, AppState};
