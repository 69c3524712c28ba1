//! # REST API Components
//!
//! HTTP routing, middleware and request/response handling for the contacts
//! service.

#[cfg(feature = "openapi")]
pub mod docs;
pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use routes::{build_router, ApiState};
pub use server::start_api_server;
