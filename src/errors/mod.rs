//! # Error Handling
//!
//! Crate-wide error type and result alias. HTTP mapping lives in `api::error`.

pub mod types;

pub use types::{AuthErrorType, ContactbookError, Result};
