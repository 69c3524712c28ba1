//! # Contactbook
//!
//! A multi-tenant contacts backend. Every user owns a private address book;
//! accounts sign up with email and password, authenticate with HS256 bearer
//! tokens and can reset a forgotten password through a single-use emailed
//! token.
//!
//! ## Architecture
//!
//! ```text
//! REST API (axum) → Auth Gateway → User Directory (SQLite)
//!        ↓                ↓
//!  Contact Service   User Cache / Reset Ledger → Key-Value Store (memory | Redis)
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use contactbook::{api::start_api_server, config::AppConfig, startup::build_state, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AppConfig::load()?;
//!     let state = build_state(&config).await?;
//!     start_api_server(&config, state).await
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod errors;
pub mod observability;
pub mod services;
pub mod startup;
pub mod storage;

pub use config::AppConfig;
pub use errors::{ContactbookError, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
