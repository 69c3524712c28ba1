//! # Repositories
//!
//! SQLx-backed data access behind async traits, one module per table.

pub mod contact;
pub mod user;

pub use contact::{ContactRepository, SqlxContactRepository};
pub use user::{SqlxUserRepository, UserRepository};
