//! # Error Types
//!
//! Error types for the contactbook service using `thiserror`.

use std::fmt;

use crate::storage::kv::StoreError;

/// Custom result type for contactbook operations
pub type Result<T> = std::result::Result<T, ContactbookError>;

/// Main error type for the contactbook service
#[derive(thiserror::Error, Debug)]
pub enum ContactbookError {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Database errors
    #[error("Database error: {context}")]
    Database {
        #[source]
        source: sqlx::Error,
        context: String,
    },

    /// Key-value store errors that could not be absorbed as best effort
    #[error("Key-value store error: {context}")]
    Storage {
        #[source]
        source: StoreError,
        context: String,
    },

    /// I/O errors with additional context
    #[error("I/O error: {context}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {context}")]
    Serialization {
        #[source]
        source: serde_json::Error,
        context: String,
    },

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// Authentication errors
    #[error("Authentication error: {message}")]
    Auth {
        message: String,
        error_type: AuthErrorType,
    },

    /// Authorization errors (authenticated but not allowed)
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    /// Internal server errors
    #[error("Internal server error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Resource not found errors
    #[error("Resource not found: {resource_type} with ID '{id}'")]
    NotFound {
        resource_type: String,
        id: String,
    },

    /// Resource conflict errors (e.g., already exists)
    #[error("Resource conflict: {message}")]
    Conflict {
        message: String,
        resource_type: String,
    },

    /// Rate limiting errors
    #[error("Rate limit exceeded: {message}")]
    RateLimit {
        message: String,
        retry_after: Option<u64>,
    },

    /// Media upload errors
    #[error("Upload error: {message}")]
    Upload { message: String },
}

/// Authentication error subtypes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorType {
    InvalidCredentials,
    InvalidToken,
    MissingToken,
    InvalidResetToken,
}

impl AuthErrorType {
    /// Client-facing message for this failure
    pub fn message(&self) -> &'static str {
        match self {
            AuthErrorType::InvalidCredentials => "Invalid credentials",
            AuthErrorType::InvalidToken => "Invalid or expired token",
            AuthErrorType::MissingToken => "Not authenticated",
            AuthErrorType::InvalidResetToken => "Invalid or expired reset token",
        }
    }
}

impl fmt::Display for AuthErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthErrorType::InvalidCredentials => write!(f, "invalid_credentials"),
            AuthErrorType::InvalidToken => write!(f, "invalid_token"),
            AuthErrorType::MissingToken => write!(f, "missing_token"),
            AuthErrorType::InvalidResetToken => write!(f, "invalid_reset_token"),
        }
    }
}

impl ContactbookError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a configuration error with source
    pub fn config_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Config { message: message.into(), source: Some(source) }
    }

    /// Create a database error with context
    pub fn database<S: Into<String>>(source: sqlx::Error, context: S) -> Self {
        Self::Database { source, context: context.into() }
    }

    /// Create a key-value store error with context
    pub fn storage<S: Into<String>>(source: StoreError, context: S) -> Self {
        Self::Storage { source, context: context.into() }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into(), field: None }
    }

    /// Create a validation error with field information
    pub fn validation_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Validation { message: message.into(), field: Some(field.into()) }
    }

    /// Create an authentication error carrying the canonical message for its type
    pub fn auth(error_type: AuthErrorType) -> Self {
        Self::Auth { message: error_type.message().to_string(), error_type }
    }

    /// Create a forbidden error
    pub fn forbidden<S: Into<String>>(message: S) -> Self {
        Self::Forbidden { message: message.into() }
    }

    /// Create an internal server error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal { message: message.into(), source: None }
    }

    /// Create an internal server error with source
    pub fn internal_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Internal { message: message.into(), source: Some(source) }
    }

    /// Create a not found error
    pub fn not_found<R: Into<String>, I: Into<String>>(resource_type: R, id: I) -> Self {
        Self::NotFound { resource_type: resource_type.into(), id: id.into() }
    }

    /// Create a conflict error
    pub fn conflict<M: Into<String>, R: Into<String>>(message: M, resource_type: R) -> Self {
        Self::Conflict { message: message.into(), resource_type: resource_type.into() }
    }

    /// Create a rate limit error
    pub fn rate_limit<S: Into<String>>(message: S, retry_after: Option<u64>) -> Self {
        Self::RateLimit { message: message.into(), retry_after }
    }

    /// Create an upload error
    pub fn upload<S: Into<String>>(message: S) -> Self {
        Self::Upload { message: message.into() }
    }

    /// Get the HTTP status code that should be returned for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ContactbookError::Config { .. } => 500,
            ContactbookError::Database { .. } => 500,
            ContactbookError::Storage { .. } => 500,
            ContactbookError::Io { .. } => 500,
            ContactbookError::Serialization { .. } => 400,
            ContactbookError::Validation { .. } => 400,
            ContactbookError::Auth { error_type: AuthErrorType::InvalidResetToken, .. } => 400,
            ContactbookError::Auth { .. } => 401,
            ContactbookError::Forbidden { .. } => 403,
            ContactbookError::Internal { .. } => 500,
            ContactbookError::NotFound { .. } => 404,
            ContactbookError::Conflict { .. } => 409,
            ContactbookError::RateLimit { .. } => 429,
            ContactbookError::Upload { .. } => 400,
        }
    }

    /// True when the database rejected a write because of a UNIQUE constraint
    pub fn is_unique_violation(&self) -> bool {
        match self {
            ContactbookError::Database { source: sqlx::Error::Database(db_err), .. } => {
                db_err.is_unique_violation()
            }
            _ => false,
        }
    }
}

// Error conversions for common external error types
impl From<sqlx::Error> for ContactbookError {
    fn from(error: sqlx::Error) -> Self {
        Self::Database { source: error, context: "Database operation failed".to_string() }
    }
}

impl From<sqlx::migrate::MigrateError> for ContactbookError {
    fn from(error: sqlx::migrate::MigrateError) -> Self {
        Self::Database {
            source: sqlx::Error::Migrate(Box::new(error)),
            context: "Database migration failed".to_string(),
        }
    }
}

impl From<StoreError> for ContactbookError {
    fn from(error: StoreError) -> Self {
        Self::Storage { source: error, context: "Key-value store operation failed".to_string() }
    }
}

impl From<std::io::Error> for ContactbookError {
    fn from(error: std::io::Error) -> Self {
        Self::Io { source: error, context: "I/O operation failed".to_string() }
    }
}

impl From<serde_json::Error> for ContactbookError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization { source: error, context: "JSON serialization failed".to_string() }
    }
}

impl From<config::ConfigError> for ContactbookError {
    fn from(error: config::ConfigError) -> Self {
        Self::config_with_source("Configuration loading failed", Box::new(error))
    }
}

impl From<validator::ValidationErrors> for ContactbookError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field_errors = errors.field_errors();
        let first_field = field_errors.keys().next().map(|field| field.to_string());

        let message = field_errors
            .iter()
            .map(|(field, field_errors)| {
                let error_messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string()))
                    .collect();
                format!("{}: {}", field, error_messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        Self::Validation { message: format!("Validation failed: {}", message), field: first_field }
    }
}
