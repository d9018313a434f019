//! Crate-wide error type

use thiserror::Error;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, HabitusError>;

/// Errors raised by habitus infrastructure
#[derive(Debug, Error)]
pub enum HabitusError {
    /// MongoDB connection, query, or index failures
    #[error("database error: {0}")]
    Database(String),

    /// Token generation/validation and password hashing failures
    #[error("auth error: {0}")]
    Auth(String),

    /// Malformed requests and body-read failures at the HTTP edge
    #[error("http error: {0}")]
    Http(String),

    /// Socket-level failures (bind, accept)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
