//! Authentication error types.

use thiserror::Error;

/// Errors that can occur during login or password handling.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown username or wrong password. The two are not distinguished.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The password hasher failed.
    #[error("password hashing failed: {0}")]
    Hashing(String),
}
