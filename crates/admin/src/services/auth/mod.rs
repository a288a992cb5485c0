//! Password authentication.
//!
//! Passwords are stored as Argon2id PHC strings in the `user_credentials`
//! collection and never leave the server.

mod error;

pub use error::AuthError;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use binh_vuong_core::user::{CredentialVerifier, User};

use crate::state::AppState;

/// Argon2id with the crate's default parameters and a random salt per hash.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Verifier;

impl CredentialVerifier for Argon2Verifier {
    fn hash(&self, password: &str) -> Result<String, String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| e.to_string())
    }

    fn verify(&self, password: &str, stored_hash: &str) -> bool {
        PasswordHash::new(stored_hash).is_ok_and(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
    }
}

/// Login and password hashing against the current snapshot.
pub struct AuthService<'a> {
    state: &'a AppState,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Check a username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown user or a wrong
    /// password.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let factory = self.state.read().await;
        let user = factory
            .authenticate(username.trim(), password, self.state.verifier())
            .cloned();
        drop(factory);

        match user {
            Some(user) => {
                tracing::info!(user_id = %user.id, role = %user.role, "Login succeeded");
                Ok(user)
            }
            None => {
                tracing::warn!("Login rejected");
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    /// Hash a new password for storage.
    ///
    /// Argon2 is CPU bound, so the work runs on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Hashing` if the hasher fails or its task panics.
    pub async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let verifier = *self.state.verifier();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || verifier.hash(&password))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
            .map_err(AuthError::Hashing)
    }
}
