//! User accounts and permission flags.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{UserId, UserRole};

/// Per-module visibility flags plus the two mutation switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct UserPermissions {
    pub dashboard: bool,
    pub orders: bool,
    pub models: bool,
    pub customers: bool,
    pub returns: bool,
    pub shipping: bool,
    /// Create and edit orders and product models.
    pub can_edit: bool,
    /// Hard-delete any record.
    pub can_delete: bool,
}

impl UserPermissions {
    /// The preset applied when an account of `role` is created.
    #[must_use]
    pub const fn defaults_for(role: UserRole) -> Self {
        match role {
            UserRole::Admin => Self {
                dashboard: true,
                orders: true,
                models: true,
                customers: true,
                returns: true,
                shipping: true,
                can_edit: true,
                can_delete: true,
            },
            UserRole::Technical => Self {
                dashboard: true,
                orders: true,
                models: true,
                customers: false,
                returns: true,
                shipping: true,
                can_edit: true,
                can_delete: false,
            },
            UserRole::Production => Self {
                dashboard: true,
                orders: true,
                models: true,
                customers: false,
                returns: true,
                shipping: true,
                can_edit: false,
                can_delete: false,
            },
            UserRole::Viewer => Self {
                dashboard: true,
                orders: true,
                models: true,
                customers: false,
                returns: false,
                shipping: false,
                can_edit: false,
                can_delete: false,
            },
        }
    }
}

/// A user account.
///
/// The password hash is never serialized; it is carried separately by the
/// persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub full_name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub permissions: UserPermissions,
}

impl User {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, UserRole::Admin)
    }
}

/// Submitted fields for creating or editing an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserForm {
    pub username: String,
    pub full_name: String,
    pub role: UserRole,
    /// Falls back to the role preset when omitted.
    #[serde(default)]
    pub permissions: Option<UserPermissions>,
}

/// Stored password hash of one user.
///
/// Persisted in its own collection and never returned to API clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCredential {
    pub user_id: UserId,
    pub password_hash: String,
}

/// Checks a password against a stored credential.
///
/// Implementations must use a salted slow hash.
pub trait CredentialVerifier {
    /// Hash a new password for storage.
    ///
    /// # Errors
    ///
    /// Returns an error string if hashing fails.
    fn hash(&self, password: &str) -> Result<String, String>;

    /// Whether `password` matches `stored_hash`.
    fn verify(&self, password: &str, stored_hash: &str) -> bool;
}
