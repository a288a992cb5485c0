//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! bv-cli user create -u kythuat2 -n "Kỹ Thuật 2" -r tech -p secret
//! ```
//!
//! # Environment Variables
//!
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string
//! - `ADMIN_SEED_PASSWORD` - Password used when `-p` is omitted

use secrecy::ExposeSecret;

use binh_vuong_admin::services::{AuthService, FactoryService};
use binh_vuong_core::Action;
use binh_vuong_core::types::UserRole;
use binh_vuong_core::user::UserForm;

use super::open_state;

/// Create a user with the role's default permissions.
///
/// # Errors
///
/// Returns an error if the username is taken, a field is empty, or the
/// database write fails.
pub async fn create_user(
    username: &str,
    full_name: &str,
    role: UserRole,
    password: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = open_state().await?;
    let password =
        password.unwrap_or_else(|| state.config().seed_password.expose_secret().to_string());
    let password_hash = AuthService::new(&state).hash_password(&password).await?;

    let form = UserForm {
        username: username.to_string(),
        full_name: full_name.to_string(),
        role,
        permissions: None,
    };
    FactoryService::new(&state)
        .execute_as_system(Action::CreateUser {
            form,
            password_hash,
        })
        .await?;

    let factory = state.read().await;
    let user = factory
        .user_by_username(username.trim())
        .ok_or("user was not stored")?;
    tracing::info!(user_id = %user.id, username = %user.username, role = %user.role, "User created");
    Ok(())
}
