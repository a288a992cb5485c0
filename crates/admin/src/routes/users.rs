//! Account routes: login and user administration.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{post, put},
};
use serde::Deserialize;
use serde_json::Value;

use binh_vuong_core::permission::{Capability, can_perform};
use binh_vuong_core::types::{UserId, UserRole};
use binh_vuong_core::user::{User, UserForm, UserPermissions};
use binh_vuong_core::{Action, Collection};

use super::written;
use crate::error::AppError;
use crate::middleware::RequireActor;
use crate::services::{AuthService, FactoryService};
use crate::state::AppState;

/// Build the users router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/users/login", post(login))
        .route("/api/users", post(create_user).get(list_users))
        .route("/api/users/{id}", put(update_user).delete(delete_user))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Check credentials and return the account.
///
/// The returned `id` is what clients send as `X-User-Id`.
///
/// # Errors
///
/// Returns 401 for an unknown user or a wrong password.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<User>, AppError> {
    let user = AuthService::new(&state)
        .login(&body.username, &body.password)
        .await?;
    Ok(Json(user))
}

/// Account fields plus the password.
///
/// On update an absent or empty password keeps the current one.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest {
    pub username: String,
    pub full_name: String,
    pub role: UserRole,
    #[serde(default)]
    pub permissions: Option<UserPermissions>,
    #[serde(default)]
    pub password: Option<String>,
}

impl UserRequest {
    fn split(self) -> (UserForm, Option<String>) {
        let password = self.password.filter(|p| !p.is_empty());
        let form = UserForm {
            username: self.username,
            full_name: self.full_name,
            role: self.role,
            permissions: self.permissions,
        };
        (form, password)
    }
}

fn require_admin(user: &User) -> Result<(), AppError> {
    if can_perform(user, Capability::ManageUsers) {
        Ok(())
    } else {
        Err(AppError::Forbidden("user management is admin only".to_string()))
    }
}

/// List every account.
///
/// # Errors
///
/// Returns 403 for non-admins.
pub async fn list_users(
    RequireActor(actor): RequireActor,
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>, AppError> {
    require_admin(&actor)?;
    Ok(Json(state.read().await.users.clone()))
}

/// Create an account.
///
/// # Errors
///
/// Returns 403 for non-admins, 400 without a password, 409 for a taken
/// username.
pub async fn create_user(
    RequireActor(actor): RequireActor,
    State(state): State<AppState>,
    Json(body): Json<UserRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_admin(&actor)?;
    let (form, password) = body.split();
    let password = password.ok_or_else(|| AppError::BadRequest("password is required".into()))?;
    let password_hash = AuthService::new(&state).hash_password(&password).await?;

    let changes = FactoryService::new(&state)
        .execute(
            actor.id,
            Action::CreateUser {
                form,
                password_hash,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(written(&changes, Collection::Users)?)))
}

/// Update an account, optionally resetting its password.
///
/// # Errors
///
/// Returns 403 for non-admins, 404 for an unknown account.
pub async fn update_user(
    RequireActor(actor): RequireActor,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Json(body): Json<UserRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&actor)?;
    let (form, password) = body.split();
    let password_hash = match password {
        Some(password) => Some(AuthService::new(&state).hash_password(&password).await?),
        None => None,
    };

    let changes = FactoryService::new(&state)
        .execute(
            actor.id,
            Action::UpdateUser {
                id,
                form,
                password_hash,
            },
        )
        .await?;
    Ok(Json(written(&changes, Collection::Users)?))
}

/// Delete an account and its credential.
///
/// # Errors
///
/// Returns 403 when deleting oneself, an admin, or without `canDelete`.
pub async fn delete_user(
    RequireActor(actor): RequireActor,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<StatusCode, AppError> {
    FactoryService::new(&state)
        .execute(actor.id, Action::DeleteUser { id })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
