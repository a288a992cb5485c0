//! Applies domain actions and persists them.
//!
//! The write lock is held from validation until the store has committed, so
//! mutations are serialized. The new snapshot is installed only after a
//! successful commit; a failed commit leaves memory and store unchanged.

use chrono::Utc;
use tracing::{error, info, instrument, warn};

use binh_vuong_core::types::{UserId, UserRole};
use binh_vuong_core::user::{User, UserPermissions};
use binh_vuong_core::{Action, Change, FactoryState};

use crate::error::AppError;
use crate::state::AppState;

/// Mutation entry point for handlers and commands.
pub struct FactoryService<'a> {
    state: &'a AppState,
}

impl<'a> FactoryService<'a> {
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Apply `action` on behalf of the stored user `actor_id`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` if the user no longer exists,
    /// `AppError::Domain` if the action is rejected, and `AppError::Database`
    /// if the commit fails.
    #[instrument(skip(self, action), fields(action = action.name()))]
    pub async fn execute(&self, actor_id: UserId, action: Action) -> Result<Vec<Change>, AppError> {
        let mut factory = self.state.write().await;
        let actor = factory
            .user(actor_id)
            .cloned()
            .ok_or_else(|| AppError::Unauthorized(format!("unknown user {actor_id}")))?;
        self.commit(&mut factory, &actor, action).await
    }

    /// Apply `action` as the built-in system administrator.
    ///
    /// Used for seeding, where no stored account may exist yet.
    ///
    /// # Errors
    ///
    /// Same as [`FactoryService::execute`], minus the user lookup.
    #[instrument(skip(self, action), fields(action = action.name()))]
    pub async fn execute_as_system(&self, action: Action) -> Result<Vec<Change>, AppError> {
        let mut factory = self.state.write().await;
        self.commit(&mut factory, &system_actor(), action).await
    }

    async fn commit(
        &self,
        factory: &mut FactoryState,
        actor: &User,
        action: Action,
    ) -> Result<Vec<Change>, AppError> {
        let name = action.name();
        let transition = match factory.apply(actor, action, Utc::now()) {
            Ok(transition) => transition,
            Err(e) => {
                warn!(action = name, actor = %actor.username, error = %e, "Action rejected");
                return Err(e.into());
            }
        };

        if let Err(e) = self.state.store().commit(&transition.changes).await {
            error!(
                action = name,
                actor = %actor.username,
                changes = transition.changes.len(),
                error = %e,
                "Commit failed; state left unchanged"
            );
            return Err(e.into());
        }

        *factory = transition.state;
        info!(
            action = name,
            actor = %actor.username,
            changes = transition.changes.len(),
            "Action applied"
        );
        Ok(transition.changes)
    }
}

/// An unsaved administrator used for bootstrap writes.
#[must_use]
pub fn system_actor() -> User {
    User {
        id: UserId::from_uuid(uuid::Uuid::nil()),
        username: "system".to_string(),
        full_name: "System".to_string(),
        role: UserRole::Admin,
        created_at: Utc::now(),
        permissions: UserPermissions::defaults_for(UserRole::Admin),
    }
}
