//! Seeding of accounts and master data.
//!
//! Seeds go through the normal action path as the system actor, so they are
//! validated and persisted like any other write. Entries whose username,
//! customer name or item code already exist are skipped, which makes
//! seeding idempotent.

use serde::Deserialize;
use tracing::info;

use binh_vuong_core::Action;
use binh_vuong_core::customer::CustomerForm;
use binh_vuong_core::product_model::ModelForm;
use binh_vuong_core::types::UserRole;
use binh_vuong_core::user::{UserForm, UserPermissions};

use super::{AuthService, FactoryService};
use crate::error::AppError;
use crate::state::AppState;

/// An account to create, with its plaintext password.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedUser {
    pub username: String,
    pub full_name: String,
    pub role: UserRole,
    pub password: String,
    #[serde(default)]
    pub permissions: Option<UserPermissions>,
}

/// Contents of a seed file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SeedFile {
    pub users: Vec<SeedUser>,
    pub customers: Vec<CustomerForm>,
    pub models: Vec<ModelForm>,
}

impl SeedFile {
    /// Parse a YAML seed file.
    ///
    /// # Errors
    ///
    /// Returns the YAML error if the document does not match the format.
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// The factory's stock accounts and sample customer.
    #[must_use]
    pub fn defaults(password: &str) -> Self {
        let user = |username: &str, full_name: &str, role| SeedUser {
            username: username.to_string(),
            full_name: full_name.to_string(),
            role,
            password: password.to_string(),
            permissions: None,
        };
        Self {
            users: vec![
                user("admin", "Giám Đốc Bình Vương", UserRole::Admin),
                user("kythuat", "Văn Phòng Kỹ Thuật", UserRole::Technical),
                user("xuong", "Tổ Trưởng Sản Xuất", UserRole::Production),
            ],
            customers: vec![CustomerForm {
                name: "LA CAMIE".to_string(),
                code: "LC".to_string(),
                contact_person: "Anh Nam".to_string(),
                phone: "0901234567".to_string(),
                address: "TP. Hồ Chí Minh".to_string(),
                debt_days: None,
                debt_limit: None,
            }],
            models: Vec::new(),
        }
    }
}

/// How many records a seed run created and skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub customers: usize,
    pub models: usize,
    pub skipped: usize,
}

/// Create everything in `file` that does not exist yet.
///
/// # Errors
///
/// Returns the first hashing, validation or persistence error. Records
/// created before the error stay committed.
pub async fn seed(state: &AppState, file: SeedFile) -> Result<SeedReport, AppError> {
    let factory = FactoryService::new(state);
    let auth = AuthService::new(state);
    let mut report = SeedReport::default();

    for user in file.users {
        if state.read().await.user_by_username(user.username.trim()).is_some() {
            report.skipped += 1;
            continue;
        }
        let password_hash = auth.hash_password(&user.password).await?;
        let form = UserForm {
            username: user.username,
            full_name: user.full_name,
            role: user.role,
            permissions: user.permissions,
        };
        factory
            .execute_as_system(Action::CreateUser {
                form,
                password_hash,
            })
            .await?;
        report.users += 1;
    }

    for form in file.customers {
        let exists = state
            .read()
            .await
            .customers
            .iter()
            .any(|c| c.name == form.name.trim());
        if exists {
            report.skipped += 1;
            continue;
        }
        factory
            .execute_as_system(Action::CreateCustomer { form })
            .await?;
        report.customers += 1;
    }

    for form in file.models {
        let exists = state
            .read()
            .await
            .models
            .iter()
            .any(|m| m.item_code == form.item_code.trim());
        if exists {
            report.skipped += 1;
            continue;
        }
        factory.execute_as_system(Action::CreateModel { form }).await?;
        report.models += 1;
    }

    info!(
        users = report.users,
        customers = report.customers,
        models = report.models,
        skipped = report.skipped,
        "Seeding complete"
    );
    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::AdminConfig;
    use crate::db::{MemoryStore, Store};

    const SEED_YAML: &str = r"
users:
  - username: vanphong
    fullName: Văn Phòng
    role: viewer
    password: abc
customers:
  - name: SHOES HOUSE
    debtDays: 45
models:
  - itemCode: B0200
    gender: Nam
";

    async fn memory_state() -> AppState {
        AppState::load(AdminConfig::default(), Store::Memory(MemoryStore::new()))
            .await
            .unwrap()
    }

    #[test]
    fn test_parse_seed_yaml() {
        let file = SeedFile::from_yaml(SEED_YAML).unwrap();
        assert_eq!(file.users.len(), 1);
        assert_eq!(file.users[0].role, UserRole::Viewer);
        assert_eq!(file.customers[0].debt_days, Some(45));
        assert_eq!(file.models[0].item_code, "B0200");
    }

    #[tokio::test]
    async fn test_defaults_seed_is_idempotent() {
        let state = memory_state().await;

        let first = seed(&state, SeedFile::defaults("123")).await.unwrap();
        assert_eq!(first.users, 3);
        assert_eq!(first.customers, 1);

        let second = seed(&state, SeedFile::defaults("123")).await.unwrap();
        assert_eq!(second.users, 0);
        assert_eq!(second.skipped, 4);

        let user = AuthService::new(&state).login("kythuat", "123").await.unwrap();
        assert_eq!(user.role, UserRole::Technical);
        assert!(!user.permissions.can_delete);
    }
}
