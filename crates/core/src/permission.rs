//! Role and flag based permission gate.
//!
//! A pure lookup over a user's role and permission flags. Viewers never
//! mutate anything; `canEdit` and `canDelete` narrow what the remaining roles
//! may do.

use crate::error::DomainError;
use crate::types::UserRole;
use crate::user::User;

/// An application screen, gated by the matching permission flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Module {
    Dashboard,
    Orders,
    Models,
    Customers,
    Returns,
    Shipping,
}

/// A mutation a caller may attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ChangeStageStatus,
    CreateOrder,
    EditOrder,
    ChangeOrderStatus,
    ReorderOrders,
    DeleteOrder,
    ViewCancelledOrders,
    CreateModel,
    EditModel,
    DeleteModel,
    ManageCustomers,
    RecordReturn,
    ManageShipping,
    DeleteShippingNote,
    RecordPayment,
    DeletePayment,
    ManageUsers,
    DeleteUser,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::ChangeStageStatus => "change stage status",
            Self::CreateOrder => "create order",
            Self::EditOrder => "edit order",
            Self::ChangeOrderStatus => "change order status",
            Self::ReorderOrders => "reorder orders",
            Self::DeleteOrder => "delete order",
            Self::ViewCancelledOrders => "view cancelled orders",
            Self::CreateModel => "create model",
            Self::EditModel => "edit model",
            Self::DeleteModel => "delete model",
            Self::ManageCustomers => "manage customers",
            Self::RecordReturn => "record return",
            Self::ManageShipping => "manage shipping",
            Self::DeleteShippingNote => "delete shipping note",
            Self::RecordPayment => "record payment",
            Self::DeletePayment => "delete payment",
            Self::ManageUsers => "manage users",
            Self::DeleteUser => "delete user",
        };
        f.write_str(name)
    }
}

/// Whether `user` may open `module`.
#[must_use]
pub const fn can_view(user: &User, module: Module) -> bool {
    let p = &user.permissions;
    match module {
        Module::Dashboard => p.dashboard,
        Module::Orders => p.orders,
        Module::Models => p.models,
        Module::Customers => p.customers,
        Module::Returns => p.returns,
        Module::Shipping => p.shipping,
    }
}

/// Whether `user` may perform `capability`.
#[must_use]
pub const fn can_perform(user: &User, capability: Capability) -> bool {
    let p = &user.permissions;
    match user.role {
        UserRole::Viewer => false,
        UserRole::Admin | UserRole::Technical | UserRole::Production => match capability {
            Capability::ReorderOrders
            | Capability::ManageUsers
            | Capability::ViewCancelledOrders => user.is_admin(),
            Capability::DeleteUser => user.is_admin() && p.can_delete,
            Capability::ChangeStageStatus => p.orders,
            Capability::CreateOrder | Capability::EditOrder | Capability::ChangeOrderStatus => {
                p.orders && p.can_edit
            }
            Capability::CreateModel | Capability::EditModel => p.models && p.can_edit,
            Capability::DeleteOrder
            | Capability::DeleteModel
            | Capability::DeleteShippingNote
            | Capability::DeletePayment => p.can_delete,
            Capability::ManageCustomers => p.customers,
            Capability::RecordReturn => p.returns,
            Capability::ManageShipping | Capability::RecordPayment => p.shipping,
        },
    }
}

/// [`can_perform`] as a `Result`.
///
/// # Errors
///
/// Returns [`DomainError::PermissionDenied`] when the capability is missing.
pub fn require(user: &User, capability: Capability) -> Result<(), DomainError> {
    if can_perform(user, capability) {
        Ok(())
    } else {
        Err(DomainError::PermissionDenied(capability))
    }
}

/// Whether `actor` may delete the account `target`.
///
/// Only admins with `canDelete` may delete accounts. Nobody deletes their own
/// account and admin accounts are never deleted.
///
/// # Errors
///
/// Returns the reason the deletion is refused.
pub fn check_user_deletion(actor: &User, target: &User) -> Result<(), DomainError> {
    require(actor, Capability::DeleteUser)?;
    if actor.id == target.id {
        return Err(DomainError::CannotDeleteSelf);
    }
    if target.is_admin() {
        return Err(DomainError::CannotDeleteAdmin);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use chrono::Utc;

    use super::*;
    use crate::types::UserId;
    use crate::user::UserPermissions;

    pub(crate) fn user(role: UserRole) -> User {
        User {
            id: UserId::generate(),
            username: role.to_string(),
            full_name: format!("{role} user"),
            role,
            created_at: Utc::now(),
            permissions: UserPermissions::defaults_for(role),
        }
    }

    #[test]
    fn test_viewer_never_mutates() {
        let mut viewer = user(UserRole::Viewer);
        viewer.permissions = UserPermissions::defaults_for(UserRole::Admin);
        assert!(!can_perform(&viewer, Capability::ChangeStageStatus));
        assert!(!can_perform(&viewer, Capability::EditOrder));
        assert!(!can_perform(&viewer, Capability::DeleteOrder));
    }

    #[test]
    fn test_admin_only_capabilities() {
        let mut tech = user(UserRole::Technical);
        tech.permissions = UserPermissions::defaults_for(UserRole::Admin);
        for cap in [
            Capability::ReorderOrders,
            Capability::ManageUsers,
            Capability::ViewCancelledOrders,
        ] {
            assert!(can_perform(&user(UserRole::Admin), cap));
            assert!(!can_perform(&tech, cap));
        }
    }

    #[test]
    fn test_can_edit_gates_orders_and_models() {
        let tech = user(UserRole::Technical);
        let prod = user(UserRole::Production);
        assert!(can_perform(&tech, Capability::CreateOrder));
        assert!(can_perform(&tech, Capability::EditModel));
        assert!(!can_perform(&prod, Capability::CreateOrder));
        assert!(!can_perform(&prod, Capability::EditModel));
        assert!(can_perform(&prod, Capability::ChangeStageStatus));
    }

    #[test]
    fn test_can_delete_gates_hard_deletes() {
        let tech = user(UserRole::Technical);
        assert!(!can_perform(&tech, Capability::DeleteOrder));
        assert!(!can_perform(&tech, Capability::DeletePayment));

        let mut granted = user(UserRole::Production);
        granted.permissions.can_delete = true;
        assert!(can_perform(&granted, Capability::DeleteShippingNote));
    }

    #[test]
    fn test_require_reports_capability() {
        assert_eq!(
            require(&user(UserRole::Viewer), Capability::ChangeStageStatus),
            Err(DomainError::PermissionDenied(Capability::ChangeStageStatus))
        );
    }

    #[test]
    fn test_user_deletion_rules() {
        let admin = user(UserRole::Admin);
        let other_admin = user(UserRole::Admin);
        let prod = user(UserRole::Production);
        let tech = user(UserRole::Technical);

        assert!(check_user_deletion(&admin, &prod).is_ok());
        assert_eq!(
            check_user_deletion(&admin, &admin),
            Err(DomainError::CannotDeleteSelf)
        );
        assert_eq!(
            check_user_deletion(&admin, &other_admin),
            Err(DomainError::CannotDeleteAdmin)
        );
        assert!(matches!(
            check_user_deletion(&tech, &prod),
            Err(DomainError::PermissionDenied(_))
        ));
    }

    #[test]
    fn test_can_view_follows_flags() {
        let prod = user(UserRole::Production);
        assert!(can_view(&prod, Module::Orders));
        assert!(!can_view(&prod, Module::Customers));
    }
}
