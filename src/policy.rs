//! Single policy-evaluation point. Handlers never compare role strings;
//! they name the permission they need and call [`authorize`].

use uuid::Uuid;

use crate::{error::AppError, middleware::auth::AuthUser, models::UserRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Create POS orders and record payments.
    CaptureOrders,
    /// Move orders through the kitchen lifecycle.
    TransitionOrders,
    /// Read the kitchen / order board queues.
    ViewOrders,
    /// Menu, addons, tables, clients.
    ManageCatalog,
    /// WhatsApp campaigns.
    ManageCampaigns,
    /// Open tickets and read the tenant's own tickets.
    ManageOwnTickets,
    /// Create and administer staff accounts for the tenant.
    ManageStaff,
    /// Cross-tenant restaurant and ticket administration.
    MasterConsole,
}

pub fn authorize(user: &AuthUser, permission: Permission) -> Result<(), AppError> {
    use Permission::*;
    use UserRole::*;
    let allowed = match permission {
        CaptureOrders => matches!(user.role, Admin | Cashier | Waiter),
        TransitionOrders => matches!(user.role, Admin | Cashier | Kitchen | Waiter),
        ViewOrders => matches!(user.role, Admin | Cashier | Kitchen | Waiter),
        ManageCatalog => matches!(user.role, Admin),
        ManageCampaigns => matches!(user.role, Admin),
        ManageOwnTickets => matches!(user.role, Admin),
        ManageStaff => matches!(user.role, Admin),
        MasterConsole => matches!(user.role, Master),
    };
    if allowed { Ok(()) } else { Err(AppError::Forbidden) }
}

/// Tenant scope of the caller. Master users carry no tenant and cannot hit
/// tenant-scoped endpoints; every tenant query filters on this id.
pub fn tenant_of(user: &AuthUser) -> Result<Uuid, AppError> {
    user.restaurant_id.ok_or(AppError::Forbidden)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user(role: UserRole, tenant: Option<Uuid>) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            restaurant_id: tenant,
            role,
        }
    }

    #[test]
    fn kitchen_can_transition_but_not_capture() {
        let u = user(UserRole::Kitchen, Some(Uuid::new_v4()));
        assert!(authorize(&u, Permission::TransitionOrders).is_ok());
        assert!(authorize(&u, Permission::CaptureOrders).is_err());
        assert!(authorize(&u, Permission::ManageCatalog).is_err());
    }

    #[test]
    fn master_is_console_only() {
        let u = user(UserRole::Master, None);
        assert!(authorize(&u, Permission::MasterConsole).is_ok());
        assert!(authorize(&u, Permission::CaptureOrders).is_err());
        assert!(tenant_of(&u).is_err());
    }

    #[test]
    fn admin_covers_tenant_surface_but_not_console() {
        let tenant = Uuid::new_v4();
        let u = user(UserRole::Admin, Some(tenant));
        assert!(authorize(&u, Permission::CaptureOrders).is_ok());
        assert!(authorize(&u, Permission::ManageCatalog).is_ok());
        assert!(authorize(&u, Permission::ManageOwnTickets).is_ok());
        assert!(authorize(&u, Permission::ManageStaff).is_ok());
        assert!(authorize(&u, Permission::MasterConsole).is_err());
        assert_eq!(tenant_of(&u).ok(), Some(tenant));
    }
}
