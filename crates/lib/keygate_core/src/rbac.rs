//! Role-based access control.
//!
//! Permissions reach an identity only through its roles. The queries here
//! are pure set lookups over an already-loaded `Identity`.

use std::collections::BTreeSet;

use crate::models::auth::{Identity, Permission, Role};

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";
pub const ROLE_MANAGER: &str = "manager";

/// True iff `permission` is granted by any role on `identity`.
pub fn has_permission(identity: &Identity, permission: &str) -> bool {
    identity
        .roles
        .iter()
        .flat_map(|role| role.permissions.iter())
        .any(|p| p.name == permission)
}

/// True iff `identity` holds a role named `role`.
pub fn has_role(identity: &Identity, role: &str) -> bool {
    identity.roles.iter().any(|r| r.name == role)
}

/// Union of permission names across all roles on `identity`.
pub fn effective_permissions(identity: &Identity) -> BTreeSet<String> {
    identity
        .roles
        .iter()
        .flat_map(|role| role.permissions.iter())
        .map(|p| p.name.clone())
        .collect()
}

/// Default permission catalog.
pub fn default_permissions() -> Vec<Permission> {
    vec![
        Permission::new("items", "read", "Read items"),
        Permission::new("items", "write", "Create and update items"),
        Permission::new("items", "delete", "Delete items"),
        Permission::new("users", "read", "Read users"),
        Permission::new("users", "write", "Create and update users"),
        Permission::new("users", "delete", "Delete users"),
    ]
}

/// Default roles: `admin` gets everything, `manager` every `items` action,
/// `user` only `items:read`.
pub fn default_roles() -> Vec<Role> {
    let all = default_permissions();
    vec![
        Role {
            name: ROLE_ADMIN.into(),
            description: Some("Full access to all resources".into()),
            permissions: all.clone(),
        },
        Role {
            name: ROLE_USER.into(),
            description: Some("Basic user with read access to items".into()),
            permissions: select(&all, |p| p.name == "items:read"),
        },
        Role {
            name: ROLE_MANAGER.into(),
            description: Some("Can manage items but not users".into()),
            permissions: select(&all, |p| p.resource == "items"),
        },
    ]
}

fn select(all: &[Permission], pred: impl Fn(&Permission) -> bool) -> Vec<Permission> {
    all.iter().filter(|p| pred(p)).cloned().collect()
}
