//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod intent;
mod naming;
mod rbac;

pub use intent::{Intent, IntentAction};
pub use naming::{NAME_MAX_LENGTH, PERMISSION_SEPARATOR, PermissionName, RoleName};
pub use rbac::{Permission, PermissionId, Role, RoleId, RolePermission};
