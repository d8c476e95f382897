use async_trait::async_trait;

use grantline_core::AppResult;
use grantline_domain::{Permission, Role, RolePermission};

/// Result of a conditional write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The row was written by this call.
    Applied,
    /// The row already existed (or was already absent); nothing changed.
    Unchanged,
}

/// Permission returned from an insert-if-absent call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionUpsert {
    /// Stored permission, either freshly created or pre-existing.
    pub permission: Permission,
    /// Whether this call created the row.
    pub outcome: WriteOutcome,
}

/// Repository port over the relational RBAC store.
///
/// Implementations issue only three query shapes: lookups by name,
/// insert-if-absent keyed on a unique constraint, and delete-by-filter.
/// Every method is a single atomic store operation.
#[async_trait]
pub trait RbacStore: Send + Sync {
    /// Finds roles whose name equals `name` under case-insensitive comparison.
    async fn find_roles_by_name(&self, name: &str) -> AppResult<Vec<Role>>;

    /// Finds permissions whose name equals `name` under case-insensitive comparison.
    async fn find_permissions_by_name(&self, name: &str) -> AppResult<Vec<Permission>>;

    /// Inserts a permission unless one with the same name already exists.
    async fn insert_permission_if_absent(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> AppResult<PermissionUpsert>;

    /// Inserts a role grant unless the pair already exists.
    async fn insert_role_permission_if_absent(
        &self,
        grant: RolePermission,
    ) -> AppResult<WriteOutcome>;

    /// Deletes a role grant and returns the number of removed rows.
    async fn delete_role_permission(&self, grant: RolePermission) -> AppResult<u64>;

    /// Verifies the store is reachable.
    async fn ping(&self) -> AppResult<()>;
}
