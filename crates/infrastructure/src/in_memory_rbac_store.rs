use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::RwLock;

use grantline_application::{PermissionUpsert, RbacStore, WriteOutcome};
use grantline_core::{AppError, AppResult};
use grantline_domain::{Permission, PermissionId, Role, RoleId, RolePermission};

#[derive(Debug, Default)]
struct RbacTables {
    roles: Vec<Role>,
    permissions: Vec<Permission>,
    role_permissions: HashSet<RolePermission>,
    next_role_id: i64,
    next_permission_id: i64,
}

impl RbacTables {
    fn allocate_role_id(&mut self) -> RoleId {
        self.next_role_id += 1;
        RoleId::new(self.next_role_id)
    }

    fn allocate_permission_id(&mut self) -> PermissionId {
        self.next_permission_id += 1;
        PermissionId::new(self.next_permission_id)
    }
}

/// In-memory RBAC store with the same uniqueness rules as the SQL schema.
///
/// Every operation takes a single write or read lock, so each call is atomic
/// with respect to concurrent callers.
#[derive(Debug, Default)]
pub struct InMemoryRbacStore {
    tables: RwLock<RbacTables>,
}

impl InMemoryRbacStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a role, rejecting case-insensitive duplicates.
    pub async fn seed_role(&self, name: &str) -> AppResult<Role> {
        let mut tables = self.tables.write().await;
        let name = name.trim();

        if tables
            .roles
            .iter()
            .any(|role| role.name.to_lowercase() == name.to_lowercase())
        {
            return Err(AppError::MutationConflict(format!(
                "role '{name}' already exists"
            )));
        }

        let role = Role {
            id: tables.allocate_role_id(),
            name: name.to_owned(),
        };
        tables.roles.push(role.clone());
        Ok(role)
    }

    /// Inserts a permission, rejecting case-insensitive duplicates.
    pub async fn seed_permission(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> AppResult<Permission> {
        let upsert = self.insert_permission_if_absent(name, description).await?;
        if upsert.outcome == WriteOutcome::Unchanged {
            return Err(AppError::MutationConflict(format!(
                "permission '{name}' already exists"
            )));
        }

        Ok(upsert.permission)
    }

    /// Returns every stored grant ordered by role then permission.
    pub async fn role_permissions(&self) -> Vec<RolePermission> {
        let tables = self.tables.read().await;
        let mut grants: Vec<RolePermission> = tables.role_permissions.iter().copied().collect();
        grants.sort_by_key(|grant| (grant.role_id, grant.permission_id));
        grants
    }

    /// Returns every stored permission ordered by identifier.
    pub async fn permissions(&self) -> Vec<Permission> {
        self.tables.read().await.permissions.clone()
    }
}

#[async_trait]
impl RbacStore for InMemoryRbacStore {
    async fn find_roles_by_name(&self, name: &str) -> AppResult<Vec<Role>> {
        let tables = self.tables.read().await;
        let name = name.to_lowercase();

        Ok(tables
            .roles
            .iter()
            .filter(|role| role.name.to_lowercase() == name)
            .cloned()
            .collect())
    }

    async fn find_permissions_by_name(&self, name: &str) -> AppResult<Vec<Permission>> {
        let tables = self.tables.read().await;
        let name = name.to_lowercase();

        Ok(tables
            .permissions
            .iter()
            .filter(|permission| permission.name.to_lowercase() == name)
            .cloned()
            .collect())
    }

    async fn insert_permission_if_absent(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> AppResult<PermissionUpsert> {
        let mut tables = self.tables.write().await;
        let name = name.trim();

        if let Some(existing) = tables
            .permissions
            .iter()
            .find(|permission| permission.name.to_lowercase() == name.to_lowercase())
        {
            return Ok(PermissionUpsert {
                permission: existing.clone(),
                outcome: WriteOutcome::Unchanged,
            });
        }

        let permission = Permission {
            id: tables.allocate_permission_id(),
            name: name.to_owned(),
            description: description.map(str::to_owned),
        };
        tables.permissions.push(permission.clone());

        Ok(PermissionUpsert {
            permission,
            outcome: WriteOutcome::Applied,
        })
    }

    async fn insert_role_permission_if_absent(
        &self,
        grant: RolePermission,
    ) -> AppResult<WriteOutcome> {
        let mut tables = self.tables.write().await;

        let role_exists = tables.roles.iter().any(|role| role.id == grant.role_id);
        let permission_exists = tables
            .permissions
            .iter()
            .any(|permission| permission.id == grant.permission_id);
        if !role_exists || !permission_exists {
            return Err(AppError::MutationConflict(format!(
                "grant ({}, {}) references a missing row",
                grant.role_id, grant.permission_id
            )));
        }

        Ok(if tables.role_permissions.insert(grant) {
            WriteOutcome::Applied
        } else {
            WriteOutcome::Unchanged
        })
    }

    async fn delete_role_permission(&self, grant: RolePermission) -> AppResult<u64> {
        let mut tables = self.tables.write().await;
        Ok(u64::from(tables.role_permissions.remove(&grant)))
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use grantline_application::{RbacStore, WriteOutcome};
    use grantline_core::AppError;
    use grantline_domain::{PermissionId, RolePermission};

    use super::InMemoryRbacStore;

    #[tokio::test]
    async fn seeded_roles_are_unique_ignoring_case() {
        let store = InMemoryRbacStore::new();
        assert!(store.seed_role("Editor").await.is_ok());
        assert!(matches!(
            store.seed_role("editor").await,
            Err(AppError::MutationConflict(_))
        ));

        let found = store.find_roles_by_name("EDITOR").await;
        assert_eq!(found.map(|roles| roles.len()), Ok(1));
    }

    #[tokio::test]
    async fn lookups_never_match_substrings() {
        let store = InMemoryRbacStore::new();
        assert!(store.seed_role("editor-in-chief").await.is_ok());
        assert!(store.seed_role("chief editor").await.is_ok());

        assert_eq!(store.find_roles_by_name("editor").await, Ok(Vec::new()));
    }

    #[tokio::test]
    async fn permission_insert_returns_existing_row() {
        let store = InMemoryRbacStore::new();
        let first = store
            .insert_permission_if_absent("edit:article", Some("Edit articles"))
            .await;
        let second = store.insert_permission_if_absent("Edit:Article", None).await;

        let (Ok(first), Ok(second)) = (first, second) else {
            panic!("upserts should succeed");
        };
        assert_eq!(first.outcome, WriteOutcome::Applied);
        assert_eq!(second.outcome, WriteOutcome::Unchanged);
        assert_eq!(second.permission, first.permission);
        assert_eq!(store.permissions().await.len(), 1);
    }

    #[tokio::test]
    async fn grants_are_idempotent_in_both_directions() {
        let store = InMemoryRbacStore::new();
        let (Ok(role), Ok(permission)) = (
            store.seed_role("editor").await,
            store.seed_permission("publish:blog", None).await,
        ) else {
            panic!("seed rows should insert");
        };
        let grant = RolePermission::new(role.id, permission.id);

        assert_eq!(
            store.insert_role_permission_if_absent(grant).await,
            Ok(WriteOutcome::Applied)
        );
        assert_eq!(
            store.insert_role_permission_if_absent(grant).await,
            Ok(WriteOutcome::Unchanged)
        );
        assert_eq!(store.role_permissions().await, vec![grant]);

        assert_eq!(store.delete_role_permission(grant).await, Ok(1));
        assert_eq!(store.delete_role_permission(grant).await, Ok(0));
        assert!(store.role_permissions().await.is_empty());
    }

    #[tokio::test]
    async fn grants_must_reference_existing_rows() {
        let store = InMemoryRbacStore::new();
        let Ok(role) = store.seed_role("editor").await else {
            panic!("role should insert");
        };

        let result = store
            .insert_role_permission_if_absent(RolePermission::new(role.id, PermissionId::new(42)))
            .await;
        assert!(matches!(result, Err(AppError::MutationConflict(_))));
    }
}
