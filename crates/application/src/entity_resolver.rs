use std::sync::Arc;

use grantline_core::{AppError, AppResult, EntityKind, MissingEntity};
use grantline_domain::{Intent, IntentAction, Permission, PermissionName, Role, RoleName};
use tracing::debug;

use crate::RetryPolicy;
use crate::rbac_store_ports::RbacStore;

/// Store entities an intent refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedTarget {
    /// Existing role and permission for grant mutations.
    Grant {
        /// Resolved role.
        role: Role,
        /// Resolved permission.
        permission: Permission,
    },
    /// Permission to be created.
    NewPermission {
        /// Canonical permission name.
        name: PermissionName,
        /// Optional description.
        description: Option<String>,
    },
}

/// Resolves intent names to store rows by exact case-insensitive match.
#[derive(Clone)]
pub struct EntityResolver {
    store: Arc<dyn RbacStore>,
    retry_policy: RetryPolicy,
}

impl EntityResolver {
    /// Creates a resolver over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn RbacStore>, retry_policy: RetryPolicy) -> Self {
        Self {
            store,
            retry_policy,
        }
    }

    /// Resolves every entity the intent names.
    ///
    /// Both the role and the permission are looked up before failing so that
    /// a not-found error lists every missing entity.
    pub async fn resolve(&self, intent: &Intent) -> AppResult<ResolvedTarget> {
        if intent.action() == IntentAction::CreatePermission {
            return Ok(ResolvedTarget::NewPermission {
                name: intent.permission().clone(),
                description: intent.description().map(str::to_owned),
            });
        }

        let role_name = intent.role().ok_or_else(|| {
            AppError::SchemaInvalid(format!(
                "action '{}' requires field 'role'",
                intent.action()
            ))
        })?;

        let role = self.resolve_role(role_name).await;
        let permission = self.resolve_permission(intent.permission()).await;

        match (role, permission) {
            (Ok(role), Ok(permission)) => {
                debug!(role_id = %role.id, permission_id = %permission.id, "entities resolved");
                Ok(ResolvedTarget::Grant { role, permission })
            }
            (Err(role_error), Err(permission_error)) => {
                Err(merge_failures(role_error, permission_error))
            }
            (Err(error), Ok(_)) | (Ok(_), Err(error)) => Err(error),
        }
    }

    async fn resolve_role(&self, name: &RoleName) -> AppResult<Role> {
        let rows = self
            .retry_policy
            .run("find_roles_by_name", AppError::is_transient_store, || {
                self.store.find_roles_by_name(name.as_str())
            })
            .await?;

        pick_single(EntityKind::Role, name.as_str(), rows)
    }

    async fn resolve_permission(&self, name: &PermissionName) -> AppResult<Permission> {
        let rows = self
            .retry_policy
            .run(
                "find_permissions_by_name",
                AppError::is_transient_store,
                || self.store.find_permissions_by_name(name.as_str()),
            )
            .await?;

        pick_single(EntityKind::Permission, name.as_str(), rows)
    }
}

/// Rows come back already matched by the store's own case-insensitive
/// equality; re-comparing here could disagree with the store's collation.
fn pick_single<T>(kind: EntityKind, name: &str, mut matches: Vec<T>) -> AppResult<T> {
    match matches.len() {
        0 => Err(AppError::EntityNotFound(vec![MissingEntity::new(kind, name)])),
        1 => matches
            .pop()
            .ok_or_else(|| AppError::Internal(format!("{kind} match vanished"))),
        count => Err(AppError::AmbiguousMatch {
            kind,
            name: name.to_owned(),
            matches: count,
        }),
    }
}

fn merge_failures(first: AppError, second: AppError) -> AppError {
    match (first, second) {
        (AppError::EntityNotFound(mut missing), AppError::EntityNotFound(more)) => {
            missing.extend(more);
            AppError::EntityNotFound(missing)
        }
        (AppError::EntityNotFound(_), other) => other,
        (other, _) => other,
    }
}
