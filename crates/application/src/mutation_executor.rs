use std::future::Future;
use std::sync::Arc;

use grantline_core::{AppError, AppResult};
use grantline_domain::{IntentAction, Permission, RolePermission};
use tracing::info;

use crate::RetryPolicy;
use crate::entity_resolver::ResolvedTarget;
use crate::rbac_store_ports::{RbacStore, WriteOutcome};

/// Applied mutation, carrying what the caller needs to report it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// A permission is granted to a role.
    PermissionAssigned {
        /// Role name as stored.
        role: String,
        /// Permission name as stored.
        permission: String,
        /// Whether this command created the grant.
        write: WriteOutcome,
    },
    /// A permission is no longer granted to a role.
    PermissionRemoved {
        /// Role name as stored.
        role: String,
        /// Permission name as stored.
        permission: String,
        /// Whether this command deleted a grant.
        write: WriteOutcome,
    },
    /// A permission exists under the requested name.
    PermissionCreated {
        /// Stored permission.
        permission: Permission,
        /// Whether this command created the permission.
        write: WriteOutcome,
    },
}

impl MutationOutcome {
    /// Returns the user-facing success message.
    ///
    /// Idempotent repeats report the same message as the first application.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::PermissionAssigned {
                role, permission, ..
            } => format!("Assigned {permission} to {role}"),
            Self::PermissionRemoved {
                role, permission, ..
            } => format!("Removed {permission} from {role}"),
            Self::PermissionCreated { permission, .. } => {
                format!("Created permission {}", permission.name)
            }
        }
    }
}

/// Applies resolved mutations with insert-if-absent and delete-if-present
/// semantics.
#[derive(Clone)]
pub struct MutationExecutor {
    store: Arc<dyn RbacStore>,
    retry_policy: RetryPolicy,
}

impl MutationExecutor {
    /// Creates an executor over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn RbacStore>, retry_policy: RetryPolicy) -> Self {
        Self {
            store,
            retry_policy,
        }
    }

    /// Applies the mutation for `action` against `target`.
    pub async fn execute(
        &self,
        action: IntentAction,
        target: ResolvedTarget,
    ) -> AppResult<MutationOutcome> {
        match (action, target) {
            (IntentAction::AssignPermission, ResolvedTarget::Grant { role, permission }) => {
                let grant = RolePermission::new(role.id, permission.id);
                let write = self
                    .detached("insert_role_permission_if_absent", move |store| async move {
                        store.insert_role_permission_if_absent(grant).await
                    })
                    .await?;

                info!(
                    role_id = %grant.role_id,
                    permission_id = %grant.permission_id,
                    applied = write == WriteOutcome::Applied,
                    "permission assigned"
                );

                Ok(MutationOutcome::PermissionAssigned {
                    role: role.name,
                    permission: permission.name,
                    write,
                })
            }
            (IntentAction::RemovePermission, ResolvedTarget::Grant { role, permission }) => {
                let grant = RolePermission::new(role.id, permission.id);
                let removed = self
                    .detached("delete_role_permission", move |store| async move {
                        store.delete_role_permission(grant).await
                    })
                    .await?;

                let write = if removed > 0 {
                    WriteOutcome::Applied
                } else {
                    WriteOutcome::Unchanged
                };

                info!(
                    role_id = %grant.role_id,
                    permission_id = %grant.permission_id,
                    removed,
                    "permission removed"
                );

                Ok(MutationOutcome::PermissionRemoved {
                    role: role.name,
                    permission: permission.name,
                    write,
                })
            }
            (IntentAction::CreatePermission, ResolvedTarget::NewPermission { name, description }) => {
                let name = String::from(name);
                let upsert = self
                    .detached("insert_permission_if_absent", move |store| {
                        let name = name.clone();
                        let description = description.clone();
                        async move {
                            store
                                .insert_permission_if_absent(name.as_str(), description.as_deref())
                                .await
                        }
                    })
                    .await?;

                info!(
                    permission_id = %upsert.permission.id,
                    applied = upsert.outcome == WriteOutcome::Applied,
                    "permission created"
                );

                Ok(MutationOutcome::PermissionCreated {
                    permission: upsert.permission,
                    write: upsert.outcome,
                })
            }
            (action, _) => Err(AppError::Internal(format!(
                "resolved target does not match action '{action}'"
            ))),
        }
    }

    /// Runs a store write on its own task.
    ///
    /// Dropping the caller's future after the write was issued does not abort
    /// the write; cancellation only takes effect before the task is spawned.
    async fn detached<T, F, Fut>(&self, operation: &'static str, write: F) -> AppResult<T>
    where
        T: Send + 'static,
        F: Fn(Arc<dyn RbacStore>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<T>> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let retry_policy = self.retry_policy;

        tokio::spawn(async move {
            retry_policy
                .run(operation, AppError::is_transient_store, || {
                    write(Arc::clone(&store))
                })
                .await
        })
        .await
        .map_err(|error| AppError::Internal(format!("{operation} task failed: {error}")))?
    }
}

#[cfg(test)]
mod tests {
    use grantline_domain::{Permission, PermissionId};

    use super::MutationOutcome;
    use crate::rbac_store_ports::WriteOutcome;

    #[test]
    fn messages_do_not_depend_on_write_outcome() {
        for write in [WriteOutcome::Applied, WriteOutcome::Unchanged] {
            let assigned = MutationOutcome::PermissionAssigned {
                role: "editor".to_owned(),
                permission: "publish:blog".to_owned(),
                write,
            };
            assert_eq!(assigned.message(), "Assigned publish:blog to editor");

            let removed = MutationOutcome::PermissionRemoved {
                role: "editor".to_owned(),
                permission: "publish:blog".to_owned(),
                write,
            };
            assert_eq!(removed.message(), "Removed publish:blog from editor");
        }

        let created = MutationOutcome::PermissionCreated {
            permission: Permission {
                id: PermissionId::new(3),
                name: "edit:article".to_owned(),
                description: None,
            },
            write: WriteOutcome::Unchanged,
        };
        assert_eq!(created.message(), "Created permission edit:article");
    }
}
