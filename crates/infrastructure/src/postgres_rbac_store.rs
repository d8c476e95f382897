use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use grantline_application::{PermissionUpsert, RbacStore, WriteOutcome};
use grantline_core::{AppError, AppResult};
use grantline_domain::{Permission, PermissionId, Role, RoleId, RolePermission};

/// PostgreSQL-backed RBAC store.
#[derive(Clone)]
pub struct PostgresRbacStore {
    pool: PgPool,
    query_timeout: Duration,
}

impl PostgresRbacStore {
    /// Creates a store with the provided connection pool and per-call timeout.
    #[must_use]
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        query: impl Future<Output = Result<T, sqlx::Error>>,
    ) -> AppResult<T> {
        match tokio::time::timeout(self.query_timeout, query).await {
            Ok(result) => result.map_err(|error| map_store_error(operation, error)),
            Err(_) => Err(AppError::StoreUnavailable(format!(
                "{operation} timed out after {}ms",
                self.query_timeout.as_millis()
            ))),
        }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: i64,
    name: String,
}

impl From<RoleRow> for Role {
    fn from(row: RoleRow) -> Self {
        Self {
            id: RoleId::new(row.id),
            name: row.name,
        }
    }
}

#[derive(Debug, FromRow)]
struct PermissionRow {
    id: i64,
    name: String,
    description: Option<String>,
}

impl From<PermissionRow> for Permission {
    fn from(row: PermissionRow) -> Self {
        Self {
            id: PermissionId::new(row.id),
            name: row.name,
            description: row.description,
        }
    }
}

#[derive(Debug, FromRow)]
struct PermissionUpsertRow {
    id: i64,
    name: String,
    description: Option<String>,
    created: bool,
}

#[async_trait]
impl RbacStore for PostgresRbacStore {
    async fn find_roles_by_name(&self, name: &str) -> AppResult<Vec<Role>> {
        let rows = self
            .bounded(
                "find_roles_by_name",
                sqlx::query_as::<_, RoleRow>(
                    r#"
                    SELECT id, name
                    FROM roles
                    WHERE lower(name) = lower($1)
                    ORDER BY id
                    "#,
                )
                .bind(name)
                .fetch_all(&self.pool),
            )
            .await?;

        Ok(rows.into_iter().map(Role::from).collect())
    }

    async fn find_permissions_by_name(&self, name: &str) -> AppResult<Vec<Permission>> {
        let rows = self
            .bounded(
                "find_permissions_by_name",
                sqlx::query_as::<_, PermissionRow>(
                    r#"
                    SELECT id, name, description
                    FROM permissions
                    WHERE lower(name) = lower($1)
                    ORDER BY id
                    "#,
                )
                .bind(name)
                .fetch_all(&self.pool),
            )
            .await?;

        Ok(rows.into_iter().map(Permission::from).collect())
    }

    async fn insert_permission_if_absent(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> AppResult<PermissionUpsert> {
        let row = self
            .bounded(
                "insert_permission_if_absent",
                sqlx::query_as::<_, PermissionUpsertRow>(
                    r#"
                    WITH inserted AS (
                        INSERT INTO permissions (name, description)
                        VALUES ($1, $2)
                        ON CONFLICT ((lower(name))) DO NOTHING
                        RETURNING id, name, description
                    )
                    SELECT id, name, description, true AS created
                    FROM inserted
                    UNION ALL
                    SELECT id, name, description, false AS created
                    FROM permissions
                    WHERE lower(name) = lower($1)
                    LIMIT 1
                    "#,
                )
                .bind(name)
                .bind(description)
                .fetch_optional(&self.pool),
            )
            .await?;

        if let Some(row) = row {
            let outcome = if row.created {
                WriteOutcome::Applied
            } else {
                WriteOutcome::Unchanged
            };

            return Ok(PermissionUpsert {
                permission: Permission {
                    id: PermissionId::new(row.id),
                    name: row.name,
                    description: row.description,
                },
                outcome,
            });
        }

        // A concurrent insert committed after this statement's snapshot was taken.
        let existing = self.find_permissions_by_name(name).await?;
        let permission = existing.into_iter().next().ok_or_else(|| {
            AppError::MutationConflict(format!(
                "permission '{name}' was neither inserted nor found"
            ))
        })?;

        Ok(PermissionUpsert {
            permission,
            outcome: WriteOutcome::Unchanged,
        })
    }

    async fn insert_role_permission_if_absent(
        &self,
        grant: RolePermission,
    ) -> AppResult<WriteOutcome> {
        let rows_affected = self
            .bounded(
                "insert_role_permission_if_absent",
                sqlx::query(
                    r#"
                    INSERT INTO role_permissions (role_id, permission_id)
                    VALUES ($1, $2)
                    ON CONFLICT (role_id, permission_id) DO NOTHING
                    "#,
                )
                .bind(grant.role_id.as_i64())
                .bind(grant.permission_id.as_i64())
                .execute(&self.pool),
            )
            .await?
            .rows_affected();

        Ok(if rows_affected > 0 {
            WriteOutcome::Applied
        } else {
            WriteOutcome::Unchanged
        })
    }

    async fn delete_role_permission(&self, grant: RolePermission) -> AppResult<u64> {
        let result = self
            .bounded(
                "delete_role_permission",
                sqlx::query(
                    r#"
                    DELETE FROM role_permissions
                    WHERE role_id = $1
                        AND permission_id = $2
                    "#,
                )
                .bind(grant.role_id.as_i64())
                .bind(grant.permission_id.as_i64())
                .execute(&self.pool),
            )
            .await?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> AppResult<()> {
        self.bounded(
            "ping",
            sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&self.pool),
        )
        .await
        .map(|_| ())
    }
}

/// Classifies sqlx failures into connectivity, integrity and internal errors.
fn map_store_error(operation: &str, error: sqlx::Error) -> AppError {
    match &error {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => {
            AppError::StoreUnavailable(format!("{operation} failed: {error}"))
        }
        sqlx::Error::Database(database_error) => {
            let code = database_error.code().unwrap_or_default();
            match sqlstate_class(code.as_ref()) {
                SqlStateClass::IntegrityViolation => {
                    AppError::MutationConflict(format!("{operation} failed: {error}"))
                }
                SqlStateClass::Connectivity => {
                    AppError::StoreUnavailable(format!("{operation} failed: {error}"))
                }
                SqlStateClass::Other => {
                    AppError::Internal(format!("{operation} failed: {error}"))
                }
            }
        }
        _ => AppError::Internal(format!("{operation} failed: {error}")),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SqlStateClass {
    IntegrityViolation,
    Connectivity,
    Other,
}

fn sqlstate_class(code: &str) -> SqlStateClass {
    if code.starts_with("23") {
        SqlStateClass::IntegrityViolation
    } else if code.starts_with("08") || code.starts_with("57P") || code == "53300" {
        SqlStateClass::Connectivity
    } else {
        SqlStateClass::Other
    }
}
