use std::sync::Arc;

use grantline_application::{CommandInterpreterService, RbacStore};
use grantline_core::AppError;
use grantline_domain::{PermissionName, RoleName};
use grantline_infrastructure::{GeminiIntentOracle, InMemoryRbacStore, PostgresRbacStore};
use tracing::{info, warn};

use super::connect_and_migrate;
use crate::api_config::{ApiConfig, StoreBackendConfig};
use crate::state::AppState;

pub async fn build_store(config: &ApiConfig) -> Result<Arc<dyn RbacStore>, AppError> {
    match &config.store_backend {
        StoreBackendConfig::Postgres {
            database_url,
            max_connections,
        } => {
            let pool = connect_and_migrate(database_url, *max_connections).await?;
            Ok(Arc::new(PostgresRbacStore::new(
                pool,
                config.store_query_timeout,
            )))
        }
        StoreBackendConfig::Memory {
            seed_roles,
            seed_permissions,
        } => {
            warn!("using in-memory store; grants are lost on restart");
            let store = seeded_memory_store(seed_roles, seed_permissions).await?;
            info!(
                roles = seed_roles.len(),
                permissions = seed_permissions.len(),
                "in-memory store seeded"
            );

            Ok(Arc::new(store))
        }
    }
}

/// Seeds under the same canonical names commands resolve to.
async fn seeded_memory_store(
    seed_roles: &[String],
    seed_permissions: &[String],
) -> Result<InMemoryRbacStore, AppError> {
    let store = InMemoryRbacStore::new();
    for role in seed_roles {
        let name = RoleName::new(role).map_err(|error| invalid_seed("MEMORY_SEED_ROLES", &error))?;
        store
            .seed_role(name.as_str())
            .await
            .map_err(|error| invalid_seed("MEMORY_SEED_ROLES", &error))?;
    }
    for permission in seed_permissions {
        let name = PermissionName::new(permission)
            .map_err(|error| invalid_seed("MEMORY_SEED_PERMISSIONS", &error))?;
        store
            .seed_permission(name.as_str(), None)
            .await
            .map_err(|error| invalid_seed("MEMORY_SEED_PERMISSIONS", &error))?;
    }

    Ok(store)
}

fn invalid_seed(variable: &str, error: &AppError) -> AppError {
    AppError::Configuration(format!("invalid {variable} entry: {error}"))
}

pub fn build_app_state(config: &ApiConfig, store: Arc<dyn RbacStore>) -> Result<AppState, AppError> {
    let http_client = reqwest::Client::builder()
        .build()
        .map_err(|error| AppError::Configuration(format!("failed to build HTTP client: {error}")))?;
    let oracle = Arc::new(GeminiIntentOracle::new(http_client, config.oracle.clone()));

    Ok(AppState {
        command_service: CommandInterpreterService::new(oracle, store, config.interpreter),
    })
}
