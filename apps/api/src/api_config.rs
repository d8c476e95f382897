use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use grantline_application::{InterpreterSettings, RetryPolicy};
use grantline_core::AppError;
use grantline_infrastructure::GeminiOracleConfig;
use tracing_subscriber::EnvFilter;
use url::Url;

const DEFAULT_ORACLE_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_ORACLE_MODEL: &str = "gemini-1.5-flash";
const ORACLE_BACKOFF_MULTIPLIER: u32 = 3;
const STORE_RETRY_BACKOFF: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackendConfig {
    Postgres {
        database_url: String,
        max_connections: u32,
    },
    Memory {
        seed_roles: Vec<String>,
        seed_permissions: Vec<String>,
    },
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub api_host: String,
    pub api_port: u16,
    pub frontend_url: String,
    pub store_backend: StoreBackendConfig,
    pub store_query_timeout: Duration,
    pub oracle: GeminiOracleConfig,
    pub interpreter: InterpreterSettings,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");
        Self::from_lookup(|name| env::var(name).ok(), migrate_only)
    }

    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        migrate_only: bool,
    ) -> Result<Self, AppError> {
        let variables = Variables { lookup: &lookup };

        let frontend_url = variables.or_default("FRONTEND_URL", "http://localhost:3000");
        let api_host = variables.or_default("API_HOST", "127.0.0.1");
        let api_port = variables.parsed("API_PORT", 3001_u16)?;

        let store_backend = match variables.or_default("STORE_BACKEND", "postgres").as_str() {
            "postgres" => StoreBackendConfig::Postgres {
                database_url: variables.required_non_empty("DATABASE_URL")?,
                max_connections: variables.parsed("DATABASE_MAX_CONNECTIONS", 10_u32)?,
            },
            "memory" => StoreBackendConfig::Memory {
                seed_roles: variables.list("MEMORY_SEED_ROLES"),
                seed_permissions: variables.list("MEMORY_SEED_PERMISSIONS"),
            },
            other => {
                return Err(AppError::Configuration(format!(
                    "STORE_BACKEND must be either 'postgres' or 'memory', got '{other}'"
                )));
            }
        };
        if migrate_only && !matches!(store_backend, StoreBackendConfig::Postgres { .. }) {
            return Err(AppError::Configuration(
                "migrate requires STORE_BACKEND=postgres".to_owned(),
            ));
        }

        let store_query_timeout =
            Duration::from_millis(variables.parsed("STORE_QUERY_TIMEOUT_MS", 5_000_u64)?);

        let endpoint = variables.or_default("ORACLE_ENDPOINT", DEFAULT_ORACLE_ENDPOINT);
        let oracle = GeminiOracleConfig {
            endpoint: oracle_endpoint(&endpoint)?,
            api_key: if migrate_only {
                variables.or_default("ORACLE_API_KEY", "")
            } else {
                variables.required_non_empty("ORACLE_API_KEY")?
            },
            model: variables.or_default("ORACLE_MODEL", DEFAULT_ORACLE_MODEL),
        };

        let interpreter = InterpreterSettings {
            oracle_timeout: Duration::from_millis(
                variables.parsed("ORACLE_TIMEOUT_MS", 10_000_u64)?,
            ),
            oracle_retry: RetryPolicy::new(
                variables.parsed("ORACLE_MAX_RETRIES", 2_u8)?,
                Duration::from_millis(variables.parsed("ORACLE_RETRY_BACKOFF_MS", 250_u64)?),
                ORACLE_BACKOFF_MULTIPLIER,
            ),
            store_retry: RetryPolicy::new(
                variables.parsed("STORE_MAX_RETRIES", 1_u8)?,
                STORE_RETRY_BACKOFF,
                1,
            ),
        };

        Ok(Self {
            migrate_only,
            api_host,
            api_port,
            frontend_url,
            store_backend,
            store_query_timeout,
            oracle,
            interpreter,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Configuration(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

struct Variables<'a, F: Fn(&str) -> Option<String>> {
    lookup: &'a F,
}

impl<F: Fn(&str) -> Option<String>> Variables<'_, F> {
    fn or_default(&self, name: &str, default: &str) -> String {
        (self.lookup)(name)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| default.to_owned())
    }

    fn required_non_empty(&self, name: &str) -> Result<String, AppError> {
        let value = (self.lookup)(name)
            .ok_or_else(|| AppError::Configuration(format!("{name} is required")))?;
        if value.trim().is_empty() {
            return Err(AppError::Configuration(format!("{name} must not be empty")));
        }

        Ok(value)
    }

    fn parsed<T>(&self, name: &str, default: T) -> Result<T, AppError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match (self.lookup)(name).filter(|value| !value.trim().is_empty()) {
            Some(value) => value
                .trim()
                .parse::<T>()
                .map_err(|error| AppError::Configuration(format!("invalid {name}: {error}"))),
            None => Ok(default),
        }
    }

    fn list(&self, name: &str) -> Vec<String> {
        (self.lookup)(name)
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|entry| !entry.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn oracle_endpoint(raw: &str) -> Result<String, AppError> {
    let url = Url::parse(raw)
        .map_err(|error| AppError::Configuration(format!("invalid ORACLE_ENDPOINT: {error}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(AppError::Configuration(format!(
            "ORACLE_ENDPOINT must be an http(s) URL, got '{raw}'"
        )));
    }

    Ok(url.as_str().trim_end_matches('/').to_owned())
}
