//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod gemini_intent_oracle;
mod in_memory_rbac_store;
mod postgres_rbac_store;

pub use gemini_intent_oracle::{GeminiIntentOracle, GeminiOracleConfig};
pub use in_memory_rbac_store::InMemoryRbacStore;
pub use postgres_rbac_store::PostgresRbacStore;
