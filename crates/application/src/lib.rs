//! Application services and ports.

#![forbid(unsafe_code)]

mod command_builder;
mod command_service;
mod entity_resolver;
mod intent_oracle_ports;
mod intent_validator;
mod mutation_executor;
mod rbac_store_ports;
mod response_extractor;
mod result_reporter;
mod retry_policy;

pub use command_builder::{CommandBuilder, OraclePrompt};
pub use command_service::{CommandInterpreterService, InterpreterSettings, PipelineStage};
pub use entity_resolver::{EntityResolver, ResolvedTarget};
pub use intent_oracle_ports::IntentOracle;
pub use intent_validator::validate_intent;
pub use mutation_executor::{MutationExecutor, MutationOutcome};
pub use rbac_store_ports::{PermissionUpsert, RbacStore, WriteOutcome};
pub use response_extractor::{extract_intent_payload, redacted_preview};
pub use result_reporter::{CommandReport, public_message, report};
pub use retry_policy::RetryPolicy;
