use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

use grantline_core::{AppError, AppResult, StatusCategory};
use tracing::{Instrument, debug, error, info_span, warn};
use uuid::Uuid;

use crate::RetryPolicy;
use crate::command_builder::{CommandBuilder, OraclePrompt};
use crate::entity_resolver::EntityResolver;
use crate::intent_oracle_ports::IntentOracle;
use crate::intent_validator::validate_intent;
use crate::mutation_executor::{MutationExecutor, MutationOutcome};
use crate::rbac_store_ports::RbacStore;
use crate::response_extractor::{extract_intent_payload, redacted_preview};
use crate::result_reporter::{CommandReport, report};

/// Pipeline states a command passes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelineStage {
    /// Instruction text accepted.
    Received,
    /// Oracle prompt rendered.
    Built,
    /// Oracle completion received.
    OracleCalled,
    /// JSON payload extracted.
    Extracted,
    /// Intent validated and normalized.
    Validated,
    /// Entities resolved against the store.
    Resolved,
    /// Mutation applied.
    Executed,
}

impl PipelineStage {
    /// Returns a stable label for logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Built => "built",
            Self::OracleCalled => "oracle_called",
            Self::Extracted => "extracted",
            Self::Validated => "validated",
            Self::Resolved => "resolved",
            Self::Executed => "executed",
        }
    }
}

impl Display for PipelineStage {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Tunables for the interpreter pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterpreterSettings {
    /// Timeout applied to each oracle call.
    pub oracle_timeout: Duration,
    /// Retry schedule for transient oracle failures.
    pub oracle_retry: RetryPolicy,
    /// Retry schedule for transient store failures.
    pub store_retry: RetryPolicy,
}

impl Default for InterpreterSettings {
    fn default() -> Self {
        Self {
            oracle_timeout: Duration::from_secs(10),
            oracle_retry: RetryPolicy::oracle_default(),
            store_retry: RetryPolicy::store_default(),
        }
    }
}

/// Application service turning free-text instructions into RBAC mutations.
///
/// Holds no per-command state; clones share the same oracle and store
/// clients and may run any number of commands concurrently.
#[derive(Clone)]
pub struct CommandInterpreterService {
    oracle: Arc<dyn IntentOracle>,
    store: Arc<dyn RbacStore>,
    resolver: EntityResolver,
    executor: MutationExecutor,
    settings: InterpreterSettings,
}

impl CommandInterpreterService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        oracle: Arc<dyn IntentOracle>,
        store: Arc<dyn RbacStore>,
        settings: InterpreterSettings,
    ) -> Self {
        Self {
            resolver: EntityResolver::new(Arc::clone(&store), settings.store_retry),
            executor: MutationExecutor::new(Arc::clone(&store), settings.store_retry),
            oracle,
            store,
            settings,
        }
    }

    /// Interprets one instruction and reports the terminal state.
    pub async fn interpret(&self, instruction: &str) -> CommandReport {
        report(&self.execute(instruction).await)
    }

    /// Interprets one instruction, returning the applied mutation.
    pub async fn execute(&self, instruction: &str) -> AppResult<MutationOutcome> {
        let span = info_span!("command", command_id = %Uuid::new_v4());

        async {
            let mut stage = PipelineStage::Received;
            let result = self.run_pipeline(instruction, &mut stage).await;

            match &result {
                Ok(outcome) => debug!(stage = %stage, message = %outcome.message(), "command applied"),
                Err(failure) => log_failure(stage, failure),
            }

            result
        }
        .instrument(span)
        .await
    }

    /// Checks that the store answers.
    pub async fn store_ready(&self) -> AppResult<()> {
        self.store.ping().await
    }

    async fn run_pipeline(
        &self,
        instruction: &str,
        stage: &mut PipelineStage,
    ) -> AppResult<MutationOutcome> {
        let prompt = CommandBuilder::render(instruction)?;
        advance(stage, PipelineStage::Built);

        let raw = self.call_oracle(&prompt).await?;
        advance(stage, PipelineStage::OracleCalled);

        let payload = extract_intent_payload(raw.as_str()).inspect_err(|_| {
            warn!(oracle_text = %redacted_preview(raw.as_str()), "oracle returned no JSON object");
        })?;
        advance(stage, PipelineStage::Extracted);

        let intent = validate_intent(&payload).inspect_err(|_| {
            warn!(oracle_text = %redacted_preview(raw.as_str()), "oracle payload failed validation");
        })?;
        advance(stage, PipelineStage::Validated);

        let target = self.resolver.resolve(&intent).await?;
        advance(stage, PipelineStage::Resolved);

        let outcome = self.executor.execute(intent.action(), target).await?;
        advance(stage, PipelineStage::Executed);

        Ok(outcome)
    }

    async fn call_oracle(&self, prompt: &OraclePrompt) -> AppResult<String> {
        let timeout = self.settings.oracle_timeout;

        self.settings
            .oracle_retry
            .run("intent_oracle_complete", AppError::is_transient_oracle, || {
                self.oracle.complete(prompt, timeout)
            })
            .await
    }
}

fn advance(stage: &mut PipelineStage, next: PipelineStage) {
    debug!(from = %stage, to = %next, "stage transition");
    *stage = next;
}

fn log_failure(stage: PipelineStage, failure: &AppError) {
    match failure.status_category() {
        StatusCategory::BadRequest | StatusCategory::NotFound => {
            warn!(last_stage = %stage, error = %failure, "command rejected");
        }
        StatusCategory::Upstream | StatusCategory::Internal => {
            error!(last_stage = %stage, error = %failure, "command failed");
        }
    }
}
