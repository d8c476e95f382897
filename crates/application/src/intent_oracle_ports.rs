use std::time::Duration;

use async_trait::async_trait;

use grantline_core::AppResult;

use crate::command_builder::OraclePrompt;

/// Port to the external text-understanding service.
///
/// The oracle is stateless from the caller's perspective: every call is a
/// single-shot completion with no conversation history.
#[async_trait]
pub trait IntentOracle: Send + Sync {
    /// Sends the prompt and returns the raw completion text.
    ///
    /// Implementations fail with `OracleUnavailable` on transport errors or
    /// when `timeout` elapses, and with `OracleRateLimited` on throttling.
    async fn complete(&self, prompt: &OraclePrompt, timeout: Duration) -> AppResult<String>;
}
