use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming free-text instruction.
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct CommandRequest {
    pub prompt: String,
}

/// Confirmation of an applied command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct CommandResponse {
    pub message: String,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct HealthResponse {
    pub status: &'static str,
    pub store: &'static str,
}
