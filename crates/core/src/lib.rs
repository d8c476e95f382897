//! Shared primitives for all Rust crates in Grantline.

#![forbid(unsafe_code)]

/// Entity kinds referenced by resolution errors.
pub mod entity;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use entity::{EntityKind, MissingEntity};

/// Result type used across Grantline crates.
pub type AppResult<T> = Result<T, AppError>;

/// Coarse caller-facing classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCategory {
    /// The command itself is malformed or unsupported.
    BadRequest,
    /// A named role or permission could not be resolved.
    NotFound,
    /// The intent oracle failed.
    Upstream,
    /// The store or the service itself failed.
    Internal,
}

impl StatusCategory {
    /// Returns a stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadRequest => "bad_request",
            Self::NotFound => "not_found",
            Self::Upstream => "upstream",
            Self::Internal => "internal",
        }
    }
}

/// Failure taxonomy of the command interpretation pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    /// Instruction text was empty or whitespace only.
    #[error("command must not be empty")]
    EmptyCommand,

    /// Oracle could not be reached or timed out.
    #[error("intent oracle unavailable: {0}")]
    OracleUnavailable(String),

    /// Oracle signalled throttling.
    #[error("intent oracle rate limited: {0}")]
    OracleRateLimited(String),

    /// Oracle refused the request with a non-retryable status.
    #[error("intent oracle rejected the request: {0}")]
    OracleRejected(String),

    /// Oracle output did not contain a JSON object.
    #[error("intent oracle response could not be parsed: {0}")]
    OracleResponseUnparseable(String),

    /// Oracle JSON is missing required fields or has wrong field types.
    #[error("intent schema invalid: {0}")]
    SchemaInvalid(String),

    /// Oracle JSON named an action outside the recognized set.
    #[error("unsupported action '{0}'")]
    UnsupportedAction(String),

    /// One or more named entities do not exist.
    #[error("not found: {}", entity::join_missing(.0))]
    EntityNotFound(Vec<MissingEntity>),

    /// A name matched more than one stored entity.
    #[error("{kind} name '{name}' matched {matches} entries")]
    AmbiguousMatch {
        /// Entity kind.
        kind: EntityKind,
        /// Name that was looked up.
        name: String,
        /// Number of rows that matched.
        matches: usize,
    },

    /// Store reported an integrity violation other than the expected uniqueness collision.
    #[error("mutation conflict: {0}")]
    MutationConflict(String),

    /// Store could not be reached or timed out.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Process configuration is invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the caller-facing category for this failure.
    #[must_use]
    pub fn status_category(&self) -> StatusCategory {
        match self {
            Self::EmptyCommand | Self::SchemaInvalid(_) | Self::UnsupportedAction(_) => {
                StatusCategory::BadRequest
            }
            Self::EntityNotFound(_) | Self::AmbiguousMatch { .. } => StatusCategory::NotFound,
            Self::OracleUnavailable(_)
            | Self::OracleRateLimited(_)
            | Self::OracleRejected(_)
            | Self::OracleResponseUnparseable(_) => StatusCategory::Upstream,
            Self::StoreUnavailable(_)
            | Self::MutationConflict(_)
            | Self::Configuration(_)
            | Self::Internal(_) => StatusCategory::Internal,
        }
    }

    /// Returns true when a failed oracle call may be retried.
    #[must_use]
    pub fn is_transient_oracle(&self) -> bool {
        matches!(self, Self::OracleUnavailable(_) | Self::OracleRateLimited(_))
    }

    /// Returns true when a failed store call may be retried.
    #[must_use]
    pub fn is_transient_store(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}
