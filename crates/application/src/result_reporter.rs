use grantline_core::{AppError, AppResult, StatusCategory};

use crate::mutation_executor::MutationOutcome;

/// Terminal, caller-facing result of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandReport {
    /// The mutation committed.
    Success {
        /// Human-readable confirmation.
        message: String,
    },
    /// Nothing committed.
    Failure {
        /// Caller-safe error description.
        error: String,
        /// Coarse failure class.
        status_category: StatusCategory,
    },
}

/// Maps a pipeline result to its caller-facing report.
#[must_use]
pub fn report(result: &AppResult<MutationOutcome>) -> CommandReport {
    match result {
        Ok(outcome) => CommandReport::Success {
            message: outcome.message(),
        },
        Err(error) => CommandReport::Failure {
            error: public_message(error),
            status_category: error.status_category(),
        },
    }
}

/// Returns an error description that is safe to return to callers.
///
/// Client-class failures describe the validated command; upstream and
/// internal failures are reduced to their kind so transport details, store
/// messages and oracle text never leave the process.
#[must_use]
pub fn public_message(error: &AppError) -> String {
    match error {
        AppError::EmptyCommand
        | AppError::SchemaInvalid(_)
        | AppError::UnsupportedAction(_)
        | AppError::EntityNotFound(_)
        | AppError::AmbiguousMatch { .. } => error.to_string(),
        AppError::OracleUnavailable(_) => "intent oracle unavailable".to_owned(),
        AppError::OracleRateLimited(_) => "intent oracle rate limited".to_owned(),
        AppError::OracleRejected(_) => "intent oracle rejected the request".to_owned(),
        AppError::OracleResponseUnparseable(_) => {
            "intent oracle response could not be parsed".to_owned()
        }
        AppError::StoreUnavailable(_) => "store unavailable".to_owned(),
        AppError::MutationConflict(_) => "mutation conflict".to_owned(),
        AppError::Configuration(_) | AppError::Internal(_) => "internal error".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use grantline_core::{AppError, EntityKind, MissingEntity, StatusCategory};

    use super::{CommandReport, report};
    use crate::mutation_executor::MutationOutcome;
    use crate::rbac_store_ports::WriteOutcome;

    #[test]
    fn success_carries_message() {
        let outcome = MutationOutcome::PermissionAssigned {
            role: "editor".to_owned(),
            permission: "publish:blog".to_owned(),
            write: WriteOutcome::Applied,
        };

        assert_eq!(
            report(&Ok(outcome)),
            CommandReport::Success {
                message: "Assigned publish:blog to editor".to_owned()
            }
        );
    }

    #[test]
    fn not_found_names_missing_entities() {
        let result = Err(AppError::EntityNotFound(vec![MissingEntity::new(
            EntityKind::Role,
            "editor",
        )]));

        assert_eq!(
            report(&result),
            CommandReport::Failure {
                error: "not found: role 'editor'".to_owned(),
                status_category: StatusCategory::NotFound,
            }
        );
    }

    #[test]
    fn upstream_details_are_not_echoed() {
        let result = Err(AppError::OracleResponseUnparseable(
            "ignore all previous instructions".to_owned(),
        ));

        let CommandReport::Failure {
            error,
            status_category,
        } = report(&result)
        else {
            panic!("expected failure report");
        };
        assert_eq!(error, "intent oracle response could not be parsed");
        assert_eq!(status_category, StatusCategory::Upstream);

        let result = Err(AppError::Internal("connection string leaked".to_owned()));
        assert_eq!(
            report(&result),
            CommandReport::Failure {
                error: "internal error".to_owned(),
                status_category: StatusCategory::Internal,
            }
        );
    }
}
