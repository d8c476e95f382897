use std::str::FromStr;

use grantline_core::{AppError, AppResult};
use grantline_domain::{Intent, IntentAction, PermissionName, RoleName};
use serde_json::{Map, Value};

const ACTION_ECHO_LIMIT: usize = 64;

/// Schema-checks an oracle payload and normalizes it into an [`Intent`].
///
/// The action is checked before any other field, so an unrecognized action
/// is reported as unsupported even when the remaining fields are malformed.
pub fn validate_intent(payload: &Value) -> AppResult<Intent> {
    let object = payload.as_object().ok_or_else(|| {
        AppError::SchemaInvalid("top-level value must be a JSON object".to_owned())
    })?;

    let action = parse_action(required_string(object, "action")?)?;
    let permission = PermissionName::new(required_string(object, "permission")?)?;

    let role = if action.requires_role() {
        Some(RoleName::new(required_string(object, "role")?)?)
    } else {
        optional_string(object, "role")?;
        None
    };

    let description = optional_string(object, "description")?.map(str::to_owned);

    Intent::new(action, role, permission, description)
}

fn parse_action(value: &str) -> AppResult<IntentAction> {
    let normalized = value.trim().to_lowercase();
    IntentAction::from_str(normalized.as_str()).map_err(|_| {
        AppError::UnsupportedAction(normalized.chars().take(ACTION_ECHO_LIMIT).collect())
    })
}

fn required_string<'a>(object: &'a Map<String, Value>, field: &str) -> AppResult<&'a str> {
    match object.get(field) {
        Some(Value::String(value)) => Ok(value.as_str()),
        Some(Value::Null) | None => Err(AppError::SchemaInvalid(format!(
            "missing required field '{field}'"
        ))),
        Some(_) => Err(AppError::SchemaInvalid(format!(
            "field '{field}' must be a string"
        ))),
    }
}

fn optional_string<'a>(object: &'a Map<String, Value>, field: &str) -> AppResult<Option<&'a str>> {
    match object.get(field) {
        Some(Value::String(value)) => Ok(Some(value.as_str())),
        Some(Value::Null) | None => Ok(None),
        Some(_) => Err(AppError::SchemaInvalid(format!(
            "field '{field}' must be a string"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use grantline_core::AppError;
    use grantline_domain::IntentAction;
    use serde_json::json;

    use super::validate_intent;

    #[test]
    fn assign_permission_is_normalized() {
        let intent = validate_intent(&json!({
            "action": "assign_permission",
            "role": "  Senior   Editor ",
            "permission": "Edit Article"
        }));

        let Ok(intent) = intent else {
            panic!("intent should validate");
        };
        assert_eq!(intent.action(), IntentAction::AssignPermission);
        assert_eq!(intent.role().map(|role| role.as_str()), Some("senior editor"));
        assert_eq!(intent.permission().as_str(), "edit:article");
    }

    #[test]
    fn missing_action_is_schema_invalid() {
        let result = validate_intent(&json!({"role": "editor", "permission": "publish:blog"}));
        assert_eq!(
            result,
            Err(AppError::SchemaInvalid(
                "missing required field 'action'".to_owned()
            ))
        );
    }

    #[test]
    fn non_string_fields_are_schema_invalid() {
        let result = validate_intent(&json!({
            "action": "assign_permission",
            "role": 7,
            "permission": "publish:blog"
        }));
        assert_eq!(
            result,
            Err(AppError::SchemaInvalid("field 'role' must be a string".to_owned()))
        );

        let result = validate_intent(&json!({"action": ["assign_permission"]}));
        assert!(matches!(result, Err(AppError::SchemaInvalid(_))));
    }

    #[test]
    fn non_object_payload_is_schema_invalid() {
        assert!(matches!(
            validate_intent(&json!("assign_permission")),
            Err(AppError::SchemaInvalid(_))
        ));
    }

    #[test]
    fn unknown_action_is_unsupported() {
        let result = validate_intent(&json!({
            "action": "delete_everything",
            "role": "editor",
            "permission": "publish:blog"
        }));
        assert_eq!(
            result,
            Err(AppError::UnsupportedAction("delete_everything".to_owned()))
        );
    }

    #[test]
    fn action_matching_ignores_case_and_padding() {
        let result = validate_intent(&json!({
            "action": " Remove_Permission ",
            "role": "editor",
            "permission": "publish:blog"
        }));
        assert_eq!(
            result.map(|intent| intent.action()),
            Ok(IntentAction::RemovePermission)
        );
    }

    #[test]
    fn create_permission_needs_only_permission() {
        let result = validate_intent(&json!({
            "action": "create_permission",
            "permission": "Publish Blog",
            "description": "Publish posts to the blog"
        }));

        let Ok(intent) = result else {
            panic!("create_permission should validate without a role");
        };
        assert!(intent.role().is_none());
        assert_eq!(intent.permission().as_str(), "publish:blog");
        assert_eq!(intent.description(), Some("Publish posts to the blog"));
    }

    #[test]
    fn create_permission_still_type_checks_role() {
        let result = validate_intent(&json!({
            "action": "create_permission",
            "role": {"name": "editor"},
            "permission": "publish:blog"
        }));
        assert!(matches!(result, Err(AppError::SchemaInvalid(_))));
    }

    #[test]
    fn remove_without_role_is_schema_invalid() {
        let result = validate_intent(&json!({
            "action": "remove_permission",
            "permission": "publish:blog"
        }));
        assert_eq!(
            result,
            Err(AppError::SchemaInvalid("missing required field 'role'".to_owned()))
        );
    }
}
