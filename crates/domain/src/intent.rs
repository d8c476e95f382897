use std::fmt::{Display, Formatter};
use std::str::FromStr;

use grantline_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::naming::{PermissionName, RoleName};

/// Mutations the interpreter can derive from free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentAction {
    /// Grants a permission to a role.
    AssignPermission,
    /// Revokes a permission from a role.
    RemovePermission,
    /// Creates a permission.
    CreatePermission,
}

impl IntentAction {
    /// Returns a stable transport value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AssignPermission => "assign_permission",
            Self::RemovePermission => "remove_permission",
            Self::CreatePermission => "create_permission",
        }
    }

    /// Returns all recognized actions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[IntentAction] = &[
            IntentAction::AssignPermission,
            IntentAction::RemovePermission,
            IntentAction::CreatePermission,
        ];

        ALL
    }

    /// Returns whether the action operates on a role.
    #[must_use]
    pub fn requires_role(&self) -> bool {
        matches!(self, Self::AssignPermission | Self::RemovePermission)
    }
}

impl Display for IntentAction {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for IntentAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|action| action.as_str() == value)
            .ok_or_else(|| AppError::UnsupportedAction(value.to_owned()))
    }
}

/// Validated, normalized command derived from one instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intent {
    action: IntentAction,
    role: Option<RoleName>,
    permission: PermissionName,
    description: Option<String>,
}

impl Intent {
    /// Creates an intent, enforcing which names each action needs.
    ///
    /// Roles supplied to actions that do not operate on a role are dropped.
    pub fn new(
        action: IntentAction,
        role: Option<RoleName>,
        permission: PermissionName,
        description: Option<String>,
    ) -> AppResult<Self> {
        let role = match (action.requires_role(), role) {
            (true, Some(role)) => Some(role),
            (true, None) => {
                return Err(AppError::SchemaInvalid(format!(
                    "action '{action}' requires field 'role'"
                )));
            }
            (false, _) => None,
        };

        let description = description
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        Ok(Self {
            action,
            role,
            permission,
            description,
        })
    }

    /// Returns the requested action.
    #[must_use]
    pub fn action(&self) -> IntentAction {
        self.action
    }

    /// Returns the role name for role-bearing actions.
    #[must_use]
    pub fn role(&self) -> Option<&RoleName> {
        self.role.as_ref()
    }

    /// Returns the permission name.
    #[must_use]
    pub fn permission(&self) -> &PermissionName {
        &self.permission
    }

    /// Returns the optional permission description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}
