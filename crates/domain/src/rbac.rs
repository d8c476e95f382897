use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Store identifier of a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleId(i64);

impl RoleId {
    /// Wraps a raw store identifier.
    #[must_use]
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw store identifier.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for RoleId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Store identifier of a permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PermissionId(i64);

impl PermissionId {
    /// Wraps a raw store identifier.
    #[must_use]
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw store identifier.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for PermissionId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Persisted role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Store identifier.
    pub id: RoleId,
    /// Name, unique under case-insensitive comparison.
    pub name: String,
}

/// Persisted permission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    /// Store identifier.
    pub id: PermissionId,
    /// Name, unique under case-insensitive comparison.
    pub name: String,
    /// Optional human description.
    pub description: Option<String>,
}

/// Grant of a permission to a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RolePermission {
    /// Granted role.
    pub role_id: RoleId,
    /// Granted permission.
    pub permission_id: PermissionId,
}

impl RolePermission {
    /// Creates a grant pair.
    #[must_use]
    pub fn new(role_id: RoleId, permission_id: PermissionId) -> Self {
        Self {
            role_id,
            permission_id,
        }
    }
}
