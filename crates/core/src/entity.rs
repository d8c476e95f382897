use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Kinds of RBAC entities the interpreter resolves by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A role row in the `roles` table.
    Role,
    /// A permission row in the `permissions` table.
    Permission,
}

impl EntityKind {
    /// Returns a stable lowercase label for messages and logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Role => "role",
            Self::Permission => "permission",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Entity that could not be resolved against the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingEntity {
    /// Entity kind.
    pub kind: EntityKind,
    /// Normalized name that was looked up.
    pub name: String,
}

impl MissingEntity {
    /// Creates a missing-entity record.
    #[must_use]
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

impl Display for MissingEntity {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{} '{}'", self.kind, self.name)
    }
}

pub(crate) fn join_missing(entities: &[MissingEntity]) -> String {
    entities
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
