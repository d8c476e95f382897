//! Canonical naming rules for roles and permissions.
//!
//! Names are compared case-insensitively in the store, so the canonical form
//! is always lowercase with single spaces. Permission names additionally use
//! `:` between words when the source was written as a natural-language phrase
//! ("Edit Article" becomes `edit:article`).

use std::fmt::{Display, Formatter};

use grantline_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Canonical separator between permission name segments.
pub const PERMISSION_SEPARATOR: char = ':';

/// Maximum length of a normalized role or permission name.
pub const NAME_MAX_LENGTH: usize = 128;

/// Characters that mark a permission name as already structured.
const STRUCTURED_SEPARATORS: [char; 2] = [PERMISSION_SEPARATOR, '.'];

/// Normalized role name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleName(String);

impl RoleName {
    /// Lower-cases and collapses whitespace.
    pub fn new(value: impl AsRef<str>) -> AppResult<Self> {
        let normalized = collapse_whitespace(value.as_ref());
        validate_length("role", normalized.as_str())?;
        Ok(Self(normalized))
    }

    /// Returns the normalized name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for RoleName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Normalized permission name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionName(String);

impl PermissionName {
    /// Lower-cases, collapses whitespace and joins natural-language phrasing
    /// with the canonical separator.
    ///
    /// Names that already contain a separator keep their spacing untouched.
    pub fn new(value: impl AsRef<str>) -> AppResult<Self> {
        let collapsed = collapse_whitespace(value.as_ref());
        validate_length("permission", collapsed.as_str())?;

        if collapsed.contains(STRUCTURED_SEPARATORS) {
            return Ok(Self(collapsed));
        }

        let joined = collapsed.replace(' ', &PERMISSION_SEPARATOR.to_string());
        Ok(Self(joined))
    }

    /// Returns the normalized name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for PermissionName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

impl From<RoleName> for String {
    fn from(value: RoleName) -> Self {
        value.0
    }
}

impl From<PermissionName> for String {
    fn from(value: PermissionName) -> Self {
        value.0
    }
}

fn collapse_whitespace(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn validate_length(field: &str, value: &str) -> AppResult<()> {
    if value.is_empty() {
        return Err(AppError::SchemaInvalid(format!(
            "field '{field}' must not be empty"
        )));
    }

    if value.chars().count() > NAME_MAX_LENGTH {
        return Err(AppError::SchemaInvalid(format!(
            "field '{field}' must not exceed {NAME_MAX_LENGTH} characters"
        )));
    }

    Ok(())
}
