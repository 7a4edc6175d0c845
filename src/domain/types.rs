//! Shared domain enumerations aligned with persisted database enums.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "tool_status", rename_all = "snake_case")]
pub enum ToolStatus {
    Draft,
    Published,
}

impl ToolStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ToolStatus::Draft => "draft",
            ToolStatus::Published => "published",
        }
    }
}

impl TryFrom<&str> for ToolStatus {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "draft" => Ok(ToolStatus::Draft),
            "published" => Ok(ToolStatus::Published),
            _ => Err(()),
        }
    }
}

/// Shared-credential access for a tool.
///
/// Modeled as a tagged variant so a password can only exist on a tool that
/// has shared access enabled; the storage layer maps this to the legacy
/// three-column shape (`shared_enabled`, `shared_email`, `shared_password`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SharedAccess {
    Disabled,
    Enabled {
        email: String,
        password: Option<String>,
    },
}

impl SharedAccess {
    /// Reassemble from the persisted column triple. An enabled flag without
    /// an email degrades to `Disabled` rather than fabricating credentials.
    pub fn from_columns(enabled: bool, email: Option<String>, password: Option<String>) -> Self {
        match (enabled, email) {
            (true, Some(email)) => SharedAccess::Enabled { email, password },
            _ => SharedAccess::Disabled,
        }
    }

    /// Flatten back into the persisted column triple.
    pub fn into_columns(self) -> (bool, Option<String>, Option<String>) {
        match self {
            SharedAccess::Disabled => (false, None, None),
            SharedAccess::Enabled { email, password } => (true, Some(email), password),
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, SharedAccess::Enabled { .. })
    }
}
