//! Organisation-scoped actions gated by `has_permission`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An action an actor may attempt against an organisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    /// Read organisation, classroom and schedule data.
    View,
    /// Write individual cells or classroom details.
    Edit,
    /// Delete the organisation.
    Delete,
    /// Add, change or remove teacher memberships.
    ManageTeachers,
    /// Create and remove classrooms or change the organisation shape.
    ManageClassrooms,
}

impl Action {
    /// Every action, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::View,
        Self::Edit,
        Self::Delete,
        Self::ManageTeachers,
        Self::ManageClassrooms,
    ];

    /// Stable wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::ManageTeachers => "manageTeachers",
            Self::ManageClassrooms => "manageClassrooms",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown action name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown action: {0}")]
pub struct ParseActionError(pub String);

impl FromStr for Action {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| ParseActionError(s.to_owned()))
    }
}

/// Per-organisation permission flags held by a membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MembershipPermissions {
    pub view: bool,
    pub edit: bool,
    pub delete: bool,
    pub manage_teachers: bool,
    pub manage_classrooms: bool,
}

impl Default for MembershipPermissions {
    /// Members can see their organisation; everything else is granted explicitly.
    fn default() -> Self {
        Self {
            view: true,
            edit: false,
            delete: false,
            manage_teachers: false,
            manage_classrooms: false,
        }
    }
}

impl MembershipPermissions {
    /// Every flag set.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            view: true,
            edit: true,
            delete: true,
            manage_teachers: true,
            manage_classrooms: true,
        }
    }

    /// Whether the flag for `action` is set.
    #[must_use]
    pub const fn allows(&self, action: Action) -> bool {
        match action {
            Action::View => self.view,
            Action::Edit => self.edit,
            Action::Delete => self.delete,
            Action::ManageTeachers => self.manage_teachers,
            Action::ManageClassrooms => self.manage_classrooms,
        }
    }
}

/// Organisation-independent permissions on a teacher record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlobalPermissions {
    pub view: bool,
    pub edit: bool,
}

impl GlobalPermissions {
    /// Global flags only ever cover viewing and editing.
    #[must_use]
    pub const fn allows(&self, action: Action) -> bool {
        match action {
            Action::View => self.view,
            Action::Edit => self.edit,
            Action::Delete | Action::ManageTeachers | Action::ManageClassrooms => false,
        }
    }
}
