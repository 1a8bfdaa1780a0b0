//! Shared validation helpers for inbound HTTP adapters.
//!
//! Every failure is an `invalid_request` whose details name the offending
//! field, so clients can point at the exact input that was rejected.

use serde_json::{Map, Value, json};

use crate::domain::{
    Action, ClassroomId, Error, IdentifierError, MembershipPermissions, OrganisationId,
};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    EmptyIdentifier,
    InvalidPermissionFlag,
    UnknownPermission,
}

impl ErrorCode {
    const fn as_str(self) -> &'static str {
        match self {
            Self::MissingField => "missing_field",
            Self::EmptyIdentifier => "empty_identifier",
            Self::InvalidPermissionFlag => "invalid_permission_flag",
            Self::UnknownPermission => "unknown_permission",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    const fn as_str(self) -> &'static str {
        self.0
    }
}

fn field_error(field: &str, message: impl Into<String>, code: ErrorCode) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field,
        "code": code.as_str(),
    }))
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let name = field.as_str();
    field_error(
        name,
        format!("missing required field: {name}"),
        ErrorCode::MissingField,
    )
}

/// Unwrap a required payload field.
pub(crate) fn require<T>(value: Option<T>, field: FieldName) -> Result<T, Error> {
    value.ok_or_else(|| missing_field_error(field))
}

fn map_identifier_error(error: &IdentifierError) -> Error {
    match error {
        IdentifierError::Empty { field } => {
            field_error(field, error.to_string(), ErrorCode::EmptyIdentifier)
        }
    }
}

pub(crate) fn parse_organisation_id(raw: &str) -> Result<OrganisationId, Error> {
    OrganisationId::new(raw).map_err(|error| map_identifier_error(&error))
}

pub(crate) fn parse_classroom_id(raw: &str) -> Result<ClassroomId, Error> {
    ClassroomId::new(raw).map_err(|error| map_identifier_error(&error))
}

/// Build membership permissions from a JSON object of flags.
///
/// Absent flags keep their defaults. Each present flag must be a JSON
/// boolean named after an [`Action`].
pub(crate) fn parse_permissions(
    flags: &Map<String, Value>,
) -> Result<MembershipPermissions, Error> {
    let mut permissions = MembershipPermissions::default();
    for (name, value) in flags {
        let field = format!("permissions.{name}");
        let action = name.parse::<Action>().map_err(|_| {
            field_error(
                &field,
                format!("unknown permission: {name}"),
                ErrorCode::UnknownPermission,
            )
        })?;
        let Some(granted) = value.as_bool() else {
            return Err(field_error(
                &field,
                format!("{field} must be a boolean"),
                ErrorCode::InvalidPermissionFlag,
            ));
        };
        match action {
            Action::View => permissions.view = granted,
            Action::Edit => permissions.edit = granted,
            Action::Delete => permissions.delete = granted,
            Action::ManageTeachers => permissions.manage_teachers = granted,
            Action::ManageClassrooms => permissions.manage_classrooms = granted,
        }
    }
    Ok(permissions)
}
