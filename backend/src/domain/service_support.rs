//! Shared helpers for domain services: permission gating and translation of
//! model and port failures into [`Error`] payloads.

use serde_json::json;

use crate::domain::grid::GridError;
use crate::domain::ports::{
    AccessPolicy, AccessPolicyError, OrganisationRepositoryError, TeacherRepositoryError,
};
use crate::domain::{
    Action, CellValidationError, Error, MembershipError, OrganisationError, OrganisationId,
    ScheduleError, TeacherId, TeacherValidationError,
};

/// Short-circuit with `Forbidden` unless `actor` may perform `action`.
///
/// The message never mentions whether the organisation exists.
pub(crate) async fn authorize<A>(
    access: &A,
    actor: TeacherId,
    organisation_id: &OrganisationId,
    action: Action,
) -> Result<(), Error>
where
    A: AccessPolicy + ?Sized,
{
    let allowed = access
        .has_permission(actor, organisation_id, action)
        .await
        .map_err(map_access_error)?;
    if allowed {
        Ok(())
    } else {
        Err(Error::forbidden(format!("{action} permission required")).with_details(json!({
            "action": action.as_str(),
            "code": "permission_denied",
        })))
    }
}

pub(crate) fn map_access_error(error: AccessPolicyError) -> Error {
    match error {
        AccessPolicyError::Connection { message } => {
            Error::service_unavailable(format!("access policy unavailable: {message}"))
        }
        AccessPolicyError::Query { message } => {
            Error::internal(format!("access policy error: {message}"))
        }
    }
}

pub(crate) fn revision_conflict(expected: Option<u32>, actual: u32) -> Error {
    Error::conflict("revision mismatch").with_details(json!({
        "expectedRevision": expected,
        "actualRevision": actual,
        "code": "revision_mismatch",
    }))
}

pub(crate) fn organisation_not_found(organisation_id: &OrganisationId) -> Error {
    Error::not_found(format!("organisation {organisation_id} not found")).with_details(json!({
        "organisationId": organisation_id.as_str(),
        "code": "organisation_not_found",
    }))
}

pub(crate) fn teacher_not_found(teacher_id: TeacherId) -> Error {
    Error::not_found(format!("teacher {teacher_id} not found")).with_details(json!({
        "teacherId": teacher_id,
        "code": "teacher_not_found",
    }))
}

pub(crate) fn invalid_field(field: &str, message: impl Into<String>, code: &str) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field,
        "code": code,
    }))
}

pub(crate) fn map_organisation_repository_error(error: OrganisationRepositoryError) -> Error {
    match error {
        OrganisationRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("organisation repository unavailable: {message}"))
        }
        OrganisationRepositoryError::Query { message } => {
            Error::internal(format!("organisation repository error: {message}"))
        }
        OrganisationRepositoryError::RevisionMismatch { expected, actual } => {
            revision_conflict(Some(expected), actual)
        }
        OrganisationRepositoryError::Duplicate { organisation_id } => Error::conflict(format!(
            "organisation {organisation_id} already exists"
        ))
        .with_details(json!({
            "organisationId": organisation_id,
            "code": "duplicate_organisation",
        })),
        OrganisationRepositoryError::Missing { organisation_id } => {
            Error::not_found(format!("organisation {organisation_id} not found")).with_details(
                json!({
                    "organisationId": organisation_id,
                    "code": "organisation_not_found",
                }),
            )
        }
    }
}

pub(crate) fn map_teacher_repository_error(error: TeacherRepositoryError) -> Error {
    match error {
        TeacherRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("teacher repository unavailable: {message}"))
        }
        TeacherRepositoryError::Query { message } => {
            Error::internal(format!("teacher repository error: {message}"))
        }
        TeacherRepositoryError::RevisionMismatch { expected, actual } => {
            revision_conflict(Some(expected), actual)
        }
        TeacherRepositoryError::DuplicateEmail { email } => {
            Error::conflict(format!("email {email} is already registered")).with_details(json!({
                "field": "email",
                "code": "duplicate_email",
            }))
        }
        TeacherRepositoryError::Missing { teacher_id } => {
            teacher_not_found(TeacherId::new(teacher_id))
        }
    }
}

/// Translate addressing failures, naming the offending field.
pub(crate) fn map_grid_error(error: GridError) -> Error {
    let message = error.to_string();
    match error {
        GridError::OutOfRange {
            day,
            period,
            days_count,
            period_count,
        } => {
            let field = if day >= days_count { "day" } else { "period" };
            Error::invalid_request(message).with_details(json!({
                "field": field,
                "day": day,
                "period": period,
                "daysCount": days_count,
                "periodCount": period_count,
                "code": "out_of_range",
            }))
        }
        GridError::ShapeMismatch { expected, actual } => {
            Error::invalid_request(message).with_details(json!({
                "field": "grid",
                "expected": expected,
                "actual": actual,
                "code": "shape_mismatch",
            }))
        }
        GridError::InvalidShape {
            days_count,
            period_count,
        } => {
            let field = if period_count == 0 && days_count != 0 {
                "periodCount"
            } else {
                "daysCount"
            };
            Error::invalid_request(message).with_details(json!({
                "field": field,
                "daysCount": days_count,
                "periodCount": period_count,
                "code": "invalid_shape",
            }))
        }
    }
}

pub(crate) fn map_organisation_error(error: OrganisationError) -> Error {
    match error {
        OrganisationError::ClassroomNotFound(classroom_id) => {
            Error::not_found(format!("classroom {classroom_id} not found")).with_details(json!({
                "classroomId": classroom_id.as_str(),
                "code": "classroom_not_found",
            }))
        }
        OrganisationError::DuplicateClassroom(classroom_id) => {
            Error::conflict(format!("classroom {classroom_id} already exists")).with_details(
                json!({
                    "classroomId": classroom_id.as_str(),
                    "code": "duplicate_classroom",
                }),
            )
        }
        OrganisationError::Grid(error) => map_grid_error(error),
    }
}

pub(crate) fn map_cell_validation_error(error: CellValidationError) -> Error {
    let message = error.to_string();
    match error {
        CellValidationError::UnknownTeacher { teacher_id, .. } => Error::invalid_request(message)
            .with_details(json!({
                "field": "teachers",
                "teacherId": teacher_id,
                "code": "unknown_teacher",
            })),
        CellValidationError::UnteachableSubject { subject } => Error::invalid_request(message)
            .with_details(json!({
                "field": "subjects",
                "subject": subject,
                "code": "unteachable_subject",
            })),
        CellValidationError::TeacherNotInRoster {
            teacher_id,
            classroom_id,
        } => Error::invalid_request(message).with_details(json!({
            "field": "teachers",
            "teacherId": teacher_id,
            "classroomId": classroom_id,
            "code": "teacher_not_in_roster",
        })),
    }
}

pub(crate) fn map_membership_error(error: MembershipError) -> Error {
    let message = error.to_string();
    match error {
        MembershipError::EmptySubjects => invalid_field("subjects", message, "empty_subjects"),
        MembershipError::EmptyClasses => invalid_field("classes", message, "empty_classes"),
        MembershipError::Duplicate { teacher_id, .. } => {
            Error::conflict(message).with_details(json!({
                "teacherId": teacher_id,
                "code": "duplicate_membership",
            }))
        }
        MembershipError::NotAMember { teacher_id, .. } => {
            Error::not_found(message).with_details(json!({
                "teacherId": teacher_id,
                "code": "not_a_member",
            }))
        }
    }
}

pub(crate) fn map_schedule_error(error: ScheduleError) -> Error {
    let message = error.to_string();
    match error {
        ScheduleError::NotAMember { teacher_id, .. } => {
            Error::not_found(message).with_details(json!({
                "teacherId": teacher_id,
                "code": "not_a_member",
            }))
        }
    }
}

pub(crate) fn map_teacher_validation_error(error: TeacherValidationError) -> Error {
    let message = error.to_string();
    match error {
        TeacherValidationError::EmptyName => invalid_field("name", message, "empty_name"),
        TeacherValidationError::InvalidEmail(_) => invalid_field("email", message, "invalid_email"),
    }
}
