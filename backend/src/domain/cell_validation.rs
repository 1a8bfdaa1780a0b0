//! Cross-reference checks between a cell and teacher memberships.
//!
//! Runs on every whole-cell write before anything is applied, so a rejected
//! write leaves the stored cell untouched.

use std::collections::BTreeSet;

use super::grid::Cell;
use super::{Classroom, OrganisationId, TeacherId, TeacherMembership};

/// Reasons a cell may not be written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CellValidationError {
    /// The teacher does not exist or has no active membership.
    #[error("teacher {teacher_id} is not an active member of {organisation_id}")]
    UnknownTeacher {
        teacher_id: TeacherId,
        organisation_id: OrganisationId,
    },
    /// No teacher in the cell teaches this subject in the organisation.
    #[error("no teacher in the cell teaches {subject}")]
    UnteachableSubject { subject: String },
    /// The teacher is not on the classroom's assigned roster.
    #[error("teacher {teacher_id} is not assigned to classroom {classroom_id}")]
    TeacherNotInRoster {
        teacher_id: TeacherId,
        classroom_id: String,
    },
}

/// Check that every teacher is an active member and every subject is
/// teachable by at least one of the cell's teachers.
///
/// `membership` resolves a teacher to its active membership in
/// `organisation_id`, or `None` when the teacher is unknown or inactive.
/// A cell with subjects but no teachers always fails.
///
/// # Examples
/// ```
/// use timetable::domain::grid::Cell;
/// use timetable::domain::{
///     validate_cell, CellValidationError, MembershipPermissions, OrganisationId, TeacherId,
///     TeacherMembership,
/// };
///
/// let org = OrganisationId::new("school").expect("valid id");
/// let math = TeacherMembership::new(
///     org.clone(),
///     ["Math"],
///     ["7A"],
///     MembershipPermissions::default(),
///     chrono::DateTime::<chrono::Utc>::UNIX_EPOCH,
/// )
/// .expect("valid membership");
/// let lookup = |id: TeacherId| (id == TeacherId::new(1)).then_some(&math);
///
/// let physics = Cell::new([TeacherId::new(1)], ["Physics"]);
/// assert!(matches!(
///     validate_cell(&physics, &org, lookup),
///     Err(CellValidationError::UnteachableSubject { .. })
/// ));
/// ```
pub fn validate_cell<'a, F>(
    cell: &Cell,
    organisation_id: &OrganisationId,
    membership: F,
) -> Result<(), CellValidationError>
where
    F: Fn(TeacherId) -> Option<&'a TeacherMembership>,
{
    let mut memberships = Vec::with_capacity(cell.teachers().len());
    for teacher_id in cell.teachers() {
        let found = membership(*teacher_id).ok_or_else(|| CellValidationError::UnknownTeacher {
            teacher_id: *teacher_id,
            organisation_id: organisation_id.clone(),
        })?;
        memberships.push(found);
    }

    for subject in cell.subjects() {
        if !memberships.iter().any(|found| found.teaches(subject)) {
            return Err(CellValidationError::UnteachableSubject {
                subject: subject.clone(),
            });
        }
    }
    Ok(())
}

/// Check that every cell teacher is on the classroom's roster.
///
/// The primary teacher counts as rostered.
pub fn ensure_rostered(cell: &Cell, classroom: &Classroom) -> Result<(), CellValidationError> {
    let mut roster: BTreeSet<TeacherId> = classroom.assigned_teachers.clone();
    roster.extend(classroom.assigned_teacher);
    match cell.teachers().iter().find(|teacher| !roster.contains(teacher)) {
        Some(teacher_id) => Err(CellValidationError::TeacherNotInRoster {
            teacher_id: *teacher_id,
            classroom_id: classroom.classroom_id.to_string(),
        }),
        None => Ok(()),
    }
}
