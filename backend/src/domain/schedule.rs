//! On-demand derivation of a teacher's personal schedule.
//!
//! The schedule is never stored. It is rebuilt from classroom grids on every
//! call, so it always reflects the grids as they were read.

use std::collections::BTreeSet;

use serde::Serialize;

use super::grid::GridShape;
use super::{ClassroomId, Organisation, OrganisationId, Teacher, TeacherId};

/// Failures raised while computing a schedule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    /// The teacher has no membership in the organisation.
    #[error("teacher {teacher_id} is not a member of {organisation_id}")]
    NotAMember {
        teacher_id: TeacherId,
        organisation_id: OrganisationId,
    },
}

/// One occupied slot in a teacher's schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSlot {
    /// Classroom the slot was last taken from.
    pub classroom_id: ClassroomId,
    /// Union of subjects across every matching cell at this index.
    pub subjects: BTreeSet<String>,
}

/// A teacher's schedule for one organisation, in flat row-major order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherSchedule {
    pub teacher_id: TeacherId,
    pub organisation_id: OrganisationId,
    pub shape: GridShape,
    pub slots: Vec<Option<ScheduleSlot>>,
}

impl TeacherSchedule {
    /// Number of occupied slots.
    #[must_use]
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

/// Scan every classroom in `organisation` and merge the cells that place
/// `teacher` into a flat schedule.
///
/// When the teacher appears at the same index in several classrooms, the
/// subjects are unioned and the slot keeps the classroom processed last.
/// Such double bookings are reported as-is, not rejected.
pub fn compute_schedule(
    teacher: &Teacher,
    organisation: &Organisation,
) -> Result<TeacherSchedule, ScheduleError> {
    if teacher.membership(&organisation.organisation_id).is_none() {
        return Err(ScheduleError::NotAMember {
            teacher_id: teacher.id,
            organisation_id: organisation.organisation_id.clone(),
        });
    }

    let shape = organisation.shape();
    let mut slots: Vec<Option<ScheduleSlot>> = vec![None; shape.slot_count()];
    for classroom in organisation.classrooms() {
        for (index, cell) in classroom.grid.slots_for(teacher.id) {
            let Some(slot) = slots.get_mut(index) else {
                continue;
            };
            let entry = slot.get_or_insert_with(|| ScheduleSlot {
                classroom_id: classroom.classroom_id.clone(),
                subjects: BTreeSet::new(),
            });
            entry.classroom_id = classroom.classroom_id.clone();
            entry.subjects.extend(cell.subjects().iter().cloned());
        }
    }

    Ok(TeacherSchedule {
        teacher_id: teacher.id,
        organisation_id: organisation.organisation_id.clone(),
        shape,
        slots,
    })
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use chrono::{DateTime, Utc};
    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::grid::{Cell, GridAddress};
    use crate::domain::{ClassroomDraft, MembershipPermissions, NewTeacher, TeacherMembership};

    const TEACHER: TeacherId = TeacherId::new(7);

    fn org_id() -> OrganisationId {
        OrganisationId::new("school").expect("fixture id")
    }

    fn classroom_id(raw: &str) -> ClassroomId {
        ClassroomId::new(raw).expect("fixture classroom id")
    }

    #[fixture]
    fn teacher() -> Teacher {
        let mut teacher = NewTeacher::try_new("T", "t@example.org")
            .expect("fixture teacher")
            .into_teacher(TEACHER);
        teacher
            .add_membership(
                TeacherMembership::new(
                    org_id(),
                    ["Math", "Science", "English"],
                    ["7A"],
                    MembershipPermissions::default(),
                    DateTime::<Utc>::UNIX_EPOCH,
                )
                .expect("fixture membership"),
            )
            .expect("first membership");
        teacher
    }

    #[fixture]
    fn organisation() -> Organisation {
        let mut org = Organisation::new(
            org_id(),
            "School",
            TeacherId::new(1),
            GridShape::new(5, 6).expect("shape"),
        );
        for id in ["A", "B"] {
            let mut draft = ClassroomDraft::named(classroom_id(id), id);
            draft.assigned_teachers.insert(TEACHER);
            org.add_classroom(draft).expect("classroom");
        }
        org
    }

    fn place(org: &mut Organisation, classroom: &str, index: usize, subject: &str) {
        let address = GridAddress::from_index(index, org.shape());
        org.set_cell(&classroom_id(classroom), address, Cell::new([TEACHER], [subject]))
            .expect("placement");
    }

    #[rstest]
    fn collects_every_occupied_slot(teacher: Teacher, mut organisation: Organisation) {
        place(&mut organisation, "A", 2, "Math");
        place(&mut organisation, "A", 5, "Science");

        let schedule = compute_schedule(&teacher, &organisation).expect("member");

        assert_eq!(schedule.slots.len(), 30);
        assert_eq!(schedule.occupied(), 2);
        for (index, subject) in [(2, "Math"), (5, "Science")] {
            let slot = schedule
                .slots
                .get(index)
                .and_then(Option::as_ref)
                .expect("occupied slot");
            assert_eq!(slot.classroom_id, classroom_id("A"));
            assert_eq!(slot.subjects, BTreeSet::from([subject.to_owned()]));
        }
    }

    #[rstest]
    fn unions_subjects_across_classrooms(teacher: Teacher, mut organisation: Organisation) {
        place(&mut organisation, "A", 3, "Math");
        place(&mut organisation, "B", 3, "English");

        let schedule = compute_schedule(&teacher, &organisation).expect("member");
        let slot = schedule
            .slots
            .get(3)
            .and_then(Option::as_ref)
            .expect("occupied slot");

        assert_eq!(
            slot.subjects,
            BTreeSet::from(["English".to_owned(), "Math".to_owned()])
        );
        assert_eq!(slot.classroom_id, classroom_id("B"));
        assert_eq!(schedule.occupied(), 1);
    }

    #[rstest]
    fn non_member_is_rejected(organisation: Organisation) {
        let stranger = NewTeacher::try_new("S", "s@example.org")
            .expect("fixture teacher")
            .into_teacher(TeacherId::new(99));
        let err = compute_schedule(&stranger, &organisation).expect_err("not a member");
        assert!(matches!(err, ScheduleError::NotAMember { .. }));
    }

    #[rstest]
    fn empty_grids_yield_all_null_slots(teacher: Teacher, organisation: Organisation) {
        let schedule = compute_schedule(&teacher, &organisation).expect("member");
        assert!(schedule.slots.iter().all(Option::is_none));
    }
}
