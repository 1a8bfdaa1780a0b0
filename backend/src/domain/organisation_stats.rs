//! Summary counts for an organisation dashboard.

use std::collections::BTreeSet;

use serde::Serialize;

use super::{Organisation, Teacher};

/// Headline numbers for one organisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganisationStats {
    /// Teachers holding a membership, active or not.
    pub teacher_count: usize,
    /// Teachers whose membership and account are both active.
    pub active_teacher_count: usize,
    /// Distinct subject names across memberships.
    pub subject_count: usize,
    /// Distinct class names across memberships.
    pub class_count: usize,
    pub classroom_count: usize,
    /// Slots per classroom grid.
    pub slot_count: usize,
    /// Non-empty cells across every classroom.
    pub filled_slot_count: usize,
}

impl OrganisationStats {
    /// Derive the counts from the aggregate and its members.
    ///
    /// Teachers without a membership in `organisation` are ignored.
    #[must_use]
    pub fn compute(organisation: &Organisation, teachers: &[Teacher]) -> Self {
        let organisation_id = &organisation.organisation_id;
        let mut subjects = BTreeSet::new();
        let mut classes = BTreeSet::new();
        let mut teacher_count = 0;
        let mut active_teacher_count = 0;

        for teacher in teachers {
            let Some(membership) = teacher.membership(organisation_id) else {
                continue;
            };
            teacher_count += 1;
            if teacher.active_membership(organisation_id).is_some() {
                active_teacher_count += 1;
            }
            subjects.extend(membership.subjects().iter().map(String::as_str));
            classes.extend(membership.classes().iter().map(String::as_str));
        }

        Self {
            teacher_count,
            active_teacher_count,
            subject_count: subjects.len(),
            class_count: classes.len(),
            classroom_count: organisation.classrooms().len(),
            slot_count: organisation.shape().slot_count(),
            filled_slot_count: organisation
                .classrooms()
                .iter()
                .map(|classroom| classroom.grid.filled_count())
                .sum(),
        }
    }
}
