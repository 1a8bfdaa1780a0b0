//! Timetable cell: the teachers and subjects assigned to one slot.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::TeacherId;

/// One slot's assignment.
///
/// Cells are replaced wholesale; there is no partial update. Subject names are
/// trimmed on construction and blank names are discarded.
///
/// # Examples
/// ```
/// use timetable::domain::TeacherId;
/// use timetable::domain::grid::Cell;
///
/// let cell = Cell::new([TeacherId::new(7)], [" Math ", "Math"]);
/// assert_eq!(cell.subjects().len(), 1);
/// assert!(cell.subjects().contains("Math"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    #[serde(default)]
    teachers: BTreeSet<TeacherId>,
    #[serde(default)]
    subjects: BTreeSet<String>,
}

impl Cell {
    /// An unassigned slot.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a cell from teacher ids and subject names.
    pub fn new<T, S>(teachers: T, subjects: S) -> Self
    where
        T: IntoIterator<Item = TeacherId>,
        S: IntoIterator,
        S::Item: AsRef<str>,
    {
        Self {
            teachers: teachers.into_iter().collect(),
            subjects: subjects
                .into_iter()
                .map(|subject| subject.as_ref().trim().to_owned())
                .filter(|subject| !subject.is_empty())
                .collect(),
        }
    }

    /// Teachers placed in this slot.
    #[must_use]
    pub fn teachers(&self) -> &BTreeSet<TeacherId> {
        &self.teachers
    }

    /// Subjects taught in this slot.
    #[must_use]
    pub fn subjects(&self) -> &BTreeSet<String> {
        &self.subjects
    }

    /// Whether `teacher` is placed in this slot.
    #[must_use]
    pub fn has_teacher(&self, teacher: TeacherId) -> bool {
        self.teachers.contains(&teacher)
    }

    /// True when neither teachers nor subjects are assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.teachers.is_empty() && self.subjects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn new_trims_and_deduplicates_subjects() {
        let cell = Cell::new([TeacherId::new(1)], ["  Math", "Math  ", "", "   "]);
        assert_eq!(
            cell.subjects().iter().collect::<Vec<_>>(),
            vec![&"Math".to_owned()]
        );
    }

    #[rstest]
    fn empty_cell_has_no_assignments() {
        let cell = Cell::empty();
        assert!(cell.is_empty());
        assert!(!cell.has_teacher(TeacherId::new(1)));
    }

    #[rstest]
    fn deserialises_missing_sets_as_empty() {
        let cell: Cell = serde_json::from_str("{}").expect("empty object is a cell");
        assert!(cell.is_empty());
    }
}
