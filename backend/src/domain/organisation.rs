//! Organisation aggregate: shape, teacher roster and classrooms.
//!
//! The organisation is the unit of persistence. Its classrooms and their
//! grids are embedded, so every mutation is one read-modify-write of this
//! aggregate. The methods here keep the grid-length invariant: every
//! classroom grid holds exactly `shape.slot_count()` cells.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::grid::{Cell, GridAddress, GridError, GridShape, TimetableGrid};
use super::TeacherId;

/// Validation failures for identifiers and names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    /// The value is blank once trimmed.
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
}

macro_rules! trimmed_identifier {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Trim and validate a raw identifier.
            pub fn new(raw: impl AsRef<str>) -> Result<Self, IdentifierError> {
                let trimmed = raw.as_ref().trim();
                if trimmed.is_empty() {
                    return Err(IdentifierError::Empty { field: $field });
                }
                Ok(Self(trimmed.to_owned()))
            }

            /// Borrow the identifier text.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdentifierError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

trimmed_identifier!(
    /// Unique organisation key.
    OrganisationId,
    "organisationId"
);
trimmed_identifier!(
    /// Classroom key, unique within its organisation.
    ClassroomId,
    "classroomId"
);

/// Default number of days for a new organisation.
pub const DEFAULT_DAYS_COUNT: usize = 5;
/// Default number of periods per day for a new organisation.
pub const DEFAULT_PERIOD_COUNT: usize = 8;

/// A named grid holder inside an organisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classroom {
    pub classroom_id: ClassroomId,
    pub classroom_name: String,
    pub assigned_teacher: Option<TeacherId>,
    pub assigned_teachers: BTreeSet<TeacherId>,
    pub assigned_subjects: BTreeSet<String>,
    pub grid: TimetableGrid,
}

impl Classroom {
    /// Every teacher the classroom references: primary, roster and cells.
    #[must_use]
    pub fn referenced_teachers(&self) -> BTreeSet<TeacherId> {
        let mut teachers = self.assigned_teachers.clone();
        teachers.extend(self.assigned_teacher);
        for cell in self.grid.cells() {
            teachers.extend(cell.teachers().iter().copied());
        }
        teachers
    }

    /// Whether `teacher` occupies any cell of this classroom.
    #[must_use]
    pub fn schedules(&self, teacher: TeacherId) -> bool {
        self.grid.slots_for(teacher).next().is_some()
    }
}

/// Caller-supplied data for a new classroom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassroomDraft {
    pub classroom_id: ClassroomId,
    pub classroom_name: String,
    pub assigned_teacher: Option<TeacherId>,
    pub assigned_teachers: BTreeSet<TeacherId>,
    pub assigned_subjects: BTreeSet<String>,
}

impl ClassroomDraft {
    /// Draft with a name and no teachers or subjects.
    #[must_use]
    pub fn named(classroom_id: ClassroomId, classroom_name: impl Into<String>) -> Self {
        Self {
            classroom_id,
            classroom_name: classroom_name.into(),
            assigned_teacher: None,
            assigned_teachers: BTreeSet::new(),
            assigned_subjects: BTreeSet::new(),
        }
    }

    /// Teachers the draft refers to, primary included.
    #[must_use]
    pub fn roster(&self) -> BTreeSet<TeacherId> {
        let mut roster = self.assigned_teachers.clone();
        roster.extend(self.assigned_teacher);
        roster
    }
}

/// Errors raised by organisation aggregate operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrganisationError {
    /// No classroom with this id exists in the organisation.
    #[error("classroom {0} not found")]
    ClassroomNotFound(ClassroomId),
    /// A classroom with this id already exists.
    #[error("classroom {0} already exists")]
    DuplicateClassroom(ClassroomId),
    /// Grid addressing or shape failure.
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Outcome of applying a new shape to every classroom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeChange {
    pub previous: GridShape,
    pub current: GridShape,
    /// Non-empty cells discarded across all classrooms.
    pub dropped_cells: usize,
}

/// The organisation aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organisation {
    pub organisation_id: OrganisationId,
    pub name: String,
    pub admin_ref: TeacherId,
    shape: GridShape,
    pub teachers: BTreeSet<TeacherId>,
    classrooms: Vec<Classroom>,
    /// Optimistic-concurrency revision, starting at 1.
    pub revision: u32,
}

impl Organisation {
    /// A new organisation with no classrooms.
    ///
    /// The admin is placed on the teacher roster.
    #[must_use]
    pub fn new(
        organisation_id: OrganisationId,
        name: impl Into<String>,
        admin_ref: TeacherId,
        shape: GridShape,
    ) -> Self {
        Self {
            organisation_id,
            name: name.into(),
            admin_ref,
            shape,
            teachers: BTreeSet::from([admin_ref]),
            classrooms: Vec::new(),
            revision: 1,
        }
    }

    /// Current shape shared by every classroom.
    #[must_use]
    pub fn shape(&self) -> GridShape {
        self.shape
    }

    /// Classrooms in creation order.
    #[must_use]
    pub fn classrooms(&self) -> &[Classroom] {
        &self.classrooms
    }

    /// Look up a classroom.
    #[must_use]
    pub fn classroom(&self, classroom_id: &ClassroomId) -> Option<&Classroom> {
        self.classrooms
            .iter()
            .find(|classroom| &classroom.classroom_id == classroom_id)
    }

    fn classroom_mut(
        &mut self,
        classroom_id: &ClassroomId,
    ) -> Result<&mut Classroom, OrganisationError> {
        self.classrooms
            .iter_mut()
            .find(|classroom| &classroom.classroom_id == classroom_id)
            .ok_or_else(|| OrganisationError::ClassroomNotFound(classroom_id.clone()))
    }

    /// Add a classroom with a freshly initialised grid.
    ///
    /// Roster teachers are merged into the organisation roster.
    pub fn add_classroom(
        &mut self,
        draft: ClassroomDraft,
    ) -> Result<&Classroom, OrganisationError> {
        if self.classroom(&draft.classroom_id).is_some() {
            return Err(OrganisationError::DuplicateClassroom(draft.classroom_id));
        }
        self.teachers.extend(draft.roster());
        let ClassroomDraft {
            classroom_id,
            classroom_name,
            assigned_teacher,
            assigned_teachers,
            assigned_subjects,
        } = draft;
        self.classrooms.push(Classroom {
            classroom_id: classroom_id.clone(),
            classroom_name,
            assigned_teacher,
            assigned_teachers,
            assigned_subjects,
            grid: TimetableGrid::initialize(self.shape),
        });
        self.classroom(&classroom_id)
            .ok_or(OrganisationError::ClassroomNotFound(classroom_id))
    }

    /// Remove and return a classroom.
    pub fn remove_classroom(
        &mut self,
        classroom_id: &ClassroomId,
    ) -> Result<Classroom, OrganisationError> {
        let position = self
            .classrooms
            .iter()
            .position(|classroom| &classroom.classroom_id == classroom_id)
            .ok_or_else(|| OrganisationError::ClassroomNotFound(classroom_id.clone()))?;
        Ok(self.classrooms.remove(position))
    }

    /// Apply a new shape, reshaping every classroom grid.
    ///
    /// This is the only sanctioned way to change the shape.
    pub fn reshape(&mut self, shape: GridShape) -> ShapeChange {
        let previous = self.shape;
        let mut dropped_cells = 0;
        for classroom in &mut self.classrooms {
            let reshaped = classroom.grid.reshape(previous, shape);
            dropped_cells += reshaped.dropped;
            classroom.grid = reshaped.grid;
        }
        self.shape = shape;
        if dropped_cells > 0 {
            info!(
                organisation_id = %self.organisation_id,
                dropped_cells,
                "shape change discarded assignments outside the new grid"
            );
        }
        ShapeChange {
            previous,
            current: shape,
            dropped_cells,
        }
    }

    /// Replace one cell of a classroom grid, returning the previous cell.
    ///
    /// The address is validated against the organisation shape. A classroom
    /// grid whose length has drifted is healed first (see
    /// [`Organisation::heal_classroom_grid`]).
    pub fn set_cell(
        &mut self,
        classroom_id: &ClassroomId,
        address: GridAddress,
        cell: Cell,
    ) -> Result<Cell, OrganisationError> {
        let shape = self.shape;
        address.validate(shape)?;
        self.heal_classroom_grid(classroom_id)?;
        let classroom = self.classroom_mut(classroom_id)?;
        Ok(classroom.grid.set(address, shape, cell)?)
    }

    /// Replace a classroom's whole grid after checking its length.
    pub fn replace_grid(
        &mut self,
        classroom_id: &ClassroomId,
        grid: TimetableGrid,
    ) -> Result<(), OrganisationError> {
        grid.ensure_shape(self.shape)?;
        self.classroom_mut(classroom_id)?.grid = grid;
        Ok(())
    }

    /// Mutable access for roster and naming updates; grid changes go through
    /// [`Organisation::set_cell`] or [`Organisation::replace_grid`].
    pub fn update_classroom_details<F>(
        &mut self,
        classroom_id: &ClassroomId,
        update: F,
    ) -> Result<(), OrganisationError>
    where
        F: FnOnce(&mut ClassroomDetails<'_>),
    {
        let classroom = self.classroom_mut(classroom_id)?;
        let mut details = ClassroomDetails {
            classroom_name: &mut classroom.classroom_name,
            assigned_teacher: &mut classroom.assigned_teacher,
            assigned_teachers: &mut classroom.assigned_teachers,
            assigned_subjects: &mut classroom.assigned_subjects,
        };
        update(&mut details);
        let roster = classroom
            .assigned_teachers
            .iter()
            .copied()
            .chain(classroom.assigned_teacher)
            .collect::<Vec<_>>();
        self.teachers.extend(roster);
        Ok(())
    }

    /// Self-heal a classroom grid whose length no longer matches the shape.
    ///
    /// Drift can only arise from data written outside the sanctioned reshape
    /// path. The grid is reinitialised to empty cells at the expected size,
    /// discarding every existing assignment, and the event is logged.
    /// Returns `true` when healing happened.
    pub fn heal_classroom_grid(
        &mut self,
        classroom_id: &ClassroomId,
    ) -> Result<bool, OrganisationError> {
        let shape = self.shape;
        let organisation_id = self.organisation_id.clone();
        let classroom = self.classroom_mut(classroom_id)?;
        if classroom.grid.matches(shape) {
            return Ok(false);
        }
        warn!(
            organisation_id = %organisation_id,
            classroom_id = %classroom.classroom_id,
            expected = shape.slot_count(),
            actual = classroom.grid.len(),
            discarded = classroom.grid.filled_count(),
            "classroom grid length drifted from organisation shape; reinitialising"
        );
        classroom.grid = TimetableGrid::initialize(shape);
        Ok(true)
    }

    /// Drop `teacher` from the organisation roster and every classroom roster.
    ///
    /// The admin always stays on the organisation roster. Callers must first
    /// make sure the teacher is not placed in any cell.
    pub fn forget_teacher(&mut self, teacher: TeacherId) {
        if teacher != self.admin_ref {
            self.teachers.remove(&teacher);
        }
        for classroom in &mut self.classrooms {
            classroom.assigned_teachers.remove(&teacher);
            if classroom.assigned_teacher == Some(teacher) {
                classroom.assigned_teacher = None;
            }
        }
    }

    /// Classrooms that place `teacher` in at least one cell.
    pub fn classrooms_scheduling(&self, teacher: TeacherId) -> impl Iterator<Item = &Classroom> {
        self.classrooms
            .iter()
            .filter(move |classroom| classroom.schedules(teacher))
    }

    /// Whether every classroom grid matches the shape.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.classrooms
            .iter()
            .all(|classroom| classroom.grid.matches(self.shape))
    }
}

/// Mutable view over a classroom's non-grid fields.
pub struct ClassroomDetails<'a> {
    pub classroom_name: &'a mut String,
    pub assigned_teacher: &'a mut Option<TeacherId>,
    pub assigned_teachers: &'a mut BTreeSet<TeacherId>,
    pub assigned_subjects: &'a mut BTreeSet<String>,
}
