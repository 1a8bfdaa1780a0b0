//! Driving port for organisation, classroom and grid mutations.
//!
//! Inbound adapters call this port for every write against an organisation
//! aggregate. Implementations check the actor's permission first, then run a
//! read-modify-write cycle guarded by the aggregate revision.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::domain::grid::{Cell, GridAddress};
use crate::domain::{
    Classroom, ClassroomDraft, ClassroomId, Error, Organisation, OrganisationId, TeacherId,
};

/// Request to create an organisation owned by `actor`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOrganisationRequest {
    pub actor: TeacherId,
    pub organisation_id: OrganisationId,
    pub name: String,
    /// Defaults to the configured day count when absent.
    pub days_count: Option<usize>,
    /// Defaults to the configured period count when absent.
    pub period_count: Option<usize>,
}

/// Partial update of organisation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOrganisationRequest {
    pub actor: TeacherId,
    pub organisation_id: OrganisationId,
    pub name: Option<String>,
    pub days_count: Option<usize>,
    pub period_count: Option<usize>,
    /// Fail with a conflict unless the stored revision equals this value.
    pub expected_revision: Option<u32>,
}

/// Request to change the shape shared by every classroom grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateShapeRequest {
    pub actor: TeacherId,
    pub organisation_id: OrganisationId,
    pub days_count: usize,
    pub period_count: usize,
    pub expected_revision: Option<u32>,
}

/// Result of a shape change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeUpdateResponse {
    pub organisation: Organisation,
    /// Non-empty cells that fell outside the new shape.
    pub dropped_cells: usize,
}

/// Request to add a classroom to an organisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateClassroomRequest {
    pub actor: TeacherId,
    pub organisation_id: OrganisationId,
    pub classroom: ClassroomDraft,
    pub expected_revision: Option<u32>,
}

/// Partial update of a classroom.
///
/// `grid` replaces every cell at once. Its length must match the
/// organisation shape and every cell is validated before anything changes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClassroomChanges {
    pub classroom_name: Option<String>,
    /// `Some(None)` clears the primary teacher.
    pub assigned_teacher: Option<Option<TeacherId>>,
    pub assigned_teachers: Option<BTreeSet<TeacherId>>,
    pub assigned_subjects: Option<BTreeSet<String>>,
    pub grid: Option<Vec<Cell>>,
}

/// Request to update one classroom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateClassroomRequest {
    pub actor: TeacherId,
    pub organisation_id: OrganisationId,
    pub classroom_id: ClassroomId,
    pub changes: ClassroomChanges,
    pub expected_revision: Option<u32>,
}

/// Request to replace a single grid cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetGridCellRequest {
    pub actor: TeacherId,
    pub organisation_id: OrganisationId,
    pub classroom_id: ClassroomId,
    pub address: GridAddress,
    pub cell: Cell,
    pub expected_revision: Option<u32>,
}

/// Identifies a classroom on behalf of an actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassroomRef {
    pub actor: TeacherId,
    pub organisation_id: OrganisationId,
    pub classroom_id: ClassroomId,
}

/// Domain use-case port for timetable writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TimetableCommand: Send + Sync {
    /// Create an organisation with no classrooms; the actor becomes admin.
    async fn create_organisation(
        &self,
        request: CreateOrganisationRequest,
    ) -> Result<Organisation, Error>;

    /// Rename and/or reshape an organisation.
    async fn update_organisation(
        &self,
        request: UpdateOrganisationRequest,
    ) -> Result<Organisation, Error>;

    /// Reshape every classroom grid to a new shape.
    async fn update_organisation_shape(
        &self,
        request: UpdateShapeRequest,
    ) -> Result<ShapeUpdateResponse, Error>;

    /// Delete an organisation, its classrooms and its memberships.
    async fn delete_organisation(
        &self,
        actor: TeacherId,
        organisation_id: &OrganisationId,
    ) -> Result<(), Error>;

    /// Add a classroom with an empty grid.
    async fn create_classroom(&self, request: CreateClassroomRequest) -> Result<Classroom, Error>;

    /// Update classroom details and optionally replace its grid.
    async fn update_classroom(&self, request: UpdateClassroomRequest) -> Result<Classroom, Error>;

    /// Remove a classroom and its grid.
    async fn remove_classroom(&self, request: ClassroomRef) -> Result<(), Error>;

    /// Replace one cell and return the updated classroom.
    async fn set_grid_cell(&self, request: SetGridCellRequest) -> Result<Classroom, Error>;
}
