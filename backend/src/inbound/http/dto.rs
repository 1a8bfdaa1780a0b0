//! Response payloads shared by the timetable handlers.
//!
//! Domain types are mapped into these camelCase shapes so the OpenAPI
//! document describes exactly what goes over the wire.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::grid::Cell;
use crate::domain::ports::ShapeUpdateResponse;
use crate::domain::{
    Classroom, GlobalPermissions, MembershipPermissions, Organisation, OrganisationStats,
    ScheduleSlot, Teacher, TeacherId, TeacherMembership, TeacherSchedule,
};

/// One grid slot: the teachers and subjects assigned to it.
///
/// Used both in responses and as the body of a cell write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CellDto {
    #[serde(default)]
    #[schema(example = json!([2]))]
    pub teachers: Vec<u64>,
    #[serde(default)]
    #[schema(example = json!(["Math"]))]
    pub subjects: Vec<String>,
}

impl From<&Cell> for CellDto {
    fn from(cell: &Cell) -> Self {
        Self {
            teachers: cell.teachers().iter().map(|id| id.get()).collect(),
            subjects: cell.subjects().iter().cloned().collect(),
        }
    }
}

impl From<CellDto> for Cell {
    fn from(dto: CellDto) -> Self {
        Self::new(dto.teachers.into_iter().map(TeacherId::new), dto.subjects)
    }
}

/// A classroom and its flat, row-major grid.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassroomResponse {
    pub classroom_id: String,
    pub classroom_name: String,
    pub assigned_teacher: Option<u64>,
    pub assigned_teachers: Vec<u64>,
    pub assigned_subjects: Vec<String>,
    /// `daysCount * periodCount` cells; index = day * periodCount + period.
    pub grid: Vec<CellDto>,
}

impl From<&Classroom> for ClassroomResponse {
    fn from(classroom: &Classroom) -> Self {
        Self {
            classroom_id: classroom.classroom_id.to_string(),
            classroom_name: classroom.classroom_name.clone(),
            assigned_teacher: classroom.assigned_teacher.map(TeacherId::get),
            assigned_teachers: classroom.assigned_teachers.iter().map(|id| id.get()).collect(),
            assigned_subjects: classroom.assigned_subjects.iter().cloned().collect(),
            grid: classroom.grid.cells().iter().map(CellDto::from).collect(),
        }
    }
}

impl From<Classroom> for ClassroomResponse {
    fn from(classroom: Classroom) -> Self {
        Self::from(&classroom)
    }
}

/// An organisation with its shape, roster and classrooms.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrganisationResponse {
    pub organisation_id: String,
    pub name: String,
    pub admin_ref: u64,
    pub days_count: usize,
    pub period_count: usize,
    pub teachers: Vec<u64>,
    pub classrooms: Vec<ClassroomResponse>,
    /// Pass back as `expectedRevision` to guard a later write.
    pub revision: u32,
}

impl From<Organisation> for OrganisationResponse {
    fn from(organisation: Organisation) -> Self {
        let shape = organisation.shape();
        Self {
            organisation_id: organisation.organisation_id.to_string(),
            name: organisation.name.clone(),
            admin_ref: organisation.admin_ref.get(),
            days_count: shape.days_count(),
            period_count: shape.period_count(),
            teachers: organisation.teachers.iter().map(|id| id.get()).collect(),
            classrooms: organisation
                .classrooms()
                .iter()
                .map(ClassroomResponse::from)
                .collect(),
            revision: organisation.revision,
        }
    }
}

/// One row of the organisation listing.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrganisationSummaryResponse {
    pub organisation_id: String,
    pub name: String,
    pub admin_ref: u64,
    pub days_count: usize,
    pub period_count: usize,
    pub teacher_count: usize,
    pub classroom_count: usize,
    pub revision: u32,
}

impl From<&Organisation> for OrganisationSummaryResponse {
    fn from(organisation: &Organisation) -> Self {
        let shape = organisation.shape();
        Self {
            organisation_id: organisation.organisation_id.to_string(),
            name: organisation.name.clone(),
            admin_ref: organisation.admin_ref.get(),
            days_count: shape.days_count(),
            period_count: shape.period_count(),
            teacher_count: organisation.teachers.len(),
            classroom_count: organisation.classrooms().len(),
            revision: organisation.revision,
        }
    }
}

/// Outcome of a shape change.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShapeChangeResponse {
    pub organisation: OrganisationResponse,
    /// Assigned cells that fell outside the new shape and were discarded.
    pub dropped_cells: usize,
}

impl From<ShapeUpdateResponse> for ShapeChangeResponse {
    fn from(value: ShapeUpdateResponse) -> Self {
        Self {
            organisation: value.organisation.into(),
            dropped_cells: value.dropped_cells,
        }
    }
}

/// Per-organisation permission flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionsResponse {
    pub view: bool,
    pub edit: bool,
    pub delete: bool,
    pub manage_teachers: bool,
    pub manage_classrooms: bool,
}

impl From<MembershipPermissions> for PermissionsResponse {
    fn from(value: MembershipPermissions) -> Self {
        Self {
            view: value.view,
            edit: value.edit,
            delete: value.delete,
            manage_teachers: value.manage_teachers,
            manage_classrooms: value.manage_classrooms,
        }
    }
}

/// Organisation-independent flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct GlobalPermissionsResponse {
    pub view: bool,
    pub edit: bool,
}

impl From<GlobalPermissions> for GlobalPermissionsResponse {
    fn from(value: GlobalPermissions) -> Self {
        Self {
            view: value.view,
            edit: value.edit,
        }
    }
}

/// A teacher's record inside one organisation.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MembershipResponse {
    pub organisation_id: String,
    pub subjects: Vec<String>,
    pub classes: Vec<String>,
    pub permissions: PermissionsResponse,
    pub is_active: bool,
    /// RFC 3339 timestamp.
    pub joined_at: String,
}

impl From<&TeacherMembership> for MembershipResponse {
    fn from(membership: &TeacherMembership) -> Self {
        Self {
            organisation_id: membership.organisation_id().to_string(),
            subjects: membership.subjects().iter().cloned().collect(),
            classes: membership.classes().iter().cloned().collect(),
            permissions: membership.permissions().into(),
            is_active: membership.is_active(),
            joined_at: membership.joined_at().to_rfc3339(),
        }
    }
}

/// A teacher and all of their memberships.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeacherResponse {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub is_active: bool,
    pub global_permissions: GlobalPermissionsResponse,
    pub memberships: Vec<MembershipResponse>,
    pub revision: u32,
}

impl From<Teacher> for TeacherResponse {
    fn from(teacher: Teacher) -> Self {
        Self {
            id: teacher.id.get(),
            memberships: teacher
                .memberships()
                .iter()
                .map(MembershipResponse::from)
                .collect(),
            name: teacher.name,
            email: teacher.email,
            is_active: teacher.is_active,
            global_permissions: teacher.global_permissions.into(),
            revision: teacher.revision,
        }
    }
}

/// Filtered teacher listing with its size.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeacherListResponse {
    pub teachers: Vec<TeacherResponse>,
    /// Number of teachers matching the filters.
    pub total: usize,
}

impl From<Vec<Teacher>> for TeacherListResponse {
    fn from(teachers: Vec<Teacher>) -> Self {
        let teachers: Vec<TeacherResponse> =
            teachers.into_iter().map(TeacherResponse::from).collect();
        Self {
            total: teachers.len(),
            teachers,
        }
    }
}

/// One occupied slot of a teacher's schedule.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSlotResponse {
    pub classroom_id: String,
    pub subjects: Vec<String>,
}

impl From<ScheduleSlot> for ScheduleSlotResponse {
    fn from(slot: ScheduleSlot) -> Self {
        Self {
            classroom_id: slot.classroom_id.to_string(),
            subjects: slot.subjects.into_iter().collect(),
        }
    }
}

/// A teacher's schedule, derived from the classroom grids at read time.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub teacher_id: u64,
    pub organisation_id: String,
    pub days_count: usize,
    pub period_count: usize,
    /// One entry per flat index; `null` where the teacher is free.
    pub schedule: Vec<Option<ScheduleSlotResponse>>,
}

impl From<TeacherSchedule> for ScheduleResponse {
    fn from(value: TeacherSchedule) -> Self {
        Self {
            teacher_id: value.teacher_id.get(),
            organisation_id: value.organisation_id.to_string(),
            days_count: value.shape.days_count(),
            period_count: value.shape.period_count(),
            schedule: value
                .slots
                .into_iter()
                .map(|slot| slot.map(ScheduleSlotResponse::from))
                .collect(),
        }
    }
}

/// Headline counts for an organisation.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub teacher_count: usize,
    pub active_teacher_count: usize,
    pub subject_count: usize,
    pub class_count: usize,
    pub classroom_count: usize,
    pub slot_count: usize,
    pub filled_slot_count: usize,
}

impl From<OrganisationStats> for StatsResponse {
    fn from(value: OrganisationStats) -> Self {
        Self {
            teacher_count: value.teacher_count,
            active_teacher_count: value.active_teacher_count,
            subject_count: value.subject_count,
            class_count: value.class_count,
            classroom_count: value.classroom_count,
            slot_count: value.slot_count,
            filled_slot_count: value.filled_slot_count,
        }
    }
}
