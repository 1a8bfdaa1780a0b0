//! Classroom handlers.
//!
//! ```text
//! POST   /api/v1/organisations/{organisationId}/classrooms
//! GET    /api/v1/organisations/{organisationId}/classrooms/{classroomId}
//! PUT    /api/v1/organisations/{organisationId}/classrooms/{classroomId}
//! DELETE /api/v1/organisations/{organisationId}/classrooms/{classroomId}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use crate::domain::grid::Cell;
use crate::domain::ports::{
    ClassroomChanges, ClassroomRef, CreateClassroomRequest, UpdateClassroomRequest,
};
use crate::domain::{ClassroomDraft, Error, TeacherId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::dto::{CellDto, ClassroomResponse};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_classroom_id, parse_organisation_id, require,
};

/// Payload for adding a classroom. Its grid starts empty.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateClassroomBody {
    #[schema(example = "7A")]
    pub classroom_id: Option<String>,
    #[schema(example = "Year 7A")]
    pub classroom_name: Option<String>,
    pub assigned_teacher: Option<u64>,
    pub assigned_teachers: Option<Vec<u64>>,
    pub assigned_subjects: Option<Vec<String>>,
    pub expected_revision: Option<u32>,
}

/// Partial classroom update.
///
/// `assignedTeacher: null` clears the primary teacher; omitting it keeps
/// the current one. `grid` replaces every cell and must hold exactly
/// `daysCount * periodCount` entries.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClassroomBody {
    pub classroom_name: Option<String>,
    #[serde(default, deserialize_with = "present_or_null")]
    #[schema(value_type = Option<u64>)]
    pub assigned_teacher: Option<Option<u64>>,
    pub assigned_teachers: Option<Vec<u64>>,
    pub assigned_subjects: Option<Vec<String>>,
    pub grid: Option<Vec<CellDto>>,
    pub expected_revision: Option<u32>,
}

/// Distinguish an explicit `null` from an absent field.
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn teacher_ids(raw: Vec<u64>) -> impl Iterator<Item = TeacherId> {
    raw.into_iter().map(TeacherId::new)
}

fn trimmed_subjects(raw: Vec<String>) -> impl Iterator<Item = String> {
    raw.into_iter()
        .map(|subject| subject.trim().to_owned())
        .filter(|subject| !subject.is_empty())
}

fn parse_create_body(body: CreateClassroomBody) -> Result<(ClassroomDraft, Option<u32>), Error> {
    let raw_id = require(body.classroom_id, FieldName::new("classroomId"))?;
    let name = require(body.classroom_name, FieldName::new("classroomName"))?;
    let mut draft = ClassroomDraft::named(parse_classroom_id(&raw_id)?, name);
    draft.assigned_teacher = body.assigned_teacher.map(TeacherId::new);
    draft.assigned_teachers = teacher_ids(body.assigned_teachers.unwrap_or_default()).collect();
    draft.assigned_subjects =
        trimmed_subjects(body.assigned_subjects.unwrap_or_default()).collect();
    Ok((draft, body.expected_revision))
}

impl From<UpdateClassroomBody> for ClassroomChanges {
    fn from(body: UpdateClassroomBody) -> Self {
        Self {
            classroom_name: body.classroom_name,
            assigned_teacher: body.assigned_teacher.map(|id| id.map(TeacherId::new)),
            assigned_teachers: body.assigned_teachers.map(|ids| teacher_ids(ids).collect()),
            assigned_subjects: body
                .assigned_subjects
                .map(|subjects| trimmed_subjects(subjects).collect()),
            grid: body
                .grid
                .map(|cells| cells.into_iter().map(Cell::from).collect()),
        }
    }
}

/// Path of a single classroom.
#[derive(Debug, Deserialize)]
pub struct ClassroomPath {
    organisation_id: String,
    classroom_id: String,
}

impl ClassroomPath {
    fn into_ref(self, actor: TeacherId) -> Result<ClassroomRef, Error> {
        Ok(ClassroomRef {
            actor,
            organisation_id: parse_organisation_id(&self.organisation_id)?,
            classroom_id: parse_classroom_id(&self.classroom_id)?,
        })
    }
}

/// Add a classroom with an empty grid sized to the organisation shape.
#[utoipa::path(
    post,
    path = "/api/v1/organisations/{organisationId}/classrooms",
    params(("organisationId" = String, Path, description = "Organisation id")),
    request_body = CreateClassroomBody,
    responses(
        (status = 201, description = "Classroom created", body = ClassroomResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Organisation not found", body = ErrorSchema),
        (status = 409, description = "Classroom id taken or revision conflict", body = ErrorSchema)
    ),
    tags = ["classrooms"],
    operation_id = "createClassroom"
)]
#[post("/organisations/{organisation_id}/classrooms")]
pub async fn create_classroom(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<CreateClassroomBody>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_teacher()?;
    let organisation_id = parse_organisation_id(&path)?;
    let (classroom, expected_revision) = parse_create_body(payload.into_inner())?;
    let created = state
        .timetable
        .create_classroom(CreateClassroomRequest {
            actor,
            organisation_id,
            classroom,
            expected_revision,
        })
        .await?;
    Ok(HttpResponse::Created().json(ClassroomResponse::from(created)))
}

/// Fetch a classroom and its grid.
#[utoipa::path(
    get,
    path = "/api/v1/organisations/{organisationId}/classrooms/{classroomId}",
    params(
        ("organisationId" = String, Path, description = "Organisation id"),
        ("classroomId" = String, Path, description = "Classroom id")
    ),
    responses(
        (status = 200, description = "Classroom", body = ClassroomResponse),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["classrooms"],
    operation_id = "getClassroom"
)]
#[get("/organisations/{organisation_id}/classrooms/{classroom_id}")]
pub async fn get_classroom(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<ClassroomPath>,
) -> ApiResult<web::Json<ClassroomResponse>> {
    let actor = session.require_teacher()?;
    let classroom = state
        .timetable_query
        .get_classroom(path.into_inner().into_ref(actor)?)
        .await?;
    Ok(web::Json(classroom.into()))
}

/// Update classroom details and optionally replace the whole grid.
#[utoipa::path(
    put,
    path = "/api/v1/organisations/{organisationId}/classrooms/{classroomId}",
    params(
        ("organisationId" = String, Path, description = "Organisation id"),
        ("classroomId" = String, Path, description = "Classroom id")
    ),
    request_body = UpdateClassroomBody,
    responses(
        (status = 200, description = "Updated classroom", body = ClassroomResponse),
        (status = 400, description = "Invalid grid or roster", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Revision conflict", body = ErrorSchema)
    ),
    tags = ["classrooms"],
    operation_id = "updateClassroom"
)]
#[put("/organisations/{organisation_id}/classrooms/{classroom_id}")]
pub async fn update_classroom(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<ClassroomPath>,
    payload: web::Json<UpdateClassroomBody>,
) -> ApiResult<web::Json<ClassroomResponse>> {
    let actor = session.require_teacher()?;
    let target = path.into_inner().into_ref(actor)?;
    let body = payload.into_inner();
    let expected_revision = body.expected_revision;
    let classroom = state
        .timetable
        .update_classroom(UpdateClassroomRequest {
            actor,
            organisation_id: target.organisation_id,
            classroom_id: target.classroom_id,
            changes: body.into(),
            expected_revision,
        })
        .await?;
    Ok(web::Json(classroom.into()))
}

/// Remove a classroom and its grid.
#[utoipa::path(
    delete,
    path = "/api/v1/organisations/{organisationId}/classrooms/{classroomId}",
    params(
        ("organisationId" = String, Path, description = "Organisation id"),
        ("classroomId" = String, Path, description = "Classroom id")
    ),
    responses(
        (status = 204, description = "Classroom removed"),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["classrooms"],
    operation_id = "removeClassroom"
)]
#[delete("/organisations/{organisation_id}/classrooms/{classroom_id}")]
pub async fn remove_classroom(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<ClassroomPath>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_teacher()?;
    state
        .timetable
        .remove_classroom(path.into_inner().into_ref(actor)?)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
