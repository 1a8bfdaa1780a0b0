//! Organisation membership handlers.
//!
//! ```text
//! GET    /api/v1/organisations/{organisationId}/teachers?subject=Math&class=7A&activeOnly=true
//! POST   /api/v1/organisations/{organisationId}/teachers
//! PATCH  /api/v1/organisations/{organisationId}/teachers/{teacherId}
//! DELETE /api/v1/organisations/{organisationId}/teachers/{teacherId}
//! GET    /api/v1/organisations/{organisationId}/teachers/{teacherId}/schedule
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, web};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{AddMembershipRequest, ListTeachersRequest, UpdateMembershipRequest};
use crate::domain::{Error, MembershipPermissions, OrganisationId, TeacherId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::dto::{ScheduleResponse, TeacherListResponse, TeacherResponse};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_organisation_id, parse_permissions, require,
};

/// Filters for the teacher list.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListTeachersQuery {
    /// Keep teachers whose membership lists this subject.
    pub subject: Option<String>,
    /// Keep teachers whose membership lists this class.
    pub class: Option<String>,
    /// Keep teachers whose account and membership are both active.
    #[serde(default)]
    pub active_only: bool,
}

/// Payload enrolling a teacher.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddMembershipBody {
    #[schema(example = 2)]
    pub teacher_id: Option<u64>,
    #[schema(example = json!(["Math", "Physics"]))]
    pub subjects: Option<Vec<String>>,
    #[schema(example = json!(["7A"]))]
    pub classes: Option<Vec<String>>,
    /// Flags named `view`, `edit`, `delete`, `manageTeachers` and
    /// `manageClassrooms`. Absent flags default to view-only.
    #[schema(value_type = Option<Object>, example = json!({ "edit": true }))]
    pub permissions: Option<Map<String, Value>>,
}

/// Partial membership update.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMembershipBody {
    pub subjects: Option<Vec<String>>,
    pub classes: Option<Vec<String>>,
    #[schema(value_type = Option<Object>)]
    pub permissions: Option<Map<String, Value>>,
    pub is_active: Option<bool>,
}

/// Path of one membership.
#[derive(Debug, Deserialize)]
pub struct MembershipPath {
    organisation_id: String,
    teacher_id: u64,
}

impl MembershipPath {
    fn parse(self) -> Result<(OrganisationId, TeacherId), Error> {
        Ok((
            parse_organisation_id(&self.organisation_id)?,
            TeacherId::new(self.teacher_id),
        ))
    }
}

fn optional_permissions(
    flags: Option<&Map<String, Value>>,
) -> Result<Option<MembershipPermissions>, Error> {
    flags.map(parse_permissions).transpose()
}

/// List teachers holding a membership in the organisation.
#[utoipa::path(
    get,
    path = "/api/v1/organisations/{organisationId}/teachers",
    params(("organisationId" = String, Path, description = "Organisation id"), ListTeachersQuery),
    responses(
        (status = 200, description = "Matching teachers", body = TeacherListResponse),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["memberships"],
    operation_id = "listOrganisationTeachers"
)]
#[get("/organisations/{organisation_id}/teachers")]
pub async fn list_teachers(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    query: web::Query<ListTeachersQuery>,
) -> ApiResult<web::Json<TeacherListResponse>> {
    let actor = session.require_teacher()?;
    let ListTeachersQuery {
        subject,
        class,
        active_only,
    } = query.into_inner();
    let teachers = state
        .timetable_query
        .list_organisation_teachers(ListTeachersRequest {
            actor,
            organisation_id: parse_organisation_id(&path)?,
            subject: subject.filter(|value| !value.trim().is_empty()),
            class: class.filter(|value| !value.trim().is_empty()),
            active_only,
        })
        .await?;
    Ok(web::Json(teachers.into()))
}

/// Enrol a teacher and add them to the organisation roster.
#[utoipa::path(
    post,
    path = "/api/v1/organisations/{organisationId}/teachers",
    params(("organisationId" = String, Path, description = "Organisation id")),
    request_body = AddMembershipBody,
    responses(
        (status = 201, description = "Membership added", body = TeacherResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Organisation or teacher not found", body = ErrorSchema),
        (status = 409, description = "Already a member", body = ErrorSchema)
    ),
    tags = ["memberships"],
    operation_id = "addMembership"
)]
#[post("/organisations/{organisation_id}/teachers")]
pub async fn add_membership(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<AddMembershipBody>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_teacher()?;
    let body = payload.into_inner();
    let request = AddMembershipRequest {
        actor,
        organisation_id: parse_organisation_id(&path)?,
        teacher_id: TeacherId::new(require(body.teacher_id, FieldName::new("teacherId"))?),
        subjects: require(body.subjects, FieldName::new("subjects"))?,
        classes: require(body.classes, FieldName::new("classes"))?,
        permissions: optional_permissions(body.permissions.as_ref())?.unwrap_or_default(),
    };
    let teacher = state.memberships.add_membership(request).await?;
    Ok(HttpResponse::Created().json(TeacherResponse::from(teacher)))
}

/// Change a membership's subjects, classes, permissions or active flag.
#[utoipa::path(
    patch,
    path = "/api/v1/organisations/{organisationId}/teachers/{teacherId}",
    params(
        ("organisationId" = String, Path, description = "Organisation id"),
        ("teacherId" = u64, Path, description = "Teacher id")
    ),
    request_body = UpdateMembershipBody,
    responses(
        (status = 200, description = "Updated teacher", body = TeacherResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not a member", body = ErrorSchema)
    ),
    tags = ["memberships"],
    operation_id = "updateMembership"
)]
#[patch("/organisations/{organisation_id}/teachers/{teacher_id}")]
pub async fn update_membership(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<MembershipPath>,
    payload: web::Json<UpdateMembershipBody>,
) -> ApiResult<web::Json<TeacherResponse>> {
    let actor = session.require_teacher()?;
    let (organisation_id, teacher_id) = path.into_inner().parse()?;
    let body = payload.into_inner();
    let request = UpdateMembershipRequest {
        actor,
        organisation_id,
        teacher_id,
        permissions: optional_permissions(body.permissions.as_ref())?,
        subjects: body.subjects,
        classes: body.classes,
        is_active: body.is_active,
    };
    let teacher = state.memberships.update_membership(request).await?;
    Ok(web::Json(teacher.into()))
}

/// Remove a membership.
///
/// Rejected with `409` while the teacher is still placed in any cell.
#[utoipa::path(
    delete,
    path = "/api/v1/organisations/{organisationId}/teachers/{teacherId}",
    params(
        ("organisationId" = String, Path, description = "Organisation id"),
        ("teacherId" = u64, Path, description = "Teacher id")
    ),
    responses(
        (status = 204, description = "Membership removed"),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not a member", body = ErrorSchema),
        (status = 409, description = "Teacher still scheduled", body = ErrorSchema)
    ),
    tags = ["memberships"],
    operation_id = "removeMembership"
)]
#[delete("/organisations/{organisation_id}/teachers/{teacher_id}")]
pub async fn remove_membership(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<MembershipPath>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_teacher()?;
    let (organisation_id, teacher_id) = path.into_inner().parse()?;
    state
        .memberships
        .remove_membership(actor, &organisation_id, teacher_id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// A teacher's personal schedule, derived from every classroom grid.
///
/// Slots are in flat row-major order (`day * periodCount + period`). A
/// teacher placed in two classrooms at the same slot gets the union of the
/// subjects, tagged with the classroom scanned last.
#[utoipa::path(
    get,
    path = "/api/v1/organisations/{organisationId}/teachers/{teacherId}/schedule",
    params(
        ("organisationId" = String, Path, description = "Organisation id"),
        ("teacherId" = u64, Path, description = "Teacher id")
    ),
    responses(
        (status = 200, description = "Schedule", body = ScheduleResponse),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (
            status = 404,
            description = "Organisation missing or teacher not a member",
            body = ErrorSchema
        )
    ),
    tags = ["memberships"],
    operation_id = "getTeacherSchedule"
)]
#[get("/organisations/{organisation_id}/teachers/{teacher_id}/schedule")]
pub async fn get_teacher_schedule(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<MembershipPath>,
) -> ApiResult<web::Json<ScheduleResponse>> {
    let actor = session.require_teacher()?;
    let (organisation_id, teacher_id) = path.into_inner().parse()?;
    let schedule = state
        .timetable_query
        .get_teacher_schedule(actor, &organisation_id, teacher_id)
        .await?;
    Ok(web::Json(schedule.into()))
}
