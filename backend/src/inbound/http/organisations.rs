//! Organisation handlers.
//!
//! ```text
//! POST   /api/v1/organisations
//! GET    /api/v1/organisations
//! GET    /api/v1/organisations/{organisationId}
//! PATCH  /api/v1/organisations/{organisationId}
//! DELETE /api/v1/organisations/{organisationId}
//! PUT    /api/v1/organisations/{organisationId}/shape
//! GET    /api/v1/organisations/{organisationId}/stats
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{
    CreateOrganisationRequest, UpdateOrganisationRequest, UpdateShapeRequest,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::dto::{
    OrganisationResponse, OrganisationSummaryResponse, ShapeChangeResponse, StatsResponse,
};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_organisation_id, require};

/// Payload for creating an organisation.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrganisationBody {
    #[schema(example = "greenfield-high")]
    pub organisation_id: Option<String>,
    #[schema(example = "Greenfield High")]
    pub name: Option<String>,
    /// Defaults to 5.
    #[schema(example = 5)]
    pub days_count: Option<usize>,
    /// Defaults to 8.
    #[schema(example = 8)]
    pub period_count: Option<usize>,
}

/// Partial organisation update. A shape change reshapes every classroom.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrganisationBody {
    pub name: Option<String>,
    pub days_count: Option<usize>,
    pub period_count: Option<usize>,
    pub expected_revision: Option<u32>,
}

/// New organisation shape.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShapeBody {
    #[schema(example = 5)]
    pub days_count: Option<usize>,
    #[schema(example = 6)]
    pub period_count: Option<usize>,
    pub expected_revision: Option<u32>,
}

/// Create an organisation owned by the logged-in teacher.
#[utoipa::path(
    post,
    path = "/api/v1/organisations",
    request_body = CreateOrganisationBody,
    responses(
        (status = 201, description = "Organisation created", body = OrganisationResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 409, description = "Organisation id taken", body = ErrorSchema)
    ),
    tags = ["organisations"],
    operation_id = "createOrganisation"
)]
#[post("/organisations")]
pub async fn create_organisation(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateOrganisationBody>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_teacher()?;
    let body = payload.into_inner();
    let raw_id = require(body.organisation_id, FieldName::new("organisationId"))?;
    let request = CreateOrganisationRequest {
        actor,
        organisation_id: parse_organisation_id(&raw_id)?,
        name: require(body.name, FieldName::new("name"))?,
        days_count: body.days_count,
        period_count: body.period_count,
    };
    let organisation = state.timetable.create_organisation(request).await?;
    Ok(HttpResponse::Created().json(OrganisationResponse::from(organisation)))
}

/// Summaries of the organisations the logged-in teacher administers or may view.
#[utoipa::path(
    get,
    path = "/api/v1/organisations",
    responses(
        (status = 200, description = "Visible organisations", body = [OrganisationSummaryResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["organisations"],
    operation_id = "listOrganisations"
)]
#[get("/organisations")]
pub async fn list_organisations(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<OrganisationSummaryResponse>>> {
    let actor = session.require_teacher()?;
    let organisations = state.timetable_query.list_organisations(actor).await?;
    Ok(web::Json(
        organisations
            .iter()
            .map(OrganisationSummaryResponse::from)
            .collect(),
    ))
}

/// Fetch an organisation with every classroom grid.
#[utoipa::path(
    get,
    path = "/api/v1/organisations/{organisationId}",
    params(("organisationId" = String, Path, description = "Organisation id")),
    responses(
        (status = 200, description = "Organisation", body = OrganisationResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["organisations"],
    operation_id = "getOrganisation"
)]
#[get("/organisations/{organisation_id}")]
pub async fn get_organisation(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<OrganisationResponse>> {
    let actor = session.require_teacher()?;
    let organisation_id = parse_organisation_id(&path)?;
    let organisation = state
        .timetable_query
        .get_organisation(actor, &organisation_id)
        .await?;
    Ok(web::Json(organisation.into()))
}

/// Rename and/or reshape an organisation.
#[utoipa::path(
    patch,
    path = "/api/v1/organisations/{organisationId}",
    params(("organisationId" = String, Path, description = "Organisation id")),
    request_body = UpdateOrganisationBody,
    responses(
        (status = 200, description = "Updated organisation", body = OrganisationResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Revision conflict", body = ErrorSchema)
    ),
    tags = ["organisations"],
    operation_id = "updateOrganisation"
)]
#[patch("/organisations/{organisation_id}")]
pub async fn update_organisation(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<UpdateOrganisationBody>,
) -> ApiResult<web::Json<OrganisationResponse>> {
    let actor = session.require_teacher()?;
    let body = payload.into_inner();
    let request = UpdateOrganisationRequest {
        actor,
        organisation_id: parse_organisation_id(&path)?,
        name: body.name,
        days_count: body.days_count,
        period_count: body.period_count,
        expected_revision: body.expected_revision,
    };
    let organisation = state.timetable.update_organisation(request).await?;
    Ok(web::Json(organisation.into()))
}

/// Delete an organisation, its classrooms and its memberships.
#[utoipa::path(
    delete,
    path = "/api/v1/organisations/{organisationId}",
    params(("organisationId" = String, Path, description = "Organisation id")),
    responses(
        (status = 204, description = "Organisation deleted"),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["organisations"],
    operation_id = "deleteOrganisation"
)]
#[delete("/organisations/{organisation_id}")]
pub async fn delete_organisation(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_teacher()?;
    let organisation_id = parse_organisation_id(&path)?;
    state
        .timetable
        .delete_organisation(actor, &organisation_id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Change the shape shared by every classroom grid.
///
/// Cells whose (day, period) still fits are carried over; new slots start
/// empty and slots outside the new shape are dropped.
#[utoipa::path(
    put,
    path = "/api/v1/organisations/{organisationId}/shape",
    params(("organisationId" = String, Path, description = "Organisation id")),
    request_body = UpdateShapeBody,
    responses(
        (status = 200, description = "Reshaped organisation", body = ShapeChangeResponse),
        (status = 400, description = "Invalid shape", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Revision conflict", body = ErrorSchema)
    ),
    tags = ["organisations"],
    operation_id = "updateOrganisationShape"
)]
#[put("/organisations/{organisation_id}/shape")]
pub async fn update_organisation_shape(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<UpdateShapeBody>,
) -> ApiResult<web::Json<ShapeChangeResponse>> {
    let actor = session.require_teacher()?;
    let body = payload.into_inner();
    let request = UpdateShapeRequest {
        actor,
        organisation_id: parse_organisation_id(&path)?,
        days_count: require(body.days_count, FieldName::new("daysCount"))?,
        period_count: require(body.period_count, FieldName::new("periodCount"))?,
        expected_revision: body.expected_revision,
    };
    let response = state.timetable.update_organisation_shape(request).await?;
    Ok(web::Json(response.into()))
}

/// Headline counts for an organisation.
#[utoipa::path(
    get,
    path = "/api/v1/organisations/{organisationId}/stats",
    params(("organisationId" = String, Path, description = "Organisation id")),
    responses(
        (status = 200, description = "Organisation stats", body = StatsResponse),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["organisations"],
    operation_id = "getOrganisationStats"
)]
#[get("/organisations/{organisation_id}/stats")]
pub async fn get_organisation_stats(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<StatsResponse>> {
    let actor = session.require_teacher()?;
    let organisation_id = parse_organisation_id(&path)?;
    let stats = state
        .timetable_query
        .get_organisation_stats(actor, &organisation_id)
        .await?;
    Ok(web::Json(stats.into()))
}
