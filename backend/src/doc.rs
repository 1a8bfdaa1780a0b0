//! OpenAPI document for the timetable REST API.
//!
//! Served by Swagger UI in debug builds and written to disk by the
//! `openapi-dump` binary.

use crate::inbound::http::classrooms::{CreateClassroomBody, UpdateClassroomBody};
use crate::inbound::http::dto::{
    CellDto, ClassroomResponse, GlobalPermissionsResponse, MembershipResponse,
    OrganisationResponse, OrganisationSummaryResponse, PermissionsResponse, ScheduleResponse,
    ScheduleSlotResponse, ShapeChangeResponse, StatsResponse, TeacherListResponse,
    TeacherResponse,
};
use crate::inbound::http::grid::SetCellBody;
use crate::inbound::http::login::{LoginRequest, LoginResponse};
use crate::inbound::http::memberships::{AddMembershipBody, UpdateMembershipBody};
use crate::inbound::http::organisations::{
    CreateOrganisationBody, UpdateOrganisationBody, UpdateShapeBody,
};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use crate::inbound::http::session::SESSION_COOKIE;
use crate::inbound::http::teachers::RegisterTeacherBody;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Registers the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default)
            .add_security_scheme(
                "SessionCookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    SESSION_COOKIE,
                    "Private session cookie issued by POST /api/v1/login.",
                ))),
            );
    }
}

/// OpenAPI document covering every `/api/v1` route and the health probes.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Timetable API",
        description = "Organisations, classroom timetable grids, teacher memberships \
                       and derived schedules.",
        license(
            name = "Apache-2.0",
            url = "https://www.apache.org/licenses/LICENSE-2.0.html"
        )
    ),
    servers((url = "/", description = "Relative to the deployment base URL")),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::login::login,
        crate::inbound::http::login::logout,
        crate::inbound::http::teachers::register_teacher,
        crate::inbound::http::teachers::get_teacher,
        crate::inbound::http::organisations::create_organisation,
        crate::inbound::http::organisations::list_organisations,
        crate::inbound::http::organisations::get_organisation,
        crate::inbound::http::organisations::update_organisation,
        crate::inbound::http::organisations::delete_organisation,
        crate::inbound::http::organisations::update_organisation_shape,
        crate::inbound::http::organisations::get_organisation_stats,
        crate::inbound::http::classrooms::create_classroom,
        crate::inbound::http::classrooms::get_classroom,
        crate::inbound::http::classrooms::update_classroom,
        crate::inbound::http::classrooms::remove_classroom,
        crate::inbound::http::grid::set_grid_cell,
        crate::inbound::http::memberships::list_teachers,
        crate::inbound::http::memberships::add_membership,
        crate::inbound::http::memberships::update_membership,
        crate::inbound::http::memberships::remove_membership,
        crate::inbound::http::memberships::get_teacher_schedule,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        LoginRequest,
        LoginResponse,
        RegisterTeacherBody,
        CreateOrganisationBody,
        UpdateOrganisationBody,
        UpdateShapeBody,
        CreateClassroomBody,
        UpdateClassroomBody,
        SetCellBody,
        AddMembershipBody,
        UpdateMembershipBody,
        CellDto,
        ClassroomResponse,
        OrganisationResponse,
        OrganisationSummaryResponse,
        ShapeChangeResponse,
        PermissionsResponse,
        GlobalPermissionsResponse,
        MembershipResponse,
        TeacherResponse,
        TeacherListResponse,
        ScheduleSlotResponse,
        ScheduleResponse,
        StatsResponse,
    )),
    tags(
        (name = "session", description = "Session login and logout"),
        (name = "teachers", description = "Teacher accounts"),
        (name = "organisations", description = "Organisations and their grid shape"),
        (name = "classrooms", description = "Classrooms and timetable cells"),
        (name = "memberships", description = "Teacher memberships and schedules"),
        (name = "health", description = "Orchestration probes")
    )
)]
pub struct ApiDoc;
