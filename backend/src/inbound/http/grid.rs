//! Single-cell grid writes.
//!
//! ```text
//! PUT /api/v1/organisations/{organisationId}/classrooms/{classroomId}/grid/{day}/{period}
//!     {"teachers":[2],"subjects":["Math"]}
//! ```

use actix_web::{put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::grid::{Cell, GridAddress};
use crate::domain::ports::SetGridCellRequest;
use crate::inbound::http::ApiResult;
use crate::inbound::http::dto::{CellDto, ClassroomResponse};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{parse_classroom_id, parse_organisation_id};

/// Replacement cell. Omitted lists mean "nobody" and "nothing".
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetCellBody {
    #[serde(flatten)]
    pub cell: CellDto,
    pub expected_revision: Option<u32>,
}

/// Path of one grid cell.
#[derive(Debug, Deserialize)]
pub struct CellPath {
    organisation_id: String,
    classroom_id: String,
    day: usize,
    period: usize,
}

/// Replace one grid cell wholesale.
///
/// The address is checked against the organisation shape. Every teacher
/// must be an active member on the classroom roster and every subject must
/// be taught by at least one of them; a rejected write leaves the cell as
/// it was.
#[utoipa::path(
    put,
    path = "/api/v1/organisations/{organisationId}/classrooms/{classroomId}/grid/{day}/{period}",
    params(
        ("organisationId" = String, Path, description = "Organisation id"),
        ("classroomId" = String, Path, description = "Classroom id"),
        ("day" = usize, Path, description = "Zero-based day"),
        ("period" = usize, Path, description = "Zero-based period")
    ),
    request_body = SetCellBody,
    responses(
        (status = 200, description = "Updated classroom", body = ClassroomResponse),
        (status = 400, description = "Out of range address or invalid cell", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Revision conflict", body = ErrorSchema)
    ),
    tags = ["classrooms"],
    operation_id = "setGridCell"
)]
#[put("/organisations/{organisation_id}/classrooms/{classroom_id}/grid/{day}/{period}")]
pub async fn set_grid_cell(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<CellPath>,
    payload: web::Json<SetCellBody>,
) -> ApiResult<web::Json<ClassroomResponse>> {
    let actor = session.require_teacher()?;
    let target = path.into_inner();
    let body = payload.into_inner();
    let classroom = state
        .timetable
        .set_grid_cell(SetGridCellRequest {
            actor,
            organisation_id: parse_organisation_id(&target.organisation_id)?,
            classroom_id: parse_classroom_id(&target.classroom_id)?,
            address: GridAddress::new(target.day, target.period),
            cell: Cell::from(body.cell),
            expected_revision: body.expected_revision,
        })
        .await?;
    Ok(web::Json(classroom.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::{GridShape, TimetableGrid};
    use crate::domain::{Classroom, ClassroomId, Error, TeacherId};
    use crate::inbound::http::test_utils::{MockPorts, json_body, login_as, test_app};
    use actix_web::http::StatusCode;
    use actix_web::test;
    use rstest::rstest;
    use serde_json::json;
    use std::collections::BTreeSet;

    fn classroom_with_cell(index: usize, cell: Cell) -> Classroom {
        let shape = GridShape::new(5, 6).expect("shape");
        let mut cells = TimetableGrid::initialize(shape).cells().to_vec();
        if let Some(slot) = cells.get_mut(index) {
            *slot = cell;
        }
        Classroom {
            classroom_id: ClassroomId::new("7A").expect("id"),
            classroom_name: "Year 7A".to_owned(),
            assigned_teacher: None,
            assigned_teachers: BTreeSet::from([TeacherId::new(2)]),
            assigned_subjects: BTreeSet::new(),
            grid: TimetableGrid::from_cells(cells),
        }
    }

    #[actix_web::test]
    async fn writes_the_addressed_cell() {
        let mut ports = MockPorts::default();
        ports
            .timetable
            .expect_set_grid_cell()
            .withf(|request| {
                request.address == GridAddress::new(1, 2)
                    && request.cell == Cell::new([TeacherId::new(2)], ["Math"])
                    && request.classroom_id.as_str() == "7A"
            })
            .return_once(|request| Ok(classroom_with_cell(8, request.cell)));
        let app = test::init_service(test_app(ports.into_state())).await;
        let cookie = login_as(&app, 1).await;

        let response = test::call_service(
            &app,
            test::TestRequest::put()
                .uri("/api/v1/organisations/school/classrooms/7A/grid/1/2")
                .cookie(cookie)
                .set_json(json!({ "teachers": [2], "subjects": ["Math"] }))
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(
            body["grid"][8],
            json!({ "teachers": [2], "subjects": ["Math"] })
        );
    }

    #[rstest]
    #[case("unteachable_subject", "subjects")]
    #[case("unknown_teacher", "teachers")]
    #[case("out_of_range", "day")]
    #[actix_web::test]
    async fn domain_rejections_are_bad_requests(#[case] code: &str, #[case] field: &str) {
        let details = json!({ "code": code, "field": field });
        let mut ports = MockPorts::default();
        ports
            .timetable
            .expect_set_grid_cell()
            .return_once(move |_| Err(Error::invalid_request("rejected").with_details(details)));
        let app = test::init_service(test_app(ports.into_state())).await;
        let cookie = login_as(&app, 1).await;

        let response = test::call_service(
            &app,
            test::TestRequest::put()
                .uri("/api/v1/organisations/school/classrooms/7A/grid/9/0")
                .cookie(cookie)
                .set_json(json!({ "teachers": [2], "subjects": ["Physics"] }))
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["details"]["code"], code);
        assert_eq!(body["details"]["field"], field);
    }

    #[actix_web::test]
    async fn negative_coordinates_fail_path_extraction() {
        let mut ports = MockPorts::default();
        ports.timetable.expect_set_grid_cell().times(0);
        let app = test::init_service(test_app(ports.into_state())).await;
        let cookie = login_as(&app, 1).await;

        let response = test::call_service(
            &app,
            test::TestRequest::put()
                .uri("/api/v1/organisations/school/classrooms/7A/grid/-1/0")
                .cookie(cookie)
                .set_json(json!({}))
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["details"]["field"], "path");
    }
}
