//! Teacher account handlers.
//!
//! ```text
//! POST /api/v1/teachers {"name":"Ada Lovelace","email":"ada@school.test"}
//! GET  /api/v1/teachers/{teacherId}
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::TeacherId;
use crate::domain::ports::RegisterTeacherRequest;
use crate::inbound::http::ApiResult;
use crate::inbound::http::dto::TeacherResponse;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, require};

/// Registration payload.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterTeacherBody {
    #[schema(example = "Ada Lovelace")]
    pub name: Option<String>,
    #[schema(example = "ada@school.test")]
    pub email: Option<String>,
}

/// Register a teacher account.
///
/// The next numeric id is allocated and returned. Emails are unique
/// regardless of case.
#[utoipa::path(
    post,
    path = "/api/v1/teachers",
    request_body = RegisterTeacherBody,
    responses(
        (status = 201, description = "Teacher registered", body = TeacherResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 409, description = "Email already registered", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["teachers"],
    operation_id = "registerTeacher",
    security([])
)]
#[post("/teachers")]
pub async fn register_teacher(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterTeacherBody>,
) -> ApiResult<HttpResponse> {
    let body = payload.into_inner();
    let request = RegisterTeacherRequest {
        name: require(body.name, FieldName::new("name"))?,
        email: require(body.email, FieldName::new("email"))?,
    };
    let teacher = state.teachers.register(request).await?;
    Ok(HttpResponse::Created().json(TeacherResponse::from(teacher)))
}

/// Fetch a teacher visible to the logged-in teacher.
#[utoipa::path(
    get,
    path = "/api/v1/teachers/{teacherId}",
    params(("teacherId" = u64, Path, description = "Teacher id")),
    responses(
        (status = 200, description = "Teacher", body = TeacherResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["teachers"],
    operation_id = "getTeacher"
)]
#[get("/teachers/{teacher_id}")]
pub async fn get_teacher(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<u64>,
) -> ApiResult<web::Json<TeacherResponse>> {
    let actor = session.require_teacher()?;
    let teacher = state
        .teachers_query
        .get_teacher(actor, TeacherId::new(path.into_inner()))
        .await?;
    Ok(web::Json(TeacherResponse::from(teacher)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Error, NewTeacher, Teacher};
    use crate::inbound::http::test_utils::{MockPorts, json_body, login_as, test_app};
    use actix_web::http::StatusCode;
    use actix_web::test;
    use rstest::rstest;
    use serde_json::json;

    fn ada(id: u64) -> Teacher {
        NewTeacher::try_new("Ada Lovelace", "ada@school.test")
            .expect("fixture")
            .into_teacher(TeacherId::new(id))
    }

    #[actix_web::test]
    async fn registration_returns_created_teacher() {
        let mut ports = MockPorts::default();
        ports
            .teachers
            .expect_register()
            .withf(|request| request.name == "Ada Lovelace" && request.email == "ada@school.test")
            .return_once(|_| Ok(ada(4)));
        let app = test::init_service(test_app(ports.into_state())).await;

        let response = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/teachers")
                .set_json(json!({ "name": "Ada Lovelace", "email": "ada@school.test" }))
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        assert_eq!(body["id"], 4);
        assert_eq!(body["isActive"], true);
        assert_eq!(body["memberships"], json!([]));
    }

    #[actix_web::test]
    async fn registration_requires_a_name() {
        let mut ports = MockPorts::default();
        ports.teachers.expect_register().times(0);
        let app = test::init_service(test_app(ports.into_state())).await;

        let response = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/teachers")
                .set_json(json!({ "email": "ada@school.test" }))
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["details"]["field"], "name");
    }

    #[actix_web::test]
    async fn reading_a_teacher_requires_a_session() {
        let mut ports = MockPorts::default();
        ports.teachers_query.expect_get_teacher().times(0);
        let app = test::init_service(test_app(ports.into_state())).await;

        let response = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/v1/teachers/4").to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[rstest]
    #[case(Ok(()), StatusCode::OK)]
    #[case(Err(Error::forbidden("teacher 4 is not visible")), StatusCode::FORBIDDEN)]
    #[actix_web::test]
    async fn reading_a_teacher_passes_the_session_actor(
        #[case] outcome: Result<(), Error>,
        #[case] status: StatusCode,
    ) {
        let mut ports = MockPorts::default();
        ports
            .teachers_query
            .expect_get_teacher()
            .withf(|actor, id| *actor == TeacherId::new(1) && *id == TeacherId::new(4))
            .return_once(move |_, _| outcome.map(|()| ada(4)));
        let app = test::init_service(test_app(ports.into_state())).await;
        let cookie = login_as(&app, 1).await;

        let response = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/teachers/4")
                .cookie(cookie)
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), status);
    }
}
