//! Session handlers.
//!
//! ```text
//! POST /api/v1/login {"teacherId":2,"email":"ada@school.test"}
//! POST /api/v1/logout
//! ```

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::ports::LoginCredentials;
use crate::domain::{Error, TeacherId, TeacherValidationError};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, require};

/// Login request body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[schema(example = 2)]
    pub teacher_id: Option<u64>,
    #[schema(example = "ada@school.test")]
    pub email: Option<String>,
}

/// The teacher bound to the new session.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub teacher_id: u64,
}

fn parse_login_request(payload: LoginRequest) -> Result<LoginCredentials, Error> {
    let teacher_id = require(payload.teacher_id, FieldName::new("teacherId"))?;
    let email = require(payload.email, FieldName::new("email"))?;
    LoginCredentials::try_from_parts(TeacherId::new(teacher_id), &email)
        .map_err(|error| map_credentials_error(&error))
}

fn map_credentials_error(error: &TeacherValidationError) -> Error {
    Error::invalid_request(error.to_string()).with_details(json!({
        "field": "email",
        "code": "invalid_email",
    }))
}

/// Authenticate a teacher and establish a session.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = LoginResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Invalid credentials", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["session"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<LoginResponse>> {
    let credentials = parse_login_request(payload.into_inner())?;
    let teacher_id = state.login.authenticate(&credentials).await?;
    session.persist_teacher(teacher_id)?;
    Ok(web::Json(LoginResponse {
        teacher_id: teacher_id.get(),
    }))
}

/// Drop the current session.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses((status = 204, description = "Session cleared")),
    tags = ["session"],
    operation_id = "logout",
    security([])
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.clear();
    HttpResponse::NoContent().finish()
}
