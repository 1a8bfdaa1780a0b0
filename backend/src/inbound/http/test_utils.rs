//! Test helpers for inbound HTTP components.

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key, SameSite};
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpResponse, test, web};
use serde_json::Value;
use std::sync::Arc;

use crate::domain::ports::{
    MockLoginService, MockMembershipCommand, MockTeacherCommand, MockTeacherQuery,
    MockTimetableCommand, MockTimetableQuery,
};
use crate::domain::{Error, TeacherId};
use crate::inbound::http::session::{SESSION_COOKIE, SessionContext, session_middleware};
use crate::inbound::http::state::HttpState;

/// Session middleware with a fresh key and no `Secure` flag.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    session_middleware(Key::generate(), false, SameSite::Lax)
}

/// The `session` cookie set by a response.
///
/// # Panics
/// Panics when the response carries no session cookie.
pub fn session_cookie<B>(response: &ServiceResponse<B>) -> Cookie<'static> {
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(Cookie::into_owned)
        .expect("session cookie set")
}

/// Mocked driving ports, converted into [`HttpState`] once expectations are set.
#[derive(Default)]
pub struct MockPorts {
    pub login: MockLoginService,
    pub teachers: MockTeacherCommand,
    pub teachers_query: MockTeacherQuery,
    pub timetable: MockTimetableCommand,
    pub timetable_query: MockTimetableQuery,
    pub memberships: MockMembershipCommand,
}

impl MockPorts {
    pub fn into_state(self) -> HttpState {
        HttpState {
            login: Arc::new(self.login),
            teachers: Arc::new(self.teachers),
            teachers_query: Arc::new(self.teachers_query),
            timetable: Arc::new(self.timetable),
            timetable_query: Arc::new(self.timetable_query),
            memberships: Arc::new(self.memberships),
        }
    }
}

const TEST_LOGIN_PATH: &str = "/test-login/{teacher_id}";

async fn test_login(
    session: SessionContext,
    path: web::Path<u64>,
) -> Result<HttpResponse, Error> {
    session.persist_teacher(TeacherId::new(path.into_inner()))?;
    Ok(HttpResponse::NoContent().finish())
}

/// An app serving the API under `/api/v1` plus a shortcut login route.
pub fn test_app(
    state: HttpState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .wrap(test_session_middleware())
        .route(TEST_LOGIN_PATH, web::post().to(test_login))
        .service(web::scope("/api/v1").configure(super::configure_api))
}

/// Establish a session for `teacher` and return its cookie.
pub async fn login_as<S, B>(app: &S, teacher: u64) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let request = test::TestRequest::post()
        .uri(&format!("/test-login/{teacher}"))
        .to_request();
    let response = test::call_service(app, request).await;
    session_cookie(&response)
}

/// Read a JSON body.
pub async fn json_body<B: MessageBody>(response: ServiceResponse<B>) -> Value {
    let body = test::read_body(response).await;
    serde_json::from_slice(&body).expect("JSON body")
}
