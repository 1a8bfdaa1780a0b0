//! Server harness and shared world for timetable HTTP scenarios.
//!
//! The harness owns a single-threaded Tokio runtime plus a `LocalSet` because
//! Actix uses `spawn_local` internally. Repositories are the in-memory
//! adapters, so every scenario starts from an empty school.

use std::cell::RefCell;
use std::collections::HashMap;
use std::net::TcpListener;
use std::rc::Rc;
use std::sync::Arc;

use actix_web::cookie::{Key, SameSite};
use actix_web::dev::ServerHandle;
use actix_web::http::{Method, header};
use actix_web::{App, HttpServer, web};
use awc::Client;
use mockable::DefaultClock;
use rstest::fixture;
use serde_json::Value;
use tokio::runtime::Runtime;
use tokio::task::LocalSet;

use timetable::Trace;
use timetable::domain::grid::GridShape;
use timetable::domain::{TRACE_ID_HEADER, TeacherService, TimetableService};
use timetable::inbound::http::configure_api;
use timetable::inbound::http::session::session_middleware;
use timetable::inbound::http::state::HttpState;
use timetable::outbound::access::MembershipAccessPolicy;
use timetable::outbound::memory::{InMemoryOrganisationRepository, InMemoryTeacherRepository};

pub(crate) struct TimetableWorld {
    pub(crate) runtime: Runtime,
    pub(crate) local: LocalSet,
    pub(crate) base_url: String,
    pub(crate) server: ServerHandle,
    /// Teacher store behind the server, for state no endpoint can set.
    pub(crate) teacher_store: Arc<InMemoryTeacherRepository>,
    /// Teacher ids by the name used in scenario text.
    pub(crate) teacher_ids: HashMap<String, u64>,
    /// Session cookie pairs by teacher name.
    pub(crate) cookies: HashMap<String, String>,
    /// Organisation created by the scenario and its administrator.
    pub(crate) organisation: Option<String>,
    pub(crate) administrator: Option<String>,
    pub(crate) last_status: Option<u16>,
    pub(crate) last_body: Option<Value>,
    pub(crate) last_trace_id: Option<String>,
}

impl TimetableWorld {
    pub(crate) fn teacher_id(&self, name: &str) -> u64 {
        *self
            .teacher_ids
            .get(name)
            .unwrap_or_else(|| panic!("teacher {name} should be registered"))
    }

    pub(crate) fn organisation(&self) -> &str {
        self.organisation
            .as_deref()
            .expect("an organisation should be created")
    }

    pub(crate) fn body(&self) -> &Value {
        self.last_body.as_ref().expect("response body")
    }
}

pub(crate) type SharedWorld = Rc<RefCell<TimetableWorld>>;

pub(crate) struct WorldFixture {
    world: SharedWorld,
}

impl WorldFixture {
    pub(crate) fn world(&self) -> SharedWorld {
        self.world.clone()
    }
}

impl Drop for WorldFixture {
    fn drop(&mut self) {
        shutdown(self.world.clone());
    }
}

fn shutdown(world: SharedWorld) {
    // The `LocalSet` must be driven on its owning thread; the future must
    // not borrow the world.
    let ctx = world.borrow();
    let server = ctx.server.clone();
    ctx.local.block_on(&ctx.runtime, async move {
        server.stop(true).await;
    });
}

pub(crate) fn with_world_async<R, F>(world: &SharedWorld, operation: impl FnOnce(String) -> F) -> R
where
    F: std::future::Future<Output = R>,
{
    // The world stays borrowed while the future runs, so the future must not
    // borrow it again.
    let ctx = world.borrow();
    let base_url = ctx.base_url.clone();
    ctx.local.block_on(&ctx.runtime, operation(base_url))
}

/// One JSON call against the running server.
pub(crate) struct ApiCall<'a> {
    pub(crate) method: Method,
    pub(crate) path: &'a str,
    pub(crate) payload: Option<Value>,
    /// Teacher whose session cookie is sent, if any.
    pub(crate) as_teacher: Option<&'a str>,
}

/// Perform a request and record status, trace id and JSON body.
///
/// Empty bodies (204 responses) are recorded as `Value::Null`.
pub(crate) fn perform(world: &SharedWorld, call: ApiCall<'_>) {
    let ApiCall {
        method,
        path,
        payload,
        as_teacher,
    } = call;
    let cookie = as_teacher.map(|name| {
        world
            .borrow()
            .cookies
            .get(name)
            .cloned()
            .unwrap_or_else(|| panic!("{name} should be logged in"))
    });
    let path = path.to_owned();
    let (status, trace_id, body) = with_world_async(world, |base_url| async move {
        let mut request = Client::default().request(method, format!("{base_url}{path}"));
        if let Some(cookie) = cookie {
            request = request.insert_header((header::COOKIE, cookie));
        }
        let mut response = match payload {
            Some(payload) => request.send_json(&payload).await.expect("api request"),
            None => request.send().await.expect("api request"),
        };
        let status = response.status().as_u16();
        let trace_id = response
            .headers()
            .get(TRACE_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let bytes = response.body().await.expect("response body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, trace_id, body)
    });

    let mut ctx = world.borrow_mut();
    ctx.last_status = Some(status);
    ctx.last_trace_id = trace_id;
    ctx.last_body = Some(body);
}

/// Log a registered teacher in and keep the session cookie pair.
pub(crate) fn login(world: &SharedWorld, name: &str) {
    let (teacher_id, email) = {
        let ctx = world.borrow();
        (ctx.teacher_id(name), email_for(name))
    };
    let (status, cookie) = with_world_async(world, |base_url| async move {
        let response = Client::default()
            .post(format!("{base_url}/api/v1/login"))
            .send_json(&serde_json::json!({ "teacherId": teacher_id, "email": email }))
            .await
            .expect("login request");
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .map(str::to_owned);
        (response.status().as_u16(), cookie)
    });
    assert_eq!(status, 200, "login should succeed for {name}");

    let cookie = cookie.expect("session cookie");
    world.borrow_mut().cookies.insert(name.to_owned(), cookie);
}

pub(crate) fn email_for(name: &str) -> String {
    format!("{}@school.test", name.to_lowercase())
}

fn in_memory_state() -> (HttpState, Arc<InMemoryTeacherRepository>) {
    let organisations = Arc::new(InMemoryOrganisationRepository::new());
    let teachers = Arc::new(InMemoryTeacherRepository::new());
    let access = Arc::new(MembershipAccessPolicy::new(
        Arc::clone(&organisations),
        Arc::clone(&teachers),
    ));
    let timetable = Arc::new(
        TimetableService::new(
            organisations,
            Arc::clone(&teachers),
            Arc::clone(&access),
            Arc::new(DefaultClock),
        )
        .with_default_shape(GridShape::default()),
    );
    let directory = Arc::new(TeacherService::new(Arc::clone(&teachers), access));
    let state = HttpState {
        login: directory.clone(),
        teachers: directory.clone(),
        teachers_query: directory,
        timetable: timetable.clone(),
        timetable_query: timetable.clone(),
        memberships: timetable,
    };
    (state, teachers)
}

async fn spawn_timetable_server(state: HttpState) -> Result<(String, ServerHandle), String> {
    let key = Key::generate();
    let listener = TcpListener::bind("127.0.0.1:0").map_err(|err| err.to_string())?;
    let addr = listener.local_addr().map_err(|err| err.to_string())?;
    let data = web::Data::new(state);

    let server = HttpServer::new(move || {
        let api = web::scope("/api/v1")
            .wrap(session_middleware(key.clone(), false, SameSite::Lax))
            .configure(configure_api);
        App::new().app_data(data.clone()).wrap(Trace).service(api)
    })
    .disable_signals()
    .workers(1)
    .listen(listener)
    .map_err(|err| err.to_string())?
    .run();

    let handle = server.handle();
    actix_web::rt::spawn(server);

    Ok((format!("http://{addr}"), handle))
}

#[fixture]
pub(crate) fn world() -> WorldFixture {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime");
    let local = LocalSet::new();

    let (state, teacher_store) = in_memory_state();
    let (base_url, server) = local
        .block_on(&runtime, spawn_timetable_server(state))
        .expect("server should start");

    let world = Rc::new(RefCell::new(TimetableWorld {
        runtime,
        local,
        base_url,
        server,
        teacher_store,
        teacher_ids: HashMap::new(),
        cookies: HashMap::new(),
        organisation: None,
        administrator: None,
        last_status: None,
        last_body: None,
        last_trace_id: None,
    }));

    WorldFixture { world }
}
