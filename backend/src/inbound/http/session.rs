//! Session helpers keeping handlers free of Actix session details.
//!
//! The session cookie stores only the authenticated teacher id.

use actix_session::config::{CookieContentSecurity, PersistentSession};
use actix_session::storage::CookieSessionStore;
use actix_session::{Session, SessionMiddleware};
use actix_web::cookie::{Key, SameSite, time::Duration};
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::domain::{Error, TeacherId};

pub(crate) const TEACHER_ID_KEY: &str = "teacher_id";

/// Name of the encrypted session cookie.
pub const SESSION_COOKIE: &str = "session";

/// Encrypted, HTTP-only cookie session lasting two hours.
pub fn session_middleware(
    key: Key,
    cookie_secure: bool,
    same_site: SameSite,
) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name(SESSION_COOKIE.to_owned())
        .cookie_path("/".to_owned())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(same_site)
        .session_lifecycle(PersistentSession::default().session_ttl(Duration::hours(2)))
        .build()
}

/// Newtype exposing teacher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Record the authenticated teacher, rotating the session key.
    pub fn persist_teacher(&self, teacher_id: TeacherId) -> Result<(), Error> {
        self.0.renew();
        self.0
            .insert(TEACHER_ID_KEY, teacher_id.get())
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// The teacher id in the session, if any.
    ///
    /// A value that does not decode is treated as absent.
    pub fn teacher_id(&self) -> Result<Option<TeacherId>, Error> {
        match self.0.get::<u64>(TEACHER_ID_KEY) {
            Ok(id) => Ok(id.map(TeacherId::new)),
            Err(error) => {
                warn!(%error, "undecodable teacher id in session cookie");
                Ok(None)
            }
        }
    }

    /// Require an authenticated teacher or fail with `401 Unauthorized`.
    pub fn require_teacher(&self) -> Result<TeacherId, Error> {
        self.teacher_id()?
            .ok_or_else(|| Error::unauthorized("login required"))
    }

    /// Drop the session cookie.
    pub fn clear(&self) {
        self.0.purge();
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
