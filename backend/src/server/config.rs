//! HTTP server configuration.

use actix_web::cookie::{Key, SameSite};
use std::net::SocketAddr;
use timetable::domain::DEFAULT_MAX_WRITE_ATTEMPTS;
use timetable::domain::grid::GridShape;
use timetable::outbound::persistence::DbPool;

/// Everything `create_server` needs besides the health flags.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) default_shape: GridShape,
    pub(crate) max_write_attempts: u32,
}

impl ServerConfig {
    /// In-memory storage, the default shape and the default retry budget.
    #[must_use]
    pub fn new(key: Key, cookie_secure: bool, same_site: SameSite, bind_addr: SocketAddr) -> Self {
        Self {
            key,
            cookie_secure,
            same_site,
            bind_addr,
            db_pool: None,
            default_shape: GridShape::default(),
            max_write_attempts: DEFAULT_MAX_WRITE_ATTEMPTS,
        }
    }

    /// Store organisations and teachers in PostgreSQL.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Shape for organisations created without explicit dimensions.
    #[must_use]
    pub fn with_default_shape(mut self, shape: GridShape) -> Self {
        self.default_shape = shape;
        self
    }

    #[must_use]
    pub fn with_max_write_attempts(mut self, attempts: u32) -> Self {
        self.max_write_attempts = attempts;
        self
    }

    #[cfg_attr(
        not(test),
        expect(dead_code, reason = "read by server tests to find the bound port")
    )]
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
