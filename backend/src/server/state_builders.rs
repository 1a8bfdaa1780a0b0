//! Wires repositories, the access policy and domain services into
//! [`HttpState`].

use std::sync::Arc;

use actix_web::web;
use mockable::DefaultClock;
use tracing::info;

use timetable::domain::ports::{OrganisationRepository, TeacherRepository};
use timetable::domain::{TeacherService, TimetableService};
use timetable::inbound::http::state::HttpState;
use timetable::outbound::access::MembershipAccessPolicy;
use timetable::outbound::memory::{InMemoryOrganisationRepository, InMemoryTeacherRepository};
use timetable::outbound::persistence::{DieselOrganisationRepository, DieselTeacherRepository};

use super::ServerConfig;

/// Build the handler state over PostgreSQL when a pool is configured and
/// over in-process maps otherwise.
pub(super) fn build_http_state(config: &ServerConfig) -> web::Data<HttpState> {
    let state = match &config.db_pool {
        Some(pool) => {
            info!("using PostgreSQL repositories");
            wire(
                Arc::new(DieselOrganisationRepository::new(pool.clone())),
                Arc::new(DieselTeacherRepository::new(pool.clone())),
                config,
            )
        }
        None => {
            info!("no database configured; using in-memory repositories");
            wire(
                Arc::new(InMemoryOrganisationRepository::new()),
                Arc::new(InMemoryTeacherRepository::new()),
                config,
            )
        }
    };
    web::Data::new(state)
}

fn wire<O, T>(organisations: Arc<O>, teachers: Arc<T>, config: &ServerConfig) -> HttpState
where
    O: OrganisationRepository + 'static,
    T: TeacherRepository + 'static,
{
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
        .with_default_shape(config.default_shape)
        .with_max_write_attempts(config.max_write_attempts),
    );
    let directory = Arc::new(TeacherService::new(teachers, access));
    HttpState {
        login: directory.clone(),
        teachers: directory.clone(),
        teachers_query: directory,
        timetable: timetable.clone(),
        timetable_query: timetable.clone(),
        memberships: timetable,
    }
}
