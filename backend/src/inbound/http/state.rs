//! Shared HTTP adapter state.
//!
//! Handlers receive this through `web::Data` and depend only on the driving
//! ports, so they can be exercised without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    LoginService, MembershipCommand, TeacherCommand, TeacherQuery, TimetableCommand,
    TimetableQuery,
};

/// Port implementations bundled for the handlers.
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub teachers: Arc<dyn TeacherCommand>,
    pub teachers_query: Arc<dyn TeacherQuery>,
    pub timetable: Arc<dyn TimetableCommand>,
    pub timetable_query: Arc<dyn TimetableQuery>,
    pub memberships: Arc<dyn MembershipCommand>,
}
