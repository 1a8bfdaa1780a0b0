//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`*Repository`, `AccessPolicy`) are implemented by outbound
//! adapters. Driving ports (`*Command`, `*Query`, `LoginService`) are
//! implemented by domain services and consumed by inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod access_policy;
mod login_service;
mod membership_command;
mod organisation_repository;
mod teacher_directory;
mod teacher_repository;
mod timetable_command;
mod timetable_query;

#[cfg(test)]
pub use access_policy::MockAccessPolicy;
pub use access_policy::{AccessPolicy, AccessPolicyError};
#[cfg(test)]
pub use login_service::MockLoginService;
pub use login_service::{LoginCredentials, LoginService};
#[cfg(test)]
pub use membership_command::MockMembershipCommand;
pub use membership_command::{AddMembershipRequest, MembershipCommand, UpdateMembershipRequest};
#[cfg(test)]
pub use organisation_repository::MockOrganisationRepository;
pub use organisation_repository::{OrganisationRepository, OrganisationRepositoryError};
#[cfg(test)]
pub use teacher_directory::{MockTeacherCommand, MockTeacherQuery};
pub use teacher_directory::{RegisterTeacherRequest, TeacherCommand, TeacherQuery};
#[cfg(test)]
pub use teacher_repository::MockTeacherRepository;
pub use teacher_repository::{TeacherRepository, TeacherRepositoryError};
#[cfg(test)]
pub use timetable_command::MockTimetableCommand;
pub use timetable_command::{
    ClassroomChanges, ClassroomRef, CreateClassroomRequest, CreateOrganisationRequest,
    SetGridCellRequest, ShapeUpdateResponse, TimetableCommand, UpdateClassroomRequest,
    UpdateOrganisationRequest, UpdateShapeRequest,
};
#[cfg(test)]
pub use timetable_query::MockTimetableQuery;
pub use timetable_query::{ListTeachersRequest, TimetableQuery};
