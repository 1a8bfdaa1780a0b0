//! Domain primitives, aggregates and services.
//!
//! Purpose: define the timetable model (grid addressing, cells, classrooms,
//! organisations and teacher memberships), the validation and aggregation
//! passes that run over it, and the ports adapters implement. Nothing here
//! depends on Actix, Diesel or any other transport or storage crate.
//!
//! Public surface:
//! - `grid`: `GridShape`, `GridAddress`, `Cell`, `TimetableGrid`.
//! - `Organisation` / `Classroom`: the aggregate root and its classrooms.
//! - `Teacher` / `TeacherMembership`: teachers and per-organisation records.
//! - `validate_cell` / `compute_schedule`: cross-reference checks and
//!   on-demand schedule aggregation.
//! - `TimetableService` / `TeacherService`: driving port implementations.
//! - `Error` / `ErrorCode`: transport-agnostic failure payload.

pub mod cell_validation;
pub mod error;
pub mod grid;
pub mod organisation;
pub mod organisation_stats;
pub mod permission;
pub mod ports;
pub mod schedule;
mod service_support;
pub mod teacher;
mod teacher_service;
mod timetable_service;
pub mod trace_id;

pub use self::cell_validation::{CellValidationError, ensure_rostered, validate_cell};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::organisation::{
    Classroom, ClassroomDetails, ClassroomDraft, ClassroomId, DEFAULT_DAYS_COUNT,
    DEFAULT_PERIOD_COUNT, IdentifierError, Organisation, OrganisationError, OrganisationId,
    ShapeChange,
};
pub use self::organisation_stats::OrganisationStats;
pub use self::permission::{Action, GlobalPermissions, MembershipPermissions, ParseActionError};
pub use self::schedule::{ScheduleError, ScheduleSlot, TeacherSchedule, compute_schedule};
pub use self::teacher::{
    MembershipError, NewTeacher, Teacher, TeacherId, TeacherMembership, TeacherValidationError,
    normalise_email,
};
pub use self::teacher_service::TeacherService;
pub use self::timetable_service::{DEFAULT_MAX_WRITE_ATTEMPTS, TimetableService};
pub use self::trace_id::TraceId;

/// HTTP header name used to propagate trace identifiers.
pub const TRACE_ID_HEADER: &str = "trace-id";

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use timetable::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<()> {
///     Err(Error::forbidden("nope"))
/// }
/// assert!(handler().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
