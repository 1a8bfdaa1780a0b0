//! Port for teacher persistence.
//!
//! Teachers are stored with their memberships embedded. Ids are numeric and
//! allocated by the repository on insert; email addresses are unique after
//! normalisation.

use async_trait::async_trait;

use crate::domain::{NewTeacher, OrganisationId, Teacher, TeacherId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by teacher repository adapters.
    pub enum TeacherRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "teacher repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "teacher repository query failed: {message}",
        /// Optimistic concurrency check failed.
        RevisionMismatch { expected: u32, actual: u32 } =>
            "revision mismatch: expected {expected}, found {actual}",
        /// Another teacher already uses this email address.
        DuplicateEmail { email: String } =>
            "email {email} is already registered",
        /// A conditional update targeted a teacher that no longer exists.
        Missing { teacher_id: u64 } =>
            "teacher {teacher_id} does not exist",
    }
}

/// Port for teacher storage and lookup.
///
/// Saves follow the same revision contract as
/// [`super::OrganisationRepository`]: the caller bumps `teacher.revision`
/// and passes the revision it read.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TeacherRepository: Send + Sync {
    /// Fetch one teacher.
    async fn find(&self, teacher_id: TeacherId) -> Result<Option<Teacher>, TeacherRepositoryError>;

    /// Fetch every teacher in `teacher_ids` that exists, in id order.
    async fn find_many(
        &self,
        teacher_ids: &[TeacherId],
    ) -> Result<Vec<Teacher>, TeacherRepositoryError>;

    /// Teachers holding a membership in `organisation_id`, active or not.
    async fn find_by_organisation(
        &self,
        organisation_id: &OrganisationId,
    ) -> Result<Vec<Teacher>, TeacherRepositoryError>;

    /// Look up a teacher by normalised email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<Teacher>, TeacherRepositoryError>;

    /// Allocate the next id and store a new teacher at revision 1.
    async fn insert(&self, teacher: NewTeacher) -> Result<Teacher, TeacherRepositoryError>;

    /// Replace a teacher if its stored revision is still `expected_revision`.
    async fn save(
        &self,
        teacher: &Teacher,
        expected_revision: u32,
    ) -> Result<(), TeacherRepositoryError>;
}
