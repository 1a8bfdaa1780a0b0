//! Driving port for timetable reads.

use async_trait::async_trait;

use crate::domain::{
    Classroom, Error, Organisation, OrganisationId, OrganisationStats, Teacher, TeacherId,
    TeacherSchedule,
};

use super::ClassroomRef;

/// Filters for listing an organisation's teachers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListTeachersRequest {
    pub actor: TeacherId,
    pub organisation_id: OrganisationId,
    /// Keep only teachers whose membership lists this subject.
    pub subject: Option<String>,
    /// Keep only teachers whose membership lists this class.
    pub class: Option<String>,
    /// Keep only teachers with an active account and membership.
    pub active_only: bool,
}

/// Domain use-case port for timetable reads.
///
/// Every method except [`TimetableQuery::list_organisations`] requires the
/// `view` permission in the organisation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TimetableQuery: Send + Sync {
    /// Organisations the actor administers or may view, ordered by id.
    async fn list_organisations(&self, actor: TeacherId) -> Result<Vec<Organisation>, Error>;

    /// Fetch an organisation with its classrooms.
    async fn get_organisation(
        &self,
        actor: TeacherId,
        organisation_id: &OrganisationId,
    ) -> Result<Organisation, Error>;

    /// Fetch one classroom.
    async fn get_classroom(&self, request: ClassroomRef) -> Result<Classroom, Error>;

    /// Derive a teacher's schedule from the current classroom grids.
    async fn get_teacher_schedule(
        &self,
        actor: TeacherId,
        organisation_id: &OrganisationId,
        teacher_id: TeacherId,
    ) -> Result<TeacherSchedule, Error>;

    /// Headline counts for the organisation.
    async fn get_organisation_stats(
        &self,
        actor: TeacherId,
        organisation_id: &OrganisationId,
    ) -> Result<OrganisationStats, Error>;

    /// Teachers holding a membership in the organisation.
    async fn list_organisation_teachers(
        &self,
        request: ListTeachersRequest,
    ) -> Result<Vec<Teacher>, Error>;
}
