//! Driving port for teacher membership changes.
//!
//! A membership lives on the teacher record while the organisation keeps a
//! denormalised roster, so implementations write both aggregates.

use async_trait::async_trait;

use crate::domain::{Error, MembershipPermissions, OrganisationId, Teacher, TeacherId};

/// Request to enrol a teacher in an organisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddMembershipRequest {
    pub actor: TeacherId,
    pub organisation_id: OrganisationId,
    pub teacher_id: TeacherId,
    pub subjects: Vec<String>,
    pub classes: Vec<String>,
    pub permissions: MembershipPermissions,
}

/// Partial update of an existing membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateMembershipRequest {
    pub actor: TeacherId,
    pub organisation_id: OrganisationId,
    pub teacher_id: TeacherId,
    pub subjects: Option<Vec<String>>,
    pub classes: Option<Vec<String>>,
    pub permissions: Option<MembershipPermissions>,
    pub is_active: Option<bool>,
}

/// Domain use-case port for membership bookkeeping.
///
/// Every method requires the `manageTeachers` permission.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MembershipCommand: Send + Sync {
    /// Attach a new membership and add the teacher to the roster.
    async fn add_membership(&self, request: AddMembershipRequest) -> Result<Teacher, Error>;

    /// Change subjects, classes, permissions or the active flag.
    async fn update_membership(&self, request: UpdateMembershipRequest) -> Result<Teacher, Error>;

    /// Detach a membership.
    ///
    /// Rejected while the teacher is still placed in any classroom cell.
    async fn remove_membership(
        &self,
        actor: TeacherId,
        organisation_id: &OrganisationId,
        teacher_id: TeacherId,
    ) -> Result<(), Error>;
}
