//! Access policy backed by the organisation and teacher stores.
//!
//! Resolution order: unknown or deactivated actors are denied; global flags
//! and the actor's active membership flags grant without reading the
//! organisation, so a granted caller still sees the service's own not-found
//! error; otherwise only the organisation admin is allowed, and an unknown
//! organisation is denied.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::ports::{
    AccessPolicy, AccessPolicyError, OrganisationRepository, OrganisationRepositoryError,
    TeacherRepository, TeacherRepositoryError,
};
use crate::domain::{Action, OrganisationId, TeacherId};

/// Resolves permissions from stored memberships.
#[derive(Clone)]
pub struct MembershipAccessPolicy<O, T> {
    organisations: Arc<O>,
    teachers: Arc<T>,
}

impl<O, T> MembershipAccessPolicy<O, T> {
    pub fn new(organisations: Arc<O>, teachers: Arc<T>) -> Self {
        Self {
            organisations,
            teachers,
        }
    }
}

fn map_organisation_error(error: OrganisationRepositoryError) -> AccessPolicyError {
    match error {
        OrganisationRepositoryError::Connection { message } => {
            AccessPolicyError::connection(message)
        }
        other => AccessPolicyError::query(other.to_string()),
    }
}

fn map_teacher_error(error: TeacherRepositoryError) -> AccessPolicyError {
    match error {
        TeacherRepositoryError::Connection { message } => AccessPolicyError::connection(message),
        other => AccessPolicyError::query(other.to_string()),
    }
}

#[async_trait]
impl<O, T> AccessPolicy for MembershipAccessPolicy<O, T>
where
    O: OrganisationRepository,
    T: TeacherRepository,
{
    async fn has_permission(
        &self,
        actor: TeacherId,
        organisation_id: &OrganisationId,
        action: Action,
    ) -> Result<bool, AccessPolicyError> {
        let Some(teacher) = self.teachers.find(actor).await.map_err(map_teacher_error)? else {
            debug!(actor = %actor, "permission check for unknown teacher");
            return Ok(false);
        };
        if !teacher.is_active {
            return Ok(false);
        }
        if teacher.allows(organisation_id, action) {
            return Ok(true);
        }
        let Some(organisation) = self
            .organisations
            .find(organisation_id)
            .await
            .map_err(map_organisation_error)?
        else {
            return Ok(false);
        };
        Ok(organisation.admin_ref == actor)
    }
}
