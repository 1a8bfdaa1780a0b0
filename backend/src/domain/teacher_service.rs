//! Teacher registration, lookup and login.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::domain::ports::{
    AccessPolicy, LoginCredentials, LoginService, RegisterTeacherRequest, TeacherCommand,
    TeacherQuery, TeacherRepository, TeacherRepositoryError,
};
use crate::domain::service_support::{
    map_access_error, map_teacher_repository_error, map_teacher_validation_error,
    teacher_not_found,
};
use crate::domain::{Action, Error, NewTeacher, Teacher, TeacherId};

/// Teacher service implementing the directory and login ports.
#[derive(Clone)]
pub struct TeacherService<T, A> {
    teachers: Arc<T>,
    access: Arc<A>,
}

impl<T, A> TeacherService<T, A> {
    /// Create a new service over the teacher store and access policy.
    pub fn new(teachers: Arc<T>, access: Arc<A>) -> Self {
        Self { teachers, access }
    }
}

fn invalid_credentials() -> Error {
    Error::unauthorized("invalid credentials")
}

fn hidden_teacher(teacher_id: TeacherId) -> Error {
    Error::forbidden(format!("teacher {teacher_id} is not visible"))
}

impl<T, A> TeacherService<T, A>
where
    T: TeacherRepository,
    A: AccessPolicy,
{
    /// Whether `actor` holds `view` in any organisation `teacher` belongs to.
    async fn shares_viewable_organisation(
        &self,
        actor: TeacherId,
        teacher: &Teacher,
    ) -> Result<bool, Error> {
        for membership in teacher.memberships() {
            let allowed = self
                .access
                .has_permission(actor, membership.organisation_id(), Action::View)
                .await
                .map_err(map_access_error)?;
            if allowed {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[async_trait]
impl<T, A> TeacherCommand for TeacherService<T, A>
where
    T: TeacherRepository,
    A: AccessPolicy,
{
    async fn register(&self, request: RegisterTeacherRequest) -> Result<Teacher, Error> {
        let draft = NewTeacher::try_new(&request.name, &request.email)
            .map_err(map_teacher_validation_error)?;

        let existing = self
            .teachers
            .find_by_email(draft.email())
            .await
            .map_err(map_teacher_repository_error)?;
        if existing.is_some() {
            return Err(map_teacher_repository_error(
                TeacherRepositoryError::duplicate_email(draft.email()),
            ));
        }

        let teacher = self
            .teachers
            .insert(draft)
            .await
            .map_err(map_teacher_repository_error)?;
        info!(teacher_id = %teacher.id, "teacher registered");
        Ok(teacher)
    }
}

#[async_trait]
impl<T, A> TeacherQuery for TeacherService<T, A>
where
    T: TeacherRepository,
    A: AccessPolicy,
{
    async fn get_teacher(&self, actor: TeacherId, teacher_id: TeacherId) -> Result<Teacher, Error> {
        let found = self
            .teachers
            .find(teacher_id)
            .await
            .map_err(map_teacher_repository_error)?;
        let Some(teacher) = found else {
            // Only the teacher themself learns that the record is gone.
            return Err(if actor == teacher_id {
                teacher_not_found(teacher_id)
            } else {
                hidden_teacher(teacher_id)
            });
        };
        if actor == teacher_id || self.shares_viewable_organisation(actor, &teacher).await? {
            Ok(teacher)
        } else {
            Err(hidden_teacher(teacher_id))
        }
    }
}

#[async_trait]
impl<T, A> LoginService for TeacherService<T, A>
where
    T: TeacherRepository,
    A: AccessPolicy,
{
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<TeacherId, Error> {
        let teacher_id = credentials.teacher_id();
        let found = self
            .teachers
            .find(teacher_id)
            .await
            .map_err(map_teacher_repository_error)?;
        match found {
            Some(teacher) if teacher.is_active && teacher.email == credentials.email() => {
                info!(teacher_id = %teacher_id, "teacher logged in");
                Ok(teacher_id)
            }
            _ => {
                debug!(teacher_id = %teacher_id, "login rejected");
                Err(invalid_credentials())
            }
        }
    }
}
