//! Timetable domain service.
//!
//! Implements the organisation, classroom, grid and membership driving ports.
//! Every guarded operation consults the [`AccessPolicy`] before it touches the
//! repository. Writes follow a read-modify-write cycle: the aggregate is read,
//! the change is computed against that copy, and the save is conditional on
//! the revision that was read. A lost race is retried from a fresh read up to
//! `max_write_attempts` times.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::domain::grid::{Cell, GridShape, TimetableGrid};
use crate::domain::ports::{
    AccessPolicy, AddMembershipRequest, ClassroomRef, CreateClassroomRequest,
    CreateOrganisationRequest, ListTeachersRequest, MembershipCommand, OrganisationRepository,
    OrganisationRepositoryError, SetGridCellRequest, ShapeUpdateResponse, TeacherRepository,
    TeacherRepositoryError, TimetableCommand, TimetableQuery, UpdateClassroomRequest,
    UpdateMembershipRequest, UpdateOrganisationRequest, UpdateShapeRequest,
};
use crate::domain::service_support::{
    authorize, invalid_field, map_cell_validation_error, map_grid_error, map_membership_error,
    map_organisation_error, map_organisation_repository_error, map_schedule_error,
    map_teacher_repository_error, organisation_not_found, revision_conflict, teacher_not_found,
};
use crate::domain::{
    Action, CellValidationError, Classroom, ClassroomId, Error, MembershipError, Organisation,
    OrganisationError, OrganisationId, OrganisationStats, Teacher, TeacherId, TeacherMembership,
    TeacherSchedule, compute_schedule, ensure_rostered, validate_cell,
};

/// Attempts made before a lost revision race is reported as a conflict.
pub const DEFAULT_MAX_WRITE_ATTEMPTS: u32 = 3;

/// Timetable service implementing the timetable and membership ports.
#[derive(Clone)]
pub struct TimetableService<O, T, A> {
    organisations: Arc<O>,
    teachers: Arc<T>,
    access: Arc<A>,
    clock: Arc<dyn Clock>,
    default_shape: GridShape,
    max_write_attempts: u32,
}

impl<O, T, A> TimetableService<O, T, A> {
    /// Create a service with the default shape and retry budget.
    pub fn new(
        organisations: Arc<O>,
        teachers: Arc<T>,
        access: Arc<A>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            organisations,
            teachers,
            access,
            clock,
            default_shape: GridShape::default(),
            max_write_attempts: DEFAULT_MAX_WRITE_ATTEMPTS,
        }
    }

    /// Shape given to organisations created without explicit dimensions.
    #[must_use]
    pub fn with_default_shape(mut self, shape: GridShape) -> Self {
        self.default_shape = shape;
        self
    }

    /// Number of read-modify-write attempts per mutation; at least one.
    #[must_use]
    pub fn with_max_write_attempts(mut self, attempts: u32) -> Self {
        self.max_write_attempts = attempts.max(1);
        self
    }
}

fn next_revision(revision: u32) -> Result<u32, Error> {
    revision
        .checked_add(1)
        .ok_or_else(|| Error::internal("revision counter exhausted"))
}

fn required_text(value: &str, field: &str) -> Result<String, Error> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(invalid_field(
            field,
            format!("{field} must not be empty"),
            "empty_value",
        ));
    }
    Ok(trimmed.to_owned())
}

fn trimmed_set(values: &BTreeSet<String>) -> BTreeSet<String> {
    values
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .collect()
}

fn classroom_not_found(classroom_id: &ClassroomId) -> Error {
    map_organisation_error(OrganisationError::ClassroomNotFound(classroom_id.clone()))
}

/// Run the cross-reference pass against the resolved members.
fn check_cell(
    cell: &Cell,
    organisation_id: &OrganisationId,
    members: &BTreeMap<TeacherId, Teacher>,
) -> Result<(), Error> {
    validate_cell(cell, organisation_id, |teacher_id| {
        members
            .get(&teacher_id)
            .and_then(|teacher| teacher.active_membership(organisation_id))
    })
    .map_err(map_cell_validation_error)
}

/// Every rostered teacher must be an active member of the organisation.
fn check_roster(
    roster: &BTreeSet<TeacherId>,
    organisation_id: &OrganisationId,
    members: &BTreeMap<TeacherId, Teacher>,
) -> Result<(), Error> {
    for teacher_id in roster {
        let active = members
            .get(teacher_id)
            .and_then(|teacher| teacher.active_membership(organisation_id))
            .is_some();
        if !active {
            let error = CellValidationError::UnknownTeacher {
                teacher_id: *teacher_id,
                organisation_id: organisation_id.clone(),
            };
            return Err(invalid_field(
                "assignedTeachers",
                error.to_string(),
                "unknown_teacher",
            ));
        }
    }
    Ok(())
}

impl<O, T, A> TimetableService<O, T, A>
where
    O: OrganisationRepository,
    T: TeacherRepository,
    A: AccessPolicy,
{
    async fn load_organisation(
        &self,
        organisation_id: &OrganisationId,
    ) -> Result<Organisation, Error> {
        self.organisations
            .find(organisation_id)
            .await
            .map_err(map_organisation_repository_error)?
            .ok_or_else(|| organisation_not_found(organisation_id))
    }

    async fn load_teacher(&self, teacher_id: TeacherId) -> Result<Teacher, Error> {
        self.teachers
            .find(teacher_id)
            .await
            .map_err(map_teacher_repository_error)?
            .ok_or_else(|| teacher_not_found(teacher_id))
    }

    async fn members_by_id(
        &self,
        teacher_ids: &BTreeSet<TeacherId>,
    ) -> Result<BTreeMap<TeacherId, Teacher>, Error> {
        if teacher_ids.is_empty() {
            return Ok(BTreeMap::new());
        }
        let ids: Vec<TeacherId> = teacher_ids.iter().copied().collect();
        let teachers = self
            .teachers
            .find_many(&ids)
            .await
            .map_err(map_teacher_repository_error)?;
        Ok(teachers
            .into_iter()
            .map(|teacher| (teacher.id, teacher))
            .collect())
    }

    /// Read, apply `change` and conditionally save an organisation.
    ///
    /// `change` may run more than once and must only touch the aggregate it
    /// is given. An explicit `expected_revision` that differs from the read
    /// revision fails immediately.
    async fn mutate_organisation<R, F>(
        &self,
        organisation_id: &OrganisationId,
        expected_revision: Option<u32>,
        mut change: F,
    ) -> Result<(Organisation, R), Error>
    where
        F: FnMut(&mut Organisation) -> Result<R, Error> + Send,
        R: Send,
    {
        let mut attempt = 1;
        loop {
            let mut organisation = self.load_organisation(organisation_id).await?;
            let read_revision = organisation.revision;
            if let Some(expected) = expected_revision {
                if expected != read_revision {
                    return Err(revision_conflict(Some(expected), read_revision));
                }
            }

            let outcome = change(&mut organisation)?;
            organisation.revision = next_revision(read_revision)?;

            match self
                .organisations
                .save(&organisation, Some(read_revision))
                .await
            {
                Ok(()) => return Ok((organisation, outcome)),
                Err(OrganisationRepositoryError::RevisionMismatch { expected, actual })
                    if attempt < self.max_write_attempts =>
                {
                    debug!(
                        organisation_id = %organisation_id,
                        attempt,
                        expected,
                        actual,
                        "organisation write lost a revision race; retrying from a fresh read"
                    );
                    attempt += 1;
                }
                Err(error) => return Err(map_organisation_repository_error(error)),
            }
        }
    }

    /// Teacher counterpart of [`Self::mutate_organisation`].
    async fn mutate_teacher<R, F>(
        &self,
        teacher_id: TeacherId,
        mut change: F,
    ) -> Result<(Teacher, R), Error>
    where
        F: FnMut(&mut Teacher) -> Result<R, Error> + Send,
        R: Send,
    {
        let mut attempt = 1;
        loop {
            let mut teacher = self.load_teacher(teacher_id).await?;
            let read_revision = teacher.revision;
            let outcome = change(&mut teacher)?;
            teacher.revision = next_revision(read_revision)?;

            match self.teachers.save(&teacher, read_revision).await {
                Ok(()) => return Ok((teacher, outcome)),
                Err(TeacherRepositoryError::RevisionMismatch { expected, actual })
                    if attempt < self.max_write_attempts =>
                {
                    debug!(
                        teacher_id = %teacher_id,
                        attempt,
                        expected,
                        actual,
                        "teacher write lost a revision race; retrying from a fresh read"
                    );
                    attempt += 1;
                }
                Err(error) => return Err(map_teacher_repository_error(error)),
            }
        }
    }

    /// Undo a membership whose organisation roster update failed.
    ///
    /// Covers the organisation being deleted between the two writes.
    async fn withdraw_membership(
        &self,
        organisation_id: &OrganisationId,
        teacher_id: TeacherId,
        cause: &Error,
    ) -> Result<(), Error> {
        warn!(
            organisation_id = %organisation_id,
            teacher_id = %teacher_id,
            cause = %cause.message(),
            "organisation roster update failed; withdrawing the new membership"
        );
        self.mutate_teacher(teacher_id, |teacher| {
            if teacher.membership(organisation_id).is_some() {
                teacher
                    .remove_membership(organisation_id)
                    .map_err(map_membership_error)?;
            }
            Ok(())
        })
        .await
        .map(drop)
    }

    async fn apply_shape(
        &self,
        organisation_id: &OrganisationId,
        shape: GridShape,
        expected_revision: Option<u32>,
    ) -> Result<ShapeUpdateResponse, Error> {
        let (organisation, change) = self
            .mutate_organisation(organisation_id, expected_revision, |organisation| {
                Ok(organisation.reshape(shape))
            })
            .await?;
        info!(
            organisation_id = %organisation_id,
            days_count = shape.days_count(),
            period_count = shape.period_count(),
            previous_days_count = change.previous.days_count(),
            previous_period_count = change.previous.period_count(),
            dropped_cells = change.dropped_cells,
            "organisation reshaped"
        );
        Ok(ShapeUpdateResponse {
            organisation,
            dropped_cells: change.dropped_cells,
        })
    }
}

#[async_trait]
impl<O, T, A> TimetableCommand for TimetableService<O, T, A>
where
    O: OrganisationRepository,
    T: TeacherRepository,
    A: AccessPolicy,
{
    async fn create_organisation(
        &self,
        request: CreateOrganisationRequest,
    ) -> Result<Organisation, Error> {
        let name = required_text(&request.name, "name")?;
        let shape = GridShape::new(
            request
                .days_count
                .unwrap_or(self.default_shape.days_count()),
            request
                .period_count
                .unwrap_or(self.default_shape.period_count()),
        )
        .map_err(map_grid_error)?;

        let admin = self
            .teachers
            .find(request.actor)
            .await
            .map_err(map_teacher_repository_error)?;
        if admin.is_none() {
            return Err(Error::unauthorized("session teacher no longer exists"));
        }

        let organisation = Organisation::new(request.organisation_id, name, request.actor, shape);
        self.organisations
            .save(&organisation, None)
            .await
            .map_err(map_organisation_repository_error)?;
        info!(
            organisation_id = %organisation.organisation_id,
            admin = %request.actor,
            days_count = shape.days_count(),
            period_count = shape.period_count(),
            "organisation created"
        );
        Ok(organisation)
    }

    async fn update_organisation(
        &self,
        request: UpdateOrganisationRequest,
    ) -> Result<Organisation, Error> {
        let organisation_id = &request.organisation_id;
        authorize(
            self.access.as_ref(),
            request.actor,
            organisation_id,
            Action::ManageClassrooms,
        )
        .await?;
        let name = request
            .name
            .as_deref()
            .map(|name| required_text(name, "name"))
            .transpose()?;
        let days_count = request.days_count;
        let period_count = request.period_count;

        let (organisation, change) = self
            .mutate_organisation(organisation_id, request.expected_revision, |organisation| {
                if let Some(name) = &name {
                    organisation.name.clone_from(name);
                }
                if days_count.is_none() && period_count.is_none() {
                    return Ok(None);
                }
                let current = organisation.shape();
                let shape = GridShape::new(
                    days_count.unwrap_or(current.days_count()),
                    period_count.unwrap_or(current.period_count()),
                )
                .map_err(map_grid_error)?;
                Ok((shape != current).then(|| organisation.reshape(shape)))
            })
            .await?;

        if let Some(change) = change {
            info!(
                organisation_id = %organisation_id,
                days_count = change.current.days_count(),
                period_count = change.current.period_count(),
                dropped_cells = change.dropped_cells,
                "organisation reshaped"
            );
        }
        Ok(organisation)
    }

    async fn update_organisation_shape(
        &self,
        request: UpdateShapeRequest,
    ) -> Result<ShapeUpdateResponse, Error> {
        authorize(
            self.access.as_ref(),
            request.actor,
            &request.organisation_id,
            Action::ManageClassrooms,
        )
        .await?;
        let shape =
            GridShape::new(request.days_count, request.period_count).map_err(map_grid_error)?;
        self.apply_shape(&request.organisation_id, shape, request.expected_revision)
            .await
    }

    async fn delete_organisation(
        &self,
        actor: TeacherId,
        organisation_id: &OrganisationId,
    ) -> Result<(), Error> {
        authorize(self.access.as_ref(), actor, organisation_id, Action::Delete).await?;
        let organisation = self.load_organisation(organisation_id).await?;
        let members = self
            .teachers
            .find_by_organisation(organisation_id)
            .await
            .map_err(map_teacher_repository_error)?;

        let removed = self
            .organisations
            .delete(organisation_id)
            .await
            .map_err(map_organisation_repository_error)?;
        if !removed {
            return Err(organisation_not_found(organisation_id));
        }

        for member in &members {
            self.mutate_teacher(member.id, |teacher| {
                if teacher.membership(organisation_id).is_some() {
                    teacher
                        .remove_membership(organisation_id)
                        .map_err(map_membership_error)?;
                }
                Ok(())
            })
            .await?;
        }
        info!(
            organisation_id = %organisation_id,
            classrooms = organisation.classrooms().len(),
            memberships = members.len(),
            "organisation deleted"
        );
        Ok(())
    }

    async fn create_classroom(&self, request: CreateClassroomRequest) -> Result<Classroom, Error> {
        let organisation_id = &request.organisation_id;
        authorize(
            self.access.as_ref(),
            request.actor,
            organisation_id,
            Action::ManageClassrooms,
        )
        .await?;

        let mut draft = request.classroom;
        draft.classroom_name = required_text(&draft.classroom_name, "classroomName")?;
        draft.assigned_subjects = trimmed_set(&draft.assigned_subjects);
        let roster = draft.roster();
        let members = self.members_by_id(&roster).await?;
        check_roster(&roster, organisation_id, &members)?;

        let (_, classroom) = self
            .mutate_organisation(organisation_id, request.expected_revision, |organisation| {
                organisation
                    .add_classroom(draft.clone())
                    .cloned()
                    .map_err(map_organisation_error)
            })
            .await?;
        info!(
            organisation_id = %organisation_id,
            classroom_id = %classroom.classroom_id,
            slots = classroom.grid.len(),
            "classroom created"
        );
        Ok(classroom)
    }

    async fn update_classroom(&self, request: UpdateClassroomRequest) -> Result<Classroom, Error> {
        let organisation_id = &request.organisation_id;
        let classroom_id = &request.classroom_id;
        authorize(self.access.as_ref(), request.actor, organisation_id, Action::Edit).await?;

        let changes = request.changes;
        let classroom_name = changes
            .classroom_name
            .as_deref()
            .map(|name| required_text(name, "classroomName"))
            .transpose()?;
        let assigned_subjects = changes.assigned_subjects.as_ref().map(trimmed_set);

        let mut new_roster = changes.assigned_teachers.clone().unwrap_or_default();
        if let Some(Some(primary)) = changes.assigned_teacher {
            new_roster.insert(primary);
        }
        let mut referenced = new_roster.clone();
        for cell in changes.grid.iter().flatten() {
            referenced.extend(cell.teachers().iter().copied());
        }
        let members = self.members_by_id(&referenced).await?;
        check_roster(&new_roster, organisation_id, &members)?;
        for cell in changes.grid.iter().flatten() {
            check_cell(cell, organisation_id, &members)?;
        }

        let (_, classroom) = self
            .mutate_organisation(organisation_id, request.expected_revision, |organisation| {
                organisation
                    .update_classroom_details(classroom_id, |details| {
                        if let Some(name) = &classroom_name {
                            details.classroom_name.clone_from(name);
                        }
                        if let Some(primary) = changes.assigned_teacher {
                            *details.assigned_teacher = primary;
                        }
                        if let Some(roster) = &changes.assigned_teachers {
                            details.assigned_teachers.clone_from(roster);
                        }
                        if let Some(subjects) = &assigned_subjects {
                            details.assigned_subjects.clone_from(subjects);
                        }
                    })
                    .map_err(map_organisation_error)?;
                if let Some(cells) = &changes.grid {
                    organisation
                        .replace_grid(classroom_id, TimetableGrid::from_cells(cells.clone()))
                        .map_err(map_organisation_error)?;
                }

                let classroom = organisation
                    .classroom(classroom_id)
                    .ok_or_else(|| classroom_not_found(classroom_id))?;
                for cell in classroom.grid.cells() {
                    ensure_rostered(cell, classroom).map_err(map_cell_validation_error)?;
                }
                Ok(classroom.clone())
            })
            .await?;
        info!(
            organisation_id = %organisation_id,
            classroom_id = %classroom_id,
            grid_replaced = changes.grid.is_some(),
            "classroom updated"
        );
        Ok(classroom)
    }

    async fn remove_classroom(&self, request: ClassroomRef) -> Result<(), Error> {
        let organisation_id = &request.organisation_id;
        let classroom_id = &request.classroom_id;
        authorize(
            self.access.as_ref(),
            request.actor,
            organisation_id,
            Action::ManageClassrooms,
        )
        .await?;
        self.mutate_organisation(organisation_id, None, |organisation| {
            organisation
                .remove_classroom(classroom_id)
                .map(drop)
                .map_err(map_organisation_error)
        })
        .await?;
        info!(
            organisation_id = %organisation_id,
            classroom_id = %classroom_id,
            "classroom removed"
        );
        Ok(())
    }

    async fn set_grid_cell(&self, request: SetGridCellRequest) -> Result<Classroom, Error> {
        let organisation_id = &request.organisation_id;
        let classroom_id = &request.classroom_id;
        let address = request.address;
        let cell = &request.cell;
        authorize(self.access.as_ref(), request.actor, organisation_id, Action::Edit).await?;

        let members = self.members_by_id(cell.teachers()).await?;
        check_cell(cell, organisation_id, &members)?;

        let (organisation, classroom) = self
            .mutate_organisation(organisation_id, request.expected_revision, |organisation| {
                address
                    .validate(organisation.shape())
                    .map_err(map_grid_error)?;
                let classroom = organisation
                    .classroom(classroom_id)
                    .ok_or_else(|| classroom_not_found(classroom_id))?;
                ensure_rostered(cell, classroom).map_err(map_cell_validation_error)?;
                organisation
                    .set_cell(classroom_id, address, cell.clone())
                    .map_err(map_organisation_error)?;
                organisation
                    .classroom(classroom_id)
                    .cloned()
                    .ok_or_else(|| classroom_not_found(classroom_id))
            })
            .await?;
        debug!(
            organisation_id = %organisation_id,
            classroom_id = %classroom_id,
            %address,
            index = address.to_index(organisation.shape()),
            revision = organisation.revision,
            "grid cell written"
        );
        Ok(classroom)
    }
}

#[async_trait]
impl<O, T, A> TimetableQuery for TimetableService<O, T, A>
where
    O: OrganisationRepository,
    T: TeacherRepository,
    A: AccessPolicy,
{
    async fn list_organisations(&self, actor: TeacherId) -> Result<Vec<Organisation>, Error> {
        let teacher = self
            .teachers
            .find(actor)
            .await
            .map_err(map_teacher_repository_error)?
            .ok_or_else(|| Error::unauthorized("session teacher no longer exists"))?;
        if !teacher.is_active {
            return Ok(Vec::new());
        }
        let organisations = self
            .organisations
            .list()
            .await
            .map_err(map_organisation_repository_error)?;
        Ok(organisations
            .into_iter()
            .filter(|organisation| {
                organisation.admin_ref == actor
                    || teacher.allows(&organisation.organisation_id, Action::View)
            })
            .collect())
    }

    async fn get_organisation(
        &self,
        actor: TeacherId,
        organisation_id: &OrganisationId,
    ) -> Result<Organisation, Error> {
        authorize(self.access.as_ref(), actor, organisation_id, Action::View).await?;
        self.load_organisation(organisation_id).await
    }

    async fn get_classroom(&self, request: ClassroomRef) -> Result<Classroom, Error> {
        authorize(
            self.access.as_ref(),
            request.actor,
            &request.organisation_id,
            Action::View,
        )
        .await?;
        let organisation = self.load_organisation(&request.organisation_id).await?;
        organisation
            .classroom(&request.classroom_id)
            .cloned()
            .ok_or_else(|| classroom_not_found(&request.classroom_id))
    }

    async fn get_teacher_schedule(
        &self,
        actor: TeacherId,
        organisation_id: &OrganisationId,
        teacher_id: TeacherId,
    ) -> Result<TeacherSchedule, Error> {
        authorize(self.access.as_ref(), actor, organisation_id, Action::View).await?;
        let organisation = self.load_organisation(organisation_id).await?;
        let teacher = self.load_teacher(teacher_id).await?;
        compute_schedule(&teacher, &organisation).map_err(map_schedule_error)
    }

    async fn get_organisation_stats(
        &self,
        actor: TeacherId,
        organisation_id: &OrganisationId,
    ) -> Result<OrganisationStats, Error> {
        authorize(self.access.as_ref(), actor, organisation_id, Action::View).await?;
        let organisation = self.load_organisation(organisation_id).await?;
        let members = self
            .teachers
            .find_by_organisation(organisation_id)
            .await
            .map_err(map_teacher_repository_error)?;
        Ok(OrganisationStats::compute(&organisation, &members))
    }

    async fn list_organisation_teachers(
        &self,
        request: ListTeachersRequest,
    ) -> Result<Vec<Teacher>, Error> {
        let organisation_id = &request.organisation_id;
        authorize(self.access.as_ref(), request.actor, organisation_id, Action::View).await?;
        self.load_organisation(organisation_id).await?;
        let subject = request
            .subject
            .as_deref()
            .map(str::trim)
            .filter(|subject| !subject.is_empty());
        let class = request
            .class
            .as_deref()
            .map(str::trim)
            .filter(|class| !class.is_empty());

        let members = self
            .teachers
            .find_by_organisation(organisation_id)
            .await
            .map_err(map_teacher_repository_error)?;
        Ok(members
            .into_iter()
            .filter(|teacher| {
                !request.active_only || teacher.active_membership(organisation_id).is_some()
            })
            .filter(|teacher| {
                let Some(membership) = teacher.membership(organisation_id) else {
                    return false;
                };
                subject.is_none_or(|subject| membership.teaches(subject))
                    && class.is_none_or(|class| membership.classes().contains(class))
            })
            .collect())
    }
}

#[async_trait]
impl<O, T, A> MembershipCommand for TimetableService<O, T, A>
where
    O: OrganisationRepository,
    T: TeacherRepository,
    A: AccessPolicy,
{
    async fn add_membership(&self, request: AddMembershipRequest) -> Result<Teacher, Error> {
        let organisation_id = &request.organisation_id;
        let teacher_id = request.teacher_id;
        authorize(
            self.access.as_ref(),
            request.actor,
            organisation_id,
            Action::ManageTeachers,
        )
        .await?;
        self.load_organisation(organisation_id).await?;

        let membership = TeacherMembership::new(
            organisation_id.clone(),
            &request.subjects,
            &request.classes,
            request.permissions,
            self.clock.utc(),
        )
        .map_err(map_membership_error)?;

        let (teacher, ()) = self
            .mutate_teacher(teacher_id, |teacher| {
                teacher
                    .add_membership(membership.clone())
                    .map_err(map_membership_error)
            })
            .await?;
        let roster_update = self
            .mutate_organisation(organisation_id, None, |organisation| {
                organisation.teachers.insert(teacher_id);
                Ok(())
            })
            .await;
        if let Err(error) = roster_update {
            self.withdraw_membership(organisation_id, teacher_id, &error)
                .await?;
            return Err(error);
        }
        info!(
            organisation_id = %organisation_id,
            teacher_id = %teacher_id,
            "membership added"
        );
        Ok(teacher)
    }

    async fn update_membership(&self, request: UpdateMembershipRequest) -> Result<Teacher, Error> {
        let organisation_id = &request.organisation_id;
        let teacher_id = request.teacher_id;
        authorize(
            self.access.as_ref(),
            request.actor,
            organisation_id,
            Action::ManageTeachers,
        )
        .await?;
        self.load_organisation(organisation_id).await?;

        let (teacher, ()) = self
            .mutate_teacher(teacher_id, |teacher| {
                let membership = teacher.membership_mut(organisation_id).ok_or_else(|| {
                    map_membership_error(MembershipError::NotAMember {
                        teacher_id,
                        organisation_id: organisation_id.clone(),
                    })
                })?;
                if request.subjects.is_some() || request.classes.is_some() {
                    let subjects: Vec<String> = request
                        .subjects
                        .clone()
                        .unwrap_or_else(|| membership.subjects().iter().cloned().collect());
                    let classes: Vec<String> = request
                        .classes
                        .clone()
                        .unwrap_or_else(|| membership.classes().iter().cloned().collect());
                    membership
                        .replace_assignments(subjects, classes)
                        .map_err(map_membership_error)?;
                }
                if let Some(permissions) = request.permissions {
                    membership.set_permissions(permissions);
                }
                if let Some(is_active) = request.is_active {
                    membership.set_active(is_active);
                }
                Ok(())
            })
            .await?;
        info!(
            organisation_id = %organisation_id,
            teacher_id = %teacher_id,
            "membership updated"
        );
        Ok(teacher)
    }

    async fn remove_membership(
        &self,
        actor: TeacherId,
        organisation_id: &OrganisationId,
        teacher_id: TeacherId,
    ) -> Result<(), Error> {
        authorize(
            self.access.as_ref(),
            actor,
            organisation_id,
            Action::ManageTeachers,
        )
        .await?;
        let teacher = self.load_teacher(teacher_id).await?;
        if teacher.membership(organisation_id).is_none() {
            return Err(map_membership_error(MembershipError::NotAMember {
                teacher_id,
                organisation_id: organisation_id.clone(),
            }));
        }

        self.mutate_organisation(organisation_id, None, |organisation| {
            let scheduled: Vec<String> = organisation
                .classrooms_scheduling(teacher_id)
                .map(|classroom| classroom.classroom_id.to_string())
                .collect();
            if !scheduled.is_empty() {
                return Err(Error::conflict(format!(
                    "teacher {teacher_id} is still placed in classroom grids"
                ))
                .with_details(json!({
                    "teacherId": teacher_id,
                    "classroomIds": scheduled,
                    "code": "teacher_still_scheduled",
                })));
            }
            organisation.forget_teacher(teacher_id);
            Ok(())
        })
        .await?;

        self.mutate_teacher(teacher_id, |teacher| {
            teacher
                .remove_membership(organisation_id)
                .map(drop)
                .map_err(map_membership_error)
        })
        .await?;
        info!(
            organisation_id = %organisation_id,
            teacher_id = %teacher_id,
            "membership removed"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "timetable_service_tests.rs"]
mod tests;
