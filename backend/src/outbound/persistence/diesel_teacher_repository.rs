//! PostgreSQL-backed `TeacherRepository`.
//!
//! Ids come from the `teachers.id` sequence. Memberships are a JSONB array;
//! `organisation_ids` mirrors their keys so organisation lookups can use the
//! GIN index. Rows are rebuilt through the domain constructors, so a row that
//! no longer satisfies the teacher invariants surfaces as a query error.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{TeacherRepository, TeacherRepositoryError};
use crate::domain::{
    GlobalPermissions, NewTeacher, OrganisationId, Teacher, TeacherId, TeacherMembership,
};

use super::error_mapping::{
    StoreFailure, classify, pool_message, revision_from_db, revision_to_db,
};
use super::models::{NewTeacherRow, TeacherRow, TeacherUpdate};
use super::pool::{DbPool, PoolError};
use super::schema::teachers;

/// Diesel implementation of the teacher port.
#[derive(Clone)]
pub struct DieselTeacherRepository {
    pool: DbPool,
}

impl DieselTeacherRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> TeacherRepositoryError {
    TeacherRepositoryError::connection(pool_message(error))
}

/// `email` names the address involved when a unique violation is possible.
fn map_diesel_error(error: diesel::result::Error, email: Option<&str>) -> TeacherRepositoryError {
    match (classify(error), email) {
        (StoreFailure::Connection(message), _) => TeacherRepositoryError::connection(message),
        (StoreFailure::UniqueViolation { .. }, Some(email)) => {
            TeacherRepositoryError::duplicate_email(email)
        }
        (StoreFailure::UniqueViolation { constraint }, None) => {
            let constraint = constraint.as_deref().unwrap_or("teachers");
            TeacherRepositoryError::query(format!("unexpected unique violation on {constraint}"))
        }
        (StoreFailure::Query(message), _) => TeacherRepositoryError::query(message),
    }
}

fn id_to_db(teacher_id: TeacherId) -> Result<i64, TeacherRepositoryError> {
    i64::try_from(teacher_id.get())
        .map_err(|_| TeacherRepositoryError::query("teacher id exceeds column range"))
}

fn row_to_teacher(row: TeacherRow) -> Result<Teacher, TeacherRepositoryError> {
    let TeacherRow {
        id,
        name,
        email,
        is_active,
        global_permissions,
        memberships,
        revision,
    } = row;
    let id = u64::try_from(id).map_err(|_| {
        TeacherRepositoryError::query(format!("stored teacher id {id} is negative"))
    })?;
    let decode_error = |what: &str, err: serde_json::Error| {
        TeacherRepositoryError::query(format!("decode {what} for teacher {id}: {err}"))
    };
    let global_permissions: GlobalPermissions = serde_json::from_value(global_permissions)
        .map_err(|err| decode_error("global permissions", err))?;
    let memberships: Vec<TeacherMembership> =
        serde_json::from_value(memberships).map_err(|err| decode_error("memberships", err))?;

    let mut teacher = NewTeacher::try_new(name, email)
        .map_err(|err| TeacherRepositoryError::query(err.to_string()))?
        .into_teacher(TeacherId::new(id));
    teacher.is_active = is_active;
    teacher.global_permissions = global_permissions;
    teacher.revision = revision_from_db(revision).map_err(TeacherRepositoryError::query)?;
    for membership in memberships {
        teacher
            .add_membership(membership)
            .map_err(|err| TeacherRepositoryError::query(err.to_string()))?;
    }
    Ok(teacher)
}

fn rows_to_teachers(rows: Vec<TeacherRow>) -> Result<Vec<Teacher>, TeacherRepositoryError> {
    rows.into_iter().map(row_to_teacher).collect()
}

fn organisation_keys(teacher: &Teacher) -> Vec<String> {
    teacher
        .memberships()
        .iter()
        .map(|membership| membership.organisation_id().to_string())
        .collect()
}

#[async_trait]
impl TeacherRepository for DieselTeacherRepository {
    async fn find(&self, teacher_id: TeacherId) -> Result<Option<Teacher>, TeacherRepositoryError> {
        let id = id_to_db(teacher_id)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<TeacherRow> = teachers::table
            .filter(teachers::id.eq(id))
            .select(TeacherRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, None))?;
        row.map(row_to_teacher).transpose()
    }

    async fn find_many(
        &self,
        teacher_ids: &[TeacherId],
    ) -> Result<Vec<Teacher>, TeacherRepositoryError> {
        if teacher_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = teacher_ids
            .iter()
            .copied()
            .map(id_to_db)
            .collect::<Result<Vec<_>, _>>()?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<TeacherRow> = teachers::table
            .filter(teachers::id.eq_any(ids))
            .order(teachers::id.asc())
            .select(TeacherRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, None))?;
        rows_to_teachers(rows)
    }

    async fn find_by_organisation(
        &self,
        organisation_id: &OrganisationId,
    ) -> Result<Vec<Teacher>, TeacherRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<TeacherRow> = teachers::table
            .filter(
                teachers::organisation_ids.contains(vec![organisation_id.as_str().to_owned()]),
            )
            .order(teachers::id.asc())
            .select(TeacherRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, None))?;
        rows_to_teachers(rows)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Teacher>, TeacherRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<TeacherRow> = teachers::table
            .filter(teachers::email.eq(email))
            .select(TeacherRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, None))?;
        row.map(row_to_teacher).transpose()
    }

    async fn insert(&self, teacher: NewTeacher) -> Result<Teacher, TeacherRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewTeacherRow {
            name: teacher.name(),
            email: teacher.email(),
        };
        let stored: TeacherRow = diesel::insert_into(teachers::table)
            .values(&row)
            .returning(TeacherRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, Some(teacher.email())))?;
        row_to_teacher(stored)
    }

    async fn save(
        &self,
        teacher: &Teacher,
        expected_revision: u32,
    ) -> Result<(), TeacherRepositoryError> {
        let id = id_to_db(teacher.id)?;
        let encode_error = |err: serde_json::Error| {
            TeacherRepositoryError::query(format!("serialise teacher: {err}"))
        };
        let global_permissions =
            serde_json::to_value(teacher.global_permissions).map_err(encode_error)?;
        let memberships = serde_json::to_value(teacher.memberships()).map_err(encode_error)?;
        let organisation_ids = organisation_keys(teacher);
        let revision = revision_to_db(teacher.revision).map_err(TeacherRepositoryError::query)?;
        let expected = revision_to_db(expected_revision).map_err(TeacherRepositoryError::query)?;

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let update = TeacherUpdate {
            name: &teacher.name,
            email: &teacher.email,
            is_active: teacher.is_active,
            global_permissions: &global_permissions,
            memberships: &memberships,
            organisation_ids: &organisation_ids,
            revision,
        };
        let updated = diesel::update(teachers::table)
            .filter(teachers::id.eq(id).and(teachers::revision.eq(expected)))
            .set(&update)
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, Some(&teacher.email)))?;
        if updated > 0 {
            return Ok(());
        }

        let current: Option<i32> = teachers::table
            .filter(teachers::id.eq(id))
            .select(teachers::revision)
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, None))?;
        match current {
            Some(actual) => Err(TeacherRepositoryError::revision_mismatch(
                expected_revision,
                revision_from_db(actual).map_err(TeacherRepositoryError::query)?,
            )),
            None => Err(TeacherRepositoryError::missing(teacher.id.get())),
        }
    }
}
