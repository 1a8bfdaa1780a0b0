//! PostgreSQL-backed `OrganisationRepository`.
//!
//! Each organisation is one row: the whole aggregate (shape, roster,
//! classrooms and grids) lives in the `document` JSONB column and the
//! `revision` column guards conditional updates.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::warn;

use crate::domain::ports::{OrganisationRepository, OrganisationRepositoryError};
use crate::domain::{Organisation, OrganisationId};

use super::error_mapping::{
    StoreFailure, classify, pool_message, revision_from_db, revision_to_db,
};
use super::models::{NewOrganisationRow, OrganisationRow, OrganisationUpdate};
use super::pool::{DbPool, PoolError};
use super::schema::organisations;

/// Diesel implementation of the organisation port.
#[derive(Clone)]
pub struct DieselOrganisationRepository {
    pool: DbPool,
}

impl DieselOrganisationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> OrganisationRepositoryError {
    OrganisationRepositoryError::connection(pool_message(error))
}

fn map_diesel_error(
    error: diesel::result::Error,
    organisation_id: &OrganisationId,
) -> OrganisationRepositoryError {
    match classify(error) {
        StoreFailure::Connection(message) => OrganisationRepositoryError::connection(message),
        StoreFailure::UniqueViolation { .. } => {
            OrganisationRepositoryError::duplicate(organisation_id.as_str())
        }
        StoreFailure::Query(message) => OrganisationRepositoryError::query(message),
    }
}

fn encode(organisation: &Organisation) -> Result<serde_json::Value, OrganisationRepositoryError> {
    serde_json::to_value(organisation).map_err(|err| {
        OrganisationRepositoryError::query(format!("serialise organisation document: {err}"))
    })
}

fn admin_ref_to_db(organisation: &Organisation) -> Result<i64, OrganisationRepositoryError> {
    i64::try_from(organisation.admin_ref.get())
        .map_err(|_| OrganisationRepositoryError::query("admin id exceeds column range"))
}

/// Decode a row; the column revision wins over any copy in the document.
fn row_to_organisation(row: OrganisationRow) -> Result<Organisation, OrganisationRepositoryError> {
    let mut organisation: Organisation = serde_json::from_value(row.document).map_err(|err| {
        OrganisationRepositoryError::query(format!(
            "decode organisation document {}: {err}",
            row.id
        ))
    })?;
    organisation.revision =
        revision_from_db(row.revision).map_err(OrganisationRepositoryError::query)?;
    if !organisation.is_consistent() {
        warn!(
            organisation_id = %organisation.organisation_id,
            "stored organisation has classroom grids that do not match its shape"
        );
    }
    Ok(organisation)
}

#[async_trait]
impl OrganisationRepository for DieselOrganisationRepository {
    async fn find(
        &self,
        organisation_id: &OrganisationId,
    ) -> Result<Option<Organisation>, OrganisationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<OrganisationRow> = organisations::table
            .filter(organisations::id.eq(organisation_id.as_str()))
            .select(OrganisationRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, organisation_id))?;
        row.map(row_to_organisation).transpose()
    }

    async fn list(&self) -> Result<Vec<Organisation>, OrganisationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<OrganisationRow> = organisations::table
            .order(organisations::id.asc())
            .select(OrganisationRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|err| match classify(err) {
                StoreFailure::Connection(message) => {
                    OrganisationRepositoryError::connection(message)
                }
                StoreFailure::Query(message) => OrganisationRepositoryError::query(message),
                StoreFailure::UniqueViolation { .. } => {
                    OrganisationRepositoryError::query("unexpected unique violation on read")
                }
            })?;
        rows.into_iter().map(row_to_organisation).collect()
    }

    async fn save(
        &self,
        organisation: &Organisation,
        expected_revision: Option<u32>,
    ) -> Result<(), OrganisationRepositoryError> {
        let organisation_id = &organisation.organisation_id;
        let document = encode(organisation)?;
        let revision =
            revision_to_db(organisation.revision).map_err(OrganisationRepositoryError::query)?;
        let admin_ref = admin_ref_to_db(organisation)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let Some(expected) = expected_revision else {
            let row = NewOrganisationRow {
                id: organisation_id.as_str(),
                name: &organisation.name,
                admin_ref,
                document: &document,
                revision,
            };
            return diesel::insert_into(organisations::table)
                .values(&row)
                .execute(&mut conn)
                .await
                .map(drop)
                .map_err(|err| map_diesel_error(err, organisation_id));
        };

        let expected_db = revision_to_db(expected).map_err(OrganisationRepositoryError::query)?;
        let update = OrganisationUpdate {
            name: &organisation.name,
            admin_ref,
            document: &document,
            revision,
        };
        let updated = diesel::update(organisations::table)
            .filter(
                organisations::id
                    .eq(organisation_id.as_str())
                    .and(organisations::revision.eq(expected_db)),
            )
            .set(&update)
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, organisation_id))?;
        if updated > 0 {
            return Ok(());
        }

        let current: Option<i32> = organisations::table
            .filter(organisations::id.eq(organisation_id.as_str()))
            .select(organisations::revision)
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, organisation_id))?;
        match current {
            Some(actual) => Err(OrganisationRepositoryError::revision_mismatch(
                expected,
                revision_from_db(actual).map_err(OrganisationRepositoryError::query)?,
            )),
            None => Err(OrganisationRepositoryError::missing(organisation_id.as_str())),
        }
    }

    async fn delete(
        &self,
        organisation_id: &OrganisationId,
    ) -> Result<bool, OrganisationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(
            organisations::table.filter(organisations::id.eq(organisation_id.as_str())),
        )
        .execute(&mut conn)
        .await
        .map_err(|err| map_diesel_error(err, organisation_id))?;
        Ok(deleted > 0)
    }
}
