//! Port for organisation aggregate persistence.
//!
//! An organisation is stored as a single document together with its
//! classrooms and their grids, so every write replaces the whole aggregate.
//! Writes are conditional on the revision observed when the aggregate was
//! read.

use async_trait::async_trait;

use crate::domain::{Organisation, OrganisationId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by organisation repository adapters.
    pub enum OrganisationRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "organisation repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "organisation repository query failed: {message}",
        /// Optimistic concurrency check failed.
        RevisionMismatch { expected: u32, actual: u32 } =>
            "revision mismatch: expected {expected}, found {actual}",
        /// An insert collided with an existing organisation.
        Duplicate { organisation_id: String } =>
            "organisation {organisation_id} already exists",
        /// A conditional update targeted an organisation that no longer exists.
        Missing { organisation_id: String } =>
            "organisation {organisation_id} does not exist",
    }
}

/// Port for reading and conditionally writing organisation aggregates.
///
/// # Revision Semantics
///
/// - New organisations start at revision 1.
/// - The caller sets `organisation.revision` to the new value before saving;
///   the repository never increments it.
/// - `save(organisation, None)` inserts and fails with
///   [`OrganisationRepositoryError::Duplicate`] if the id is taken.
/// - `save(organisation, Some(n))` replaces the stored aggregate only if its
///   revision is still `n`, otherwise it fails with
///   [`OrganisationRepositoryError::RevisionMismatch`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrganisationRepository: Send + Sync {
    /// Fetch an organisation with all its classrooms.
    async fn find(
        &self,
        organisation_id: &OrganisationId,
    ) -> Result<Option<Organisation>, OrganisationRepositoryError>;

    /// Every stored organisation, ordered by id.
    async fn list(&self) -> Result<Vec<Organisation>, OrganisationRepositoryError>;

    /// Insert or conditionally replace an organisation.
    async fn save(
        &self,
        organisation: &Organisation,
        expected_revision: Option<u32>,
    ) -> Result<(), OrganisationRepositoryError>;

    /// Remove an organisation and everything it embeds.
    ///
    /// Returns `false` when nothing was stored under the id.
    async fn delete(
        &self,
        organisation_id: &OrganisationId,
    ) -> Result<bool, OrganisationRepositoryError>;
}
