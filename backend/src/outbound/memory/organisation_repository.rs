//! In-memory organisation store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::ports::{OrganisationRepository, OrganisationRepositoryError};
use crate::domain::{Organisation, OrganisationId};

/// Organisation aggregates keyed by id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrganisationRepository {
    organisations: Arc<RwLock<HashMap<OrganisationId, Organisation>>>,
}

impl InMemoryOrganisationRepository {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrganisationRepository for InMemoryOrganisationRepository {
    async fn find(
        &self,
        organisation_id: &OrganisationId,
    ) -> Result<Option<Organisation>, OrganisationRepositoryError> {
        Ok(self.organisations.read().await.get(organisation_id).cloned())
    }

    async fn list(&self) -> Result<Vec<Organisation>, OrganisationRepositoryError> {
        let mut listed: Vec<Organisation> =
            self.organisations.read().await.values().cloned().collect();
        listed.sort_by(|a, b| a.organisation_id.cmp(&b.organisation_id));
        Ok(listed)
    }

    async fn save(
        &self,
        organisation: &Organisation,
        expected_revision: Option<u32>,
    ) -> Result<(), OrganisationRepositoryError> {
        let mut organisations = self.organisations.write().await;
        let stored = organisations.get(&organisation.organisation_id);
        match (expected_revision, stored) {
            (None, Some(_)) => {
                return Err(OrganisationRepositoryError::duplicate(
                    organisation.organisation_id.as_str(),
                ));
            }
            (Some(_), None) => {
                return Err(OrganisationRepositoryError::missing(
                    organisation.organisation_id.as_str(),
                ));
            }
            (Some(expected), Some(current)) if current.revision != expected => {
                return Err(OrganisationRepositoryError::revision_mismatch(
                    expected,
                    current.revision,
                ));
            }
            _ => {}
        }
        organisations.insert(organisation.organisation_id.clone(), organisation.clone());
        Ok(())
    }

    async fn delete(
        &self,
        organisation_id: &OrganisationId,
    ) -> Result<bool, OrganisationRepositoryError> {
        Ok(self
            .organisations
            .write()
            .await
            .remove(organisation_id)
            .is_some())
    }
}
