//! In-memory teacher store with sequential id allocation.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::ports::{TeacherRepository, TeacherRepositoryError};
use crate::domain::{NewTeacher, OrganisationId, Teacher, TeacherId};

#[derive(Debug, Default)]
struct TeacherTable {
    rows: BTreeMap<TeacherId, Teacher>,
    last_id: u64,
}

impl TeacherTable {
    fn email_taken_by_other(&self, email: &str, id: Option<TeacherId>) -> bool {
        self.rows
            .values()
            .any(|teacher| teacher.email == email && Some(teacher.id) != id)
    }
}

/// Teachers keyed by id; ids start at 1.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTeacherRepository {
    table: Arc<RwLock<TeacherTable>>,
}

impl InMemoryTeacherRepository {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TeacherRepository for InMemoryTeacherRepository {
    async fn find(&self, teacher_id: TeacherId) -> Result<Option<Teacher>, TeacherRepositoryError> {
        Ok(self.table.read().await.rows.get(&teacher_id).cloned())
    }

    async fn find_many(
        &self,
        teacher_ids: &[TeacherId],
    ) -> Result<Vec<Teacher>, TeacherRepositoryError> {
        let table = self.table.read().await;
        let mut ids = teacher_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids
            .into_iter()
            .filter_map(|id| table.rows.get(&id).cloned())
            .collect())
    }

    async fn find_by_organisation(
        &self,
        organisation_id: &OrganisationId,
    ) -> Result<Vec<Teacher>, TeacherRepositoryError> {
        Ok(self
            .table
            .read()
            .await
            .rows
            .values()
            .filter(|teacher| teacher.membership(organisation_id).is_some())
            .cloned()
            .collect())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Teacher>, TeacherRepositoryError> {
        Ok(self
            .table
            .read()
            .await
            .rows
            .values()
            .find(|teacher| teacher.email == email)
            .cloned())
    }

    async fn insert(&self, teacher: NewTeacher) -> Result<Teacher, TeacherRepositoryError> {
        let mut table = self.table.write().await;
        if table.email_taken_by_other(teacher.email(), None) {
            return Err(TeacherRepositoryError::duplicate_email(teacher.email()));
        }
        let next = table
            .last_id
            .checked_add(1)
            .ok_or_else(|| TeacherRepositoryError::query("teacher id space exhausted"))?;
        table.last_id = next;
        let stored = teacher.into_teacher(TeacherId::new(next));
        table.rows.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn save(
        &self,
        teacher: &Teacher,
        expected_revision: u32,
    ) -> Result<(), TeacherRepositoryError> {
        let mut table = self.table.write().await;
        let Some(current) = table.rows.get(&teacher.id) else {
            return Err(TeacherRepositoryError::missing(teacher.id.get()));
        };
        if current.revision != expected_revision {
            return Err(TeacherRepositoryError::revision_mismatch(
                expected_revision,
                current.revision,
            ));
        }
        if table.email_taken_by_other(&teacher.email, Some(teacher.id)) {
            return Err(TeacherRepositoryError::duplicate_email(teacher.email.as_str()));
        }
        table.rows.insert(teacher.id, teacher.clone());
        Ok(())
    }
}
