//! Driving ports for teacher registration and lookup.

use async_trait::async_trait;

use crate::domain::{Error, Teacher, TeacherId};

/// Request to register a new teacher account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterTeacherRequest {
    pub name: String,
    pub email: String,
}

/// Domain use-case port for creating teachers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TeacherCommand: Send + Sync {
    /// Validate and store a teacher, allocating its id.
    async fn register(&self, request: RegisterTeacherRequest) -> Result<Teacher, Error>;
}

/// Domain use-case port for reading teachers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TeacherQuery: Send + Sync {
    /// Fetch a teacher visible to `actor`.
    ///
    /// Actors see themselves and anyone sharing an organisation in which
    /// they hold `view`.
    async fn get_teacher(&self, actor: TeacherId, teacher_id: TeacherId) -> Result<Teacher, Error>;
}
