//! Driving port for establishing a session.
//!
//! Inbound adapters hand the submitted credentials to this port and store the
//! returned teacher id in the session. Handler tests substitute a double
//! instead of wiring persistence.

use async_trait::async_trait;

use crate::domain::{Error, TeacherId, TeacherValidationError, normalise_email};

/// Credentials submitted at login: a teacher id and its email address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    teacher_id: TeacherId,
    email: String,
}

impl LoginCredentials {
    /// Normalise the email and pair it with the id.
    ///
    /// # Examples
    /// ```
    /// use timetable::domain::ports::LoginCredentials;
    /// use timetable::domain::TeacherId;
    ///
    /// let creds = LoginCredentials::try_from_parts(TeacherId::new(3), " Ada@School.Test ")
    ///     .expect("valid credentials");
    /// assert_eq!(creds.email(), "ada@school.test");
    /// ```
    pub fn try_from_parts(
        teacher_id: TeacherId,
        email: &str,
    ) -> Result<Self, TeacherValidationError> {
        Ok(Self {
            teacher_id,
            email: normalise_email(email)?,
        })
    }

    #[must_use]
    pub fn teacher_id(&self) -> TeacherId {
        self.teacher_id
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }
}

/// Domain use-case port for authentication.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Validate credentials and return the authenticated teacher id.
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<TeacherId, Error>;
}
