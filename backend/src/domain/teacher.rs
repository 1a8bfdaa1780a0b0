//! Teachers and their per-organisation memberships.
//!
//! A teacher is a standalone entity; membership in an organisation is a value
//! object embedded in the teacher. A teacher with no memberships is still a
//! valid, addressable record.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::permission::{Action, GlobalPermissions, MembershipPermissions};
use super::OrganisationId;

/// Global numeric teacher identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TeacherId(u64);

impl TeacherId {
    /// Wrap a raw identifier.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TeacherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TeacherId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Failures raised while constructing teachers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TeacherValidationError {
    /// The name is blank once trimmed.
    #[error("teacher name must not be empty")]
    EmptyName,
    /// The email address is not plausibly an address.
    #[error("teacher email is not valid: {0}")]
    InvalidEmail(String),
}

/// Failures raised by membership bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MembershipError {
    /// A membership needs at least one subject.
    #[error("membership requires at least one subject")]
    EmptySubjects,
    /// A membership needs at least one class.
    #[error("membership requires at least one class")]
    EmptyClasses,
    /// The teacher already belongs to the organisation.
    #[error("teacher {teacher_id} is already a member of {organisation_id}")]
    Duplicate {
        teacher_id: TeacherId,
        organisation_id: OrganisationId,
    },
    /// The teacher has no membership in the organisation.
    #[error("teacher {teacher_id} is not a member of {organisation_id}")]
    NotAMember {
        teacher_id: TeacherId,
        organisation_id: OrganisationId,
    },
}

fn normalise_names<I>(values: I) -> BTreeSet<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    values
        .into_iter()
        .map(|value| value.as_ref().trim().to_owned())
        .filter(|value| !value.is_empty())
        .collect()
}

/// A teacher's subjects, classes and permissions inside one organisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherMembership {
    organisation_id: OrganisationId,
    subjects: BTreeSet<String>,
    classes: BTreeSet<String>,
    permissions: MembershipPermissions,
    is_active: bool,
    joined_at: DateTime<Utc>,
}

impl TeacherMembership {
    /// Build an active membership.
    ///
    /// Subject and class names are trimmed; blank entries are discarded
    /// before the non-empty checks run.
    pub fn new<S, C>(
        organisation_id: OrganisationId,
        subjects: S,
        classes: C,
        permissions: MembershipPermissions,
        joined_at: DateTime<Utc>,
    ) -> Result<Self, MembershipError>
    where
        S: IntoIterator,
        S::Item: AsRef<str>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        let subjects = normalise_names(subjects);
        let classes = normalise_names(classes);
        if subjects.is_empty() {
            return Err(MembershipError::EmptySubjects);
        }
        if classes.is_empty() {
            return Err(MembershipError::EmptyClasses);
        }
        Ok(Self {
            organisation_id,
            subjects,
            classes,
            permissions,
            is_active: true,
            joined_at,
        })
    }

    /// Organisation this membership belongs to.
    #[must_use]
    pub fn organisation_id(&self) -> &OrganisationId {
        &self.organisation_id
    }

    /// Subjects the teacher may teach in this organisation.
    #[must_use]
    pub fn subjects(&self) -> &BTreeSet<String> {
        &self.subjects
    }

    /// Classes the teacher covers in this organisation.
    #[must_use]
    pub fn classes(&self) -> &BTreeSet<String> {
        &self.classes
    }

    /// Permission flags.
    #[must_use]
    pub fn permissions(&self) -> MembershipPermissions {
        self.permissions
    }

    /// Whether the membership is currently active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// When the teacher joined.
    #[must_use]
    pub fn joined_at(&self) -> DateTime<Utc> {
        self.joined_at
    }

    /// Whether `subject` is in this membership's subject list.
    #[must_use]
    pub fn teaches(&self, subject: &str) -> bool {
        self.subjects.contains(subject)
    }

    /// Replace the subject and class lists, keeping both non-empty.
    pub fn replace_assignments<S, C>(
        &mut self,
        subjects: S,
        classes: C,
    ) -> Result<(), MembershipError>
    where
        S: IntoIterator,
        S::Item: AsRef<str>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        let subjects = normalise_names(subjects);
        let classes = normalise_names(classes);
        if subjects.is_empty() {
            return Err(MembershipError::EmptySubjects);
        }
        if classes.is_empty() {
            return Err(MembershipError::EmptyClasses);
        }
        self.subjects = subjects;
        self.classes = classes;
        Ok(())
    }

    /// Replace the permission flags.
    pub fn set_permissions(&mut self, permissions: MembershipPermissions) {
        self.permissions = permissions;
    }

    /// Activate or suspend the membership.
    pub fn set_active(&mut self, is_active: bool) {
        self.is_active = is_active;
    }
}

/// A teacher record with its memberships.
///
/// ## Invariants
/// - At most one membership per organisation.
/// - `name` is non-empty; `email` is trimmed and lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: TeacherId,
    pub name: String,
    pub email: String,
    pub global_permissions: GlobalPermissions,
    pub is_active: bool,
    memberships: Vec<TeacherMembership>,
    /// Optimistic-concurrency revision, starting at 1.
    pub revision: u32,
}

/// Validated registration details for a new teacher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTeacher {
    name: String,
    email: String,
}

impl NewTeacher {
    /// Validate a name and email address.
    ///
    /// # Examples
    /// ```
    /// use timetable::domain::NewTeacher;
    ///
    /// let draft = NewTeacher::try_new(" Ada ", "Ada@Example.org").expect("valid");
    /// assert_eq!(draft.name(), "Ada");
    /// assert_eq!(draft.email(), "ada@example.org");
    /// assert!(NewTeacher::try_new("Ada", "not-an-email").is_err());
    /// ```
    pub fn try_new(
        name: impl AsRef<str>,
        email: impl AsRef<str>,
    ) -> Result<Self, TeacherValidationError> {
        let name = name.as_ref().trim();
        if name.is_empty() {
            return Err(TeacherValidationError::EmptyName);
        }
        let email = normalise_email(email.as_ref())?;
        Ok(Self {
            name: name.to_owned(),
            email,
        })
    }

    /// Trimmed display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Normalised email address.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Materialise the teacher once an id has been allocated.
    #[must_use]
    pub fn into_teacher(self, id: TeacherId) -> Teacher {
        Teacher {
            id,
            name: self.name,
            email: self.email,
            global_permissions: GlobalPermissions::default(),
            is_active: true,
            memberships: Vec::new(),
            revision: 1,
        }
    }
}

/// Trim, lower-case and sanity-check an email address.
pub fn normalise_email(raw: &str) -> Result<String, TeacherValidationError> {
    let email = raw.trim().to_lowercase();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
                && !domain.ends_with('.')
        });
    if valid && !email.contains(char::is_whitespace) {
        Ok(email)
    } else {
        Err(TeacherValidationError::InvalidEmail(raw.trim().to_owned()))
    }
}

impl Teacher {
    /// All memberships in insertion order.
    #[must_use]
    pub fn memberships(&self) -> &[TeacherMembership] {
        &self.memberships
    }

    /// Membership for `organisation_id`, active or not.
    #[must_use]
    pub fn membership(&self, organisation_id: &OrganisationId) -> Option<&TeacherMembership> {
        self.memberships
            .iter()
            .find(|membership| membership.organisation_id() == organisation_id)
    }

    /// Mutable membership for `organisation_id`.
    pub fn membership_mut(
        &mut self,
        organisation_id: &OrganisationId,
    ) -> Option<&mut TeacherMembership> {
        self.memberships
            .iter_mut()
            .find(|membership| membership.organisation_id() == organisation_id)
    }

    /// Membership for `organisation_id` when both it and the teacher are active.
    #[must_use]
    pub fn active_membership(
        &self,
        organisation_id: &OrganisationId,
    ) -> Option<&TeacherMembership> {
        if !self.is_active {
            return None;
        }
        self.membership(organisation_id)
            .filter(|membership| membership.is_active())
    }

    /// Attach a membership, refusing a second one for the same organisation.
    pub fn add_membership(&mut self, membership: TeacherMembership) -> Result<(), MembershipError> {
        if self.membership(membership.organisation_id()).is_some() {
            return Err(MembershipError::Duplicate {
                teacher_id: self.id,
                organisation_id: membership.organisation_id().clone(),
            });
        }
        self.memberships.push(membership);
        Ok(())
    }

    /// Detach and return the membership for `organisation_id`.
    pub fn remove_membership(
        &mut self,
        organisation_id: &OrganisationId,
    ) -> Result<TeacherMembership, MembershipError> {
        let position = self
            .memberships
            .iter()
            .position(|membership| membership.organisation_id() == organisation_id)
            .ok_or_else(|| MembershipError::NotAMember {
                teacher_id: self.id,
                organisation_id: organisation_id.clone(),
            })?;
        Ok(self.memberships.remove(position))
    }

    /// Whether this teacher may perform `action` in `organisation_id`,
    /// ignoring organisation ownership.
    #[must_use]
    pub fn allows(&self, organisation_id: &OrganisationId, action: Action) -> bool {
        if !self.is_active {
            return false;
        }
        self.global_permissions.allows(action)
            || self
                .active_membership(organisation_id)
                .is_some_and(|membership| membership.permissions().allows(action))
    }
}
