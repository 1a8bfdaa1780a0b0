//! Port answering "may this teacher do that in this organisation?".
//!
//! Services consult the policy before they load the target organisation, so a
//! denial looks the same whether or not the organisation exists. An actor the
//! policy does allow goes on to the load and gets a not-found error there.

use async_trait::async_trait;

use crate::domain::{Action, OrganisationId, TeacherId};

use super::define_port_error;

define_port_error! {
    /// Errors raised while resolving permissions.
    pub enum AccessPolicyError {
        /// Backing store could not be reached.
        Connection { message: String } =>
            "access policy connection failed: {message}",
        /// Lookup failed during execution.
        Query { message: String } =>
            "access policy query failed: {message}",
    }
}

/// Capability lookup consulted by every guarded operation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccessPolicy: Send + Sync {
    /// Whether `actor` may perform `action` in `organisation_id`.
    ///
    /// Unknown actors yield `Ok(false)`. An unknown organisation yields
    /// `Ok(false)` unless the actor's global or membership flags already
    /// grant `action`.
    async fn has_permission(
        &self,
        actor: TeacherId,
        organisation_id: &OrganisationId,
        action: Action,
    ) -> Result<bool, AccessPolicyError>;
}
