//! OpenAPI schema definitions for domain error types.
//!
//! Domain types stay framework-agnostic and never derive `ToSchema`. The
//! wrappers here mirror their JSON shape so the generated document can
//! reference them by their domain names.

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
///
/// Stable machine-readable error codes returned in API error responses.
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed or fails validation.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// No teacher is logged in, or the credentials were rejected.
    #[schema(rename = "unauthorized")]
    Unauthorized,
    /// The teacher lacks the permission the operation needs.
    #[schema(rename = "forbidden")]
    Forbidden,
    /// The organisation, classroom or teacher does not exist.
    #[schema(rename = "not_found")]
    NotFound,
    /// A duplicate id or a lost optimistic-concurrency race.
    #[schema(rename = "conflict")]
    Conflict,
    /// A backing store is unreachable.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    /// An unexpected error occurred on the server.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
///
/// `details.code` narrows the top-level code, for example
/// `unteachable_subject` or `revision_mismatch`, and `details.field` names
/// the offending request field when there is one.
#[derive(ToSchema)]
#[schema(as = crate::domain::Error, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorSchema {
    /// Stable machine-readable error code.
    #[schema(example = "invalid_request")]
    code: ErrorCodeSchema,
    /// Human-readable message returned to clients.
    #[schema(example = "subject Physics is not taught by any teacher in the cell")]
    message: String,
    /// Correlation identifier echoed in the `Trace-Id` header.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
    /// Supplementary error details for clients.
    details: Option<serde_json::Value>,
}
