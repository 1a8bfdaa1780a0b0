//! School timetable service.
//!
//! Organisations own a days-by-periods grid shape shared by their
//! classrooms; each classroom stores one flattened grid of cells assigning
//! teachers and subjects. Teachers join organisations through memberships,
//! and a teacher's personal schedule is derived on demand from every grid.
//!
//! Layout follows ports and adapters: [`domain`] holds the model, services
//! and ports; [`inbound`] exposes them over HTTP; [`outbound`] stores them in
//! memory or PostgreSQL.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
