//! PostgreSQL persistence adapters using Diesel.
//!
//! Repositories translate between row structs and domain aggregates and
//! contain no business rules. Row structs (`models.rs`) and table
//! definitions (`schema.rs`) stay private to this module. Connections come
//! from a `bb8` pool over `diesel-async`.
//!
//! ```ignore
//! use timetable::outbound::persistence::{DbPool, DieselOrganisationRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/timetable")).await?;
//! let organisations = DieselOrganisationRepository::new(pool);
//! ```

mod diesel_organisation_repository;
mod diesel_teacher_repository;
mod error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_organisation_repository::DieselOrganisationRepository;
pub use diesel_teacher_repository::DieselTeacherRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
