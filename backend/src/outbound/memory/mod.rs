//! In-process repository adapters.
//!
//! Used when no database URL is configured and by HTTP tests. State lives in
//! `tokio::sync::RwLock`-guarded maps and disappears with the process. The
//! revision contract matches the PostgreSQL adapters.

mod organisation_repository;
mod teacher_repository;

pub use organisation_repository::InMemoryOrganisationRepository;
pub use teacher_repository::InMemoryTeacherRepository;
