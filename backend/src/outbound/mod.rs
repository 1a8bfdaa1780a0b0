//! Outbound adapters implementing the domain ports.
//!
//! - **persistence**: PostgreSQL repositories using Diesel
//! - **memory**: in-process repositories for database-less runs and tests
//! - **access**: permission resolution over the stored memberships
//!
//! Adapters translate between domain types and storage representations and
//! contain no business logic.

pub mod access;
pub mod memory;
pub mod persistence;
