//! Internal Diesel row structs.
//!
//! Implementation details of the persistence layer; never exposed to the
//! domain.

use diesel::prelude::*;

use super::schema::{organisations, teachers};

/// Row read from the organisations table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = organisations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct OrganisationRow {
    pub id: String,
    pub document: serde_json::Value,
    pub revision: i32,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = organisations)]
pub(crate) struct NewOrganisationRow<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub admin_ref: i64,
    pub document: &'a serde_json::Value,
    pub revision: i32,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = organisations)]
pub(crate) struct OrganisationUpdate<'a> {
    pub name: &'a str,
    pub admin_ref: i64,
    pub document: &'a serde_json::Value,
    pub revision: i32,
}

/// Row read from the teachers table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = teachers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TeacherRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub is_active: bool,
    pub global_permissions: serde_json::Value,
    pub memberships: serde_json::Value,
    pub revision: i32,
}

/// Insert payload; the id comes from the `BIGSERIAL` sequence.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = teachers)]
pub(crate) struct NewTeacherRow<'a> {
    pub name: &'a str,
    pub email: &'a str,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = teachers)]
pub(crate) struct TeacherUpdate<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub is_active: bool,
    pub global_permissions: &'a serde_json::Value,
    pub memberships: &'a serde_json::Value,
    pub organisation_ids: &'a [String],
    pub revision: i32,
}
