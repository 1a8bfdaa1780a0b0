//! Diesel table definitions.
//!
//! Must match `backend/migrations`. Regenerate with `diesel print-schema`
//! after changing a migration.

diesel::table! {
    /// Teacher accounts with their memberships embedded as JSONB.
    teachers (id) {
        id -> Int8,
        name -> Text,
        email -> Text,
        is_active -> Bool,
        global_permissions -> Jsonb,
        memberships -> Jsonb,
        /// Denormalised membership keys for organisation lookups.
        organisation_ids -> Array<Text>,
        revision -> Int4,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Organisation aggregates stored as one document per row.
    organisations (id) {
        id -> Text,
        name -> Text,
        admin_ref -> Int8,
        document -> Jsonb,
        revision -> Int4,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(organisations, teachers);
