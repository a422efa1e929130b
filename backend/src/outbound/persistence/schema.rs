//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. They are used
//! by Diesel for compile-time query validation and type-safe SQL generation.
//!
//! # Maintenance
//!
//! When migrations change the schema, this file should be regenerated or
//! manually updated to reflect those changes. The `diesel print-schema`
//! command can generate these definitions from a live database.

diesel::table! {
    /// Catalogued titles and their copy counters.
    ///
    /// `0 <= available_copies <= total_copies` is enforced by a check
    /// constraint.
    titles (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Display name.
        name -> Text,
        author -> Nullable<Text>,
        publisher -> Nullable<Text>,
        /// ISBN or local identifier code.
        isbn -> Nullable<Text>,
        category -> Nullable<Text>,
        /// Copies owned.
        total_copies -> Int4,
        /// Copies on the shelf.
        available_copies -> Int4,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Loan ledger. Rows are never deleted.
    ///
    /// A partial unique index allows one `active` row per
    /// `(user_id, title_id)`.
    loans (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Borrower. Not a foreign key; sessions carry the id.
        user_id -> Uuid,
        /// Borrowed title (FK to titles, restrict on delete).
        title_id -> Uuid,
        /// `active` or `returned`.
        status -> Text,
        borrowed_at -> Timestamptz,
        due_at -> Timestamptz,
        /// Set exactly when status is `returned`.
        returned_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Member accounts. `username` is unique (`users_username_key`).
    users (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Trimmed login name.
        username -> Text,
        /// Encoded salted digest.
        password_hash -> Text,
        /// `STUDENT`, `TEACHER` or `ADMIN`.
        role -> Text,
        contact -> Nullable<Text>,
        registered_at -> Timestamptz,
    }
}

diesel::joinable!(loans -> titles (title_id));

diesel::allow_tables_to_appear_in_same_query!(loans, titles, users);
