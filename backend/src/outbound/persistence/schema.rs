//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly; regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Local user accounts, one per host identity.
    users (id) {
        id -> Uuid,
        /// Host platform identifier; unique.
        external_id -> Varchar,
        display_name -> Varchar,
        username -> Nullable<Varchar>,
        /// `buyer`, `seller`, or `both`.
        role -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Published items and their gated booking codes.
    items (id) {
        id -> Uuid,
        seller_id -> Uuid,
        title -> Varchar,
        /// Minor currency units.
        price -> Int8,
        booking_code -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Purchase ledger.
    ///
    /// `payment_reference` is unique, and a partial unique index allows one
    /// pending or completed row per `(buyer_id, item_id)`.
    purchases (id) {
        id -> Uuid,
        item_id -> Uuid,
        buyer_id -> Uuid,
        payment_reference -> Varchar,
        /// `pending`, `completed`, or `failed`.
        status -> Varchar,
        amount_expected -> Int8,
        created_at -> Timestamptz,
        completed_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Seller profiles keyed by owning user.
    seller_profiles (user_id) {
        user_id -> Uuid,
        display_name -> Varchar,
        bio -> Nullable<Varchar>,
        photo_url -> Nullable<Text>,
        is_approved -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(items -> users (seller_id));
diesel::joinable!(purchases -> items (item_id));
diesel::joinable!(seller_profiles -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(users, items, purchases, seller_profiles);
