//! Internal Diesel row structs for database operations.
//!
//! These types never leave the persistence layer; repositories convert them
//! to domain types and report malformed rows as query errors.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{items, purchases, seller_profiles, users};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub external_id: String,
    pub display_name: String,
    pub username: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub external_id: &'a str,
    pub display_name: &'a str,
    pub username: Option<&'a str>,
    pub role: &'a str,
    pub created_at: DateTime<Utc>,
}

/// Row struct for reading from the items table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ItemRow {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub title: String,
    pub price: i64,
    pub booking_code: String,
}

/// Row struct for reading from the purchases table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = purchases)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PurchaseRow {
    pub id: Uuid,
    pub item_id: Uuid,
    pub buyer_id: Uuid,
    pub payment_reference: String,
    pub status: String,
    pub amount_expected: i64,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Insertable struct for opening a purchase.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = purchases)]
pub(crate) struct NewPurchaseRow<'a> {
    pub id: Uuid,
    pub item_id: Uuid,
    pub buyer_id: Uuid,
    pub payment_reference: &'a str,
    pub status: &'a str,
    pub amount_expected: i64,
    pub created_at: DateTime<Utc>,
}

/// Row struct for reading from the seller_profiles table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = seller_profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SellerProfileRow {
    pub user_id: Uuid,
    pub display_name: String,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for upserting a seller profile.
///
/// `is_approved` is omitted so edits never change approval.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = seller_profiles)]
pub(crate) struct NewSellerProfileRow<'a> {
    pub user_id: Uuid,
    pub display_name: &'a str,
    pub bio: Option<&'a str>,
    pub photo_url: Option<&'a str>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
