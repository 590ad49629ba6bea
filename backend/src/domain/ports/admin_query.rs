//! Driving port for administrator listings.

use async_trait::async_trait;

use crate::domain::{Error, ExternalId, Purchase, SellerProfile};

/// Number of purchases returned by [`AdminQuery::list_purchases`].
pub const ADMIN_PURCHASE_LIMIT: u32 = 30;

/// Number of profiles returned by [`AdminQuery::list_sellers`].
pub const ADMIN_SELLER_LIMIT: u32 = 200;

/// Read-only views over every seller and purchase.
///
/// Both operations reject callers outside the administrator allow-list with
/// `forbidden` and reason `not_admin`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdminQuery: Send + Sync {
    /// Seller profiles, newest first, including unapproved ones.
    async fn list_sellers(&self, caller: &ExternalId) -> Result<Vec<SellerProfile>, Error>;

    /// The most recent purchases across all buyers.
    async fn list_purchases(&self, caller: &ExternalId) -> Result<Vec<Purchase>, Error>;
}
