//! Driving port for reads that depend on purchase state.

use async_trait::async_trait;

use crate::domain::{Error, ItemId, ItemView, Purchase, UserId};

/// Number of purchases returned by [`ItemAccessQuery::purchase_history`].
pub const PURCHASE_HISTORY_LIMIT: u32 = 50;

/// Item and purchase reads scoped to a viewer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemAccessQuery: Send + Sync {
    /// Project an item for `viewer`, disclosing the booking code only when the
    /// viewer completed a purchase of it.
    async fn item_view(&self, item_id: &ItemId, viewer: Option<UserId>) -> Result<ItemView, Error>;

    /// The buyer's most recent purchases, newest first.
    async fn purchase_history(&self, buyer_id: &UserId) -> Result<Vec<Purchase>, Error>;
}
