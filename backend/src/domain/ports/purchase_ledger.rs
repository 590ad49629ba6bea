//! Driving port for opening purchases.

use async_trait::async_trait;

use crate::domain::{Error, ItemId, PurchaseReceipt, User};

/// Record a buyer's intent to pay for an item.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PurchaseLedger: Send + Sync {
    /// Create a pending purchase and return what the checkout needs.
    ///
    /// # Errors
    ///
    /// - `not_found` when the item does not exist.
    /// - `forbidden` with reason `self_purchase` when the buyer sold the item.
    /// - `conflict` with reason `already_purchased` or `purchase_in_progress`
    ///   when the buyer already holds an active purchase of the item.
    async fn create_purchase(&self, buyer: &User, item_id: &ItemId)
    -> Result<PurchaseReceipt, Error>;
}
