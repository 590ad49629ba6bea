//! Driven port for the purchase ledger.
//!
//! Adapters enforce two uniqueness rules and report them distinctly:
//! payment references are unique across all purchases, and a buyer holds at
//! most one pending or completed purchase per item. Status transitions are
//! conditional on the row still being `pending` and report whether the row
//! changed, so concurrent reconcilers can tell winners from losers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{ItemId, PaymentReference, Purchase, PurchaseId, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by purchase repository adapters.
    pub enum PurchaseRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "purchase repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "purchase repository query failed: {message}",
        /// The payment reference is already taken.
        DuplicateReference { reference: String } =>
            "payment reference {reference} is already in use",
        /// The buyer already holds an active purchase of the item.
        ActivePurchaseExists { buyer_id: String, item_id: String } =>
            "buyer {buyer_id} already has an active purchase of item {item_id}",
    }
}

/// Storage for purchases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PurchaseRepository: Send + Sync {
    /// Insert a pending purchase.
    async fn insert(&self, purchase: &Purchase) -> Result<(), PurchaseRepositoryError>;

    /// Fetch a purchase by payment reference.
    async fn find_by_reference(
        &self,
        reference: &PaymentReference,
    ) -> Result<Option<Purchase>, PurchaseRepositoryError>;

    /// Fetch the buyer's pending or completed purchase of an item.
    async fn find_active(
        &self,
        buyer_id: &UserId,
        item_id: &ItemId,
    ) -> Result<Option<Purchase>, PurchaseRepositoryError>;

    /// Move `pending → completed`, stamping `completed_at`.
    ///
    /// Returns `true` only for the caller whose update changed the row.
    async fn complete_if_pending(
        &self,
        id: &PurchaseId,
        completed_at: DateTime<Utc>,
    ) -> Result<bool, PurchaseRepositoryError>;

    /// Move `pending → failed`. Returns `true` when the row changed.
    async fn fail_if_pending(&self, id: &PurchaseId) -> Result<bool, PurchaseRepositoryError>;

    /// Whether the buyer completed a purchase of the item.
    async fn has_completed(
        &self,
        buyer_id: &UserId,
        item_id: &ItemId,
    ) -> Result<bool, PurchaseRepositoryError>;

    /// The buyer's purchases, newest first.
    async fn list_for_buyer(
        &self,
        buyer_id: &UserId,
        limit: u32,
    ) -> Result<Vec<Purchase>, PurchaseRepositoryError>;

    /// Purchases across all buyers, newest first.
    async fn list_recent(&self, limit: u32) -> Result<Vec<Purchase>, PurchaseRepositoryError>;
}
