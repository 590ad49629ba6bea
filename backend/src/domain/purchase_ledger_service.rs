//! Purchase creation service.
//!
//! Opens pending purchases. The store enforces reference uniqueness and the
//! one-active-purchase rule; this service turns those violations into a
//! retry or a conflict respectively.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::ports::{
    ItemRepository, ItemRepositoryError, PurchaseLedger, PurchaseRepository,
    PurchaseRepositoryError,
};
use crate::domain::{
    Error, ItemId, PaymentReferenceSource, Purchase, PurchaseReceipt, PurchaseStatus, User,
};

/// Collisions tolerated before giving up on a purchase.
pub const MAX_REFERENCE_RETRIES: u32 = 3;

/// Purchase ledger backed by item and purchase repositories.
#[derive(Clone)]
pub struct PurchaseLedgerService<I, P> {
    items: Arc<I>,
    purchases: Arc<P>,
    references: Arc<dyn PaymentReferenceSource>,
    clock: Arc<dyn Clock>,
}

impl<I, P> PurchaseLedgerService<I, P> {
    /// Create a ledger over the given repositories.
    pub fn new(
        items: Arc<I>,
        purchases: Arc<P>,
        references: Arc<dyn PaymentReferenceSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            items,
            purchases,
            references,
            clock,
        }
    }
}

pub(crate) fn map_item_error(error: ItemRepositoryError) -> Error {
    match error {
        ItemRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("item repository unavailable: {message}"))
        }
        ItemRepositoryError::Query { message } => {
            Error::internal(format!("item repository error: {message}"))
        }
    }
}

pub(crate) fn map_purchase_error(error: PurchaseRepositoryError) -> Error {
    match error {
        PurchaseRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("purchase repository unavailable: {message}"))
        }
        PurchaseRepositoryError::Query { message } => {
            Error::internal(format!("purchase repository error: {message}"))
        }
        PurchaseRepositoryError::DuplicateReference { reference } => {
            Error::internal(format!("unexpected duplicate payment reference {reference}"))
        }
        PurchaseRepositoryError::ActivePurchaseExists { .. } => active_conflict(None),
    }
}

fn active_conflict(existing: Option<&Purchase>) -> Error {
    match existing {
        Some(purchase) if purchase.status == PurchaseStatus::Completed => {
            Error::conflict("item already purchased").with_reason("already_purchased")
        }
        Some(purchase) => Error::conflict("a purchase of this item is already in progress")
            .with_details(json!({
                "code": "purchase_in_progress",
                "paymentReference": purchase.reference,
            })),
        None => Error::conflict("a purchase of this item is already in progress")
            .with_reason("purchase_in_progress"),
    }
}

#[async_trait]
impl<I, P> PurchaseLedger for PurchaseLedgerService<I, P>
where
    I: ItemRepository,
    P: PurchaseRepository,
{
    async fn create_purchase(
        &self,
        buyer: &User,
        item_id: &ItemId,
    ) -> Result<PurchaseReceipt, Error> {
        let item = self
            .items
            .find_by_id(item_id)
            .await
            .map_err(map_item_error)?
            .ok_or_else(|| Error::not_found(format!("item {item_id} not found")))?;

        if item.seller_id == buyer.id {
            return Err(
                Error::forbidden("sellers cannot purchase their own items")
                    .with_reason("self_purchase"),
            );
        }

        if let Some(existing) = self
            .purchases
            .find_active(&buyer.id, item_id)
            .await
            .map_err(map_purchase_error)?
        {
            return Err(active_conflict(Some(&existing)));
        }

        for attempt in 0..=MAX_REFERENCE_RETRIES {
            let reference = self.references.next_reference();
            let purchase = Purchase::pending(
                item.id,
                buyer.id,
                reference.clone(),
                item.price,
                self.clock.utc(),
            );
            match self.purchases.insert(&purchase).await {
                Ok(()) => {
                    info!(
                        payment_reference = %reference,
                        buyer_id = %buyer.id,
                        item_id = %item.id,
                        amount = item.price.minor_units(),
                        "opened pending purchase"
                    );
                    return Ok(PurchaseReceipt {
                        reference,
                        amount: item.price,
                        email: buyer.contact_email(),
                    });
                }
                Err(PurchaseRepositoryError::DuplicateReference { .. }) => {
                    warn!(payment_reference = %reference, attempt, "payment reference collided");
                }
                Err(PurchaseRepositoryError::ActivePurchaseExists { .. }) => {
                    let existing = self
                        .purchases
                        .find_active(&buyer.id, item_id)
                        .await
                        .map_err(map_purchase_error)?;
                    return Err(active_conflict(existing.as_ref()));
                }
                Err(err) => return Err(map_purchase_error(err)),
            }
        }

        Err(Error::conflict("could not allocate a unique payment reference")
            .with_reason("reference_collision"))
    }
}

#[cfg(test)]
#[path = "purchase_ledger_service_tests.rs"]
mod tests;
