//! Reads whose result depends on the viewer's purchases.
//!
//! Disclosure is evaluated on every read: the booking code is included only
//! when the viewer holds a completed purchase of the item.

use std::sync::Arc;

use async_trait::async_trait;

use super::purchase_ledger_service::{map_item_error, map_purchase_error};
use crate::domain::ports::{
    ItemAccessQuery, ItemRepository, PURCHASE_HISTORY_LIMIT, PurchaseRepository,
};
use crate::domain::{Error, ItemId, ItemView, Purchase, UserId};

/// Item access query backed by item and purchase repositories.
#[derive(Clone)]
pub struct ItemAccessService<I, P> {
    items: Arc<I>,
    purchases: Arc<P>,
}

impl<I, P> ItemAccessService<I, P> {
    /// Create the query service.
    pub fn new(items: Arc<I>, purchases: Arc<P>) -> Self {
        Self { items, purchases }
    }
}

#[async_trait]
impl<I, P> ItemAccessQuery for ItemAccessService<I, P>
where
    I: ItemRepository,
    P: PurchaseRepository,
{
    async fn item_view(&self, item_id: &ItemId, viewer: Option<UserId>) -> Result<ItemView, Error> {
        let item = self
            .items
            .find_by_id(item_id)
            .await
            .map_err(map_item_error)?
            .ok_or_else(|| Error::not_found(format!("item {item_id} not found")))?;

        let purchased = match viewer {
            Some(viewer) => self
                .purchases
                .has_completed(&viewer, item_id)
                .await
                .map_err(map_purchase_error)?,
            None => false,
        };
        Ok(item.view(purchased))
    }

    async fn purchase_history(&self, buyer_id: &UserId) -> Result<Vec<Purchase>, Error> {
        self.purchases
            .list_for_buyer(buyer_id, PURCHASE_HISTORY_LIMIT)
            .await
            .map_err(map_purchase_error)
    }
}
