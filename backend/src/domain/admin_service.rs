//! Administrator listings over profiles and purchases.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::purchase_ledger_service::map_purchase_error;
use super::seller_profile_service::map_profile_error;
use crate::domain::ports::{
    ADMIN_PURCHASE_LIMIT, ADMIN_SELLER_LIMIT, AdminQuery, PurchaseRepository,
    SellerProfileRepository,
};
use crate::domain::{AdminAllowList, Error, ExternalId, Purchase, SellerProfile};

/// Admin query gated by the allow-list.
#[derive(Clone)]
pub struct AdminService<S, P> {
    profiles: Arc<S>,
    purchases: Arc<P>,
    admins: Arc<AdminAllowList>,
}

impl<S, P> AdminService<S, P> {
    /// Create the service.
    pub fn new(profiles: Arc<S>, purchases: Arc<P>, admins: Arc<AdminAllowList>) -> Self {
        Self {
            profiles,
            purchases,
            admins,
        }
    }
}

#[async_trait]
impl<S, P> AdminQuery for AdminService<S, P>
where
    S: SellerProfileRepository,
    P: PurchaseRepository,
{
    async fn list_sellers(&self, caller: &ExternalId) -> Result<Vec<SellerProfile>, Error> {
        self.admins.authorize(caller)?;
        debug!(admin = %caller, "listing sellers");
        self.profiles
            .list_recent(ADMIN_SELLER_LIMIT)
            .await
            .map_err(map_profile_error)
    }

    async fn list_purchases(&self, caller: &ExternalId) -> Result<Vec<Purchase>, Error> {
        self.admins.authorize(caller)?;
        debug!(admin = %caller, "listing purchases");
        self.purchases
            .list_recent(ADMIN_PURCHASE_LIMIT)
            .await
            .map_err(map_purchase_error)
    }
}
