//! Driven port for best-effort buyer notifications.

use async_trait::async_trait;

use crate::domain::{ExternalId, ItemId, PaymentReference};

use super::define_port_error;

define_port_error! {
    /// Failures delivering a notification.
    pub enum PurchaseNotifierError {
        /// The message could not be delivered.
        Delivery { message: String } => "notification delivery failed: {message}",
    }
}

/// Message sent to a buyer once their purchase settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseNotice {
    /// Host platform recipient.
    pub recipient: ExternalId,
    /// Unlocked item.
    pub item_id: ItemId,
    /// Settled reference.
    pub reference: PaymentReference,
}

/// Outbound channel for purchase notifications.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PurchaseNotifier: Send + Sync {
    /// Tell the buyer their item is unlocked.
    async fn purchase_completed(&self, notice: &PurchaseNotice)
    -> Result<(), PurchaseNotifierError>;
}

/// Notifier used when no outbound channel is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpPurchaseNotifier;

#[async_trait]
impl PurchaseNotifier for NoOpPurchaseNotifier {
    async fn purchase_completed(
        &self,
        _notice: &PurchaseNotice,
    ) -> Result<(), PurchaseNotifierError> {
        Ok(())
    }
}
