//! Driving port settling purchases against the payment gateway.

use async_trait::async_trait;

use crate::domain::{Error, PaymentReference, Settlement};

/// Settle a purchase once the gateway confirms payment.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentReconciler: Send + Sync {
    /// Reconcile `reference` with the gateway.
    ///
    /// Repeated and concurrent calls settle the purchase at most once and all
    /// succeed once it has settled.
    ///
    /// # Errors
    ///
    /// - `not_found` when no purchase carries the reference.
    /// - `service_unavailable` with reason `verification_failed` when the
    ///   gateway cannot be reached or times out.
    /// - `payment_failed` with reason `payment_not_successful`,
    ///   `amount_mismatch`, or `purchase_failed`.
    async fn reconcile(&self, reference: &PaymentReference) -> Result<Settlement, Error>;
}
