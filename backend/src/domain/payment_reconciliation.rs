//! Payment reconciliation service.
//!
//! Settles a pending purchase against the gateway's verdict. The only write
//! is a conditional `pending → completed` (or `pending → failed`) update, so
//! retried callbacks and concurrent client polls settle a purchase at most
//! once. Only the caller whose update changed the row notifies the buyer.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{info, warn};

use super::identity_service::map_user_error;
use super::purchase_ledger_service::map_purchase_error;
use crate::domain::ports::{
    PaymentReconciler, PaymentVerifier, PurchaseNotice, PurchaseNotifier, PurchaseRepository,
    UserRepository,
};
use crate::domain::{
    Error, GatewayStatus, PaymentReference, PaymentVerification, Purchase, PurchaseStatus,
    Settlement,
};

/// Default bound on a single gateway lookup.
pub const DEFAULT_VERIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Reconciler backed by the purchase ledger, the gateway, and the notifier.
#[derive(Clone)]
pub struct PaymentReconciliationService<P, U, V: ?Sized, N: ?Sized> {
    purchases: Arc<P>,
    users: Arc<U>,
    verifier: Arc<V>,
    notifier: Arc<N>,
    clock: Arc<dyn Clock>,
    verify_timeout: Duration,
}

impl<P, U, V: ?Sized, N: ?Sized> PaymentReconciliationService<P, U, V, N> {
    /// Create a reconciler with [`DEFAULT_VERIFY_TIMEOUT`].
    pub fn new(
        purchases: Arc<P>,
        users: Arc<U>,
        verifier: Arc<V>,
        notifier: Arc<N>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            purchases,
            users,
            verifier,
            notifier,
            clock,
            verify_timeout: DEFAULT_VERIFY_TIMEOUT,
        }
    }

    /// Override the gateway lookup deadline.
    #[must_use]
    pub fn with_verify_timeout(mut self, verify_timeout: Duration) -> Self {
        self.verify_timeout = verify_timeout;
        self
    }
}

fn verification_failed(message: impl Into<String>) -> Error {
    Error::service_unavailable(message).with_reason("verification_failed")
}

fn purchase_failed() -> Error {
    Error::payment_failed("payment for this purchase failed").with_reason("purchase_failed")
}

fn settled(purchase: &Purchase, already_settled: bool) -> Settlement {
    Settlement {
        purchase_id: purchase.id,
        item_id: purchase.item_id,
        already_settled,
    }
}

impl<P, U, V, N> PaymentReconciliationService<P, U, V, N>
where
    P: PurchaseRepository,
    U: UserRepository,
    V: PaymentVerifier + ?Sized,
    N: PurchaseNotifier + ?Sized,
{
    async fn lookup(&self, reference: &PaymentReference) -> Result<Purchase, Error> {
        self.purchases
            .find_by_reference(reference)
            .await
            .map_err(map_purchase_error)?
            .ok_or_else(|| Error::not_found(format!("no purchase for reference {reference}")))
    }

    async fn ask_gateway(&self, reference: &PaymentReference) -> Result<PaymentVerification, Error> {
        match tokio::time::timeout(self.verify_timeout, self.verifier.verify(reference)).await {
            Ok(Ok(verification)) => Ok(verification),
            Ok(Err(err)) => {
                warn!(payment_reference = %reference, error = %err, "payment verification failed");
                Err(verification_failed("payment gateway could not verify the transaction"))
            }
            Err(_) => {
                warn!(
                    payment_reference = %reference,
                    timeout_ms = self.verify_timeout.as_millis(),
                    "payment verification timed out"
                );
                Err(verification_failed("payment gateway did not answer in time"))
            }
        }
    }

    async fn record_failure(&self, purchase: &Purchase) -> Result<(), Error> {
        let changed = self
            .purchases
            .fail_if_pending(&purchase.id)
            .await
            .map_err(map_purchase_error)?;
        if changed {
            info!(payment_reference = %purchase.reference, "purchase marked failed");
        }
        Ok(())
    }

    async fn notify_buyer(&self, purchase: &Purchase) {
        let buyer = match self.users.find_by_id(&purchase.buyer_id).await {
            Ok(Some(buyer)) => buyer,
            Ok(None) => {
                warn!(buyer_id = %purchase.buyer_id, "buyer missing; skipping notification");
                return;
            }
            Err(err) => {
                let error = map_user_error(err);
                warn!(buyer_id = %purchase.buyer_id, error = %error, "buyer lookup failed; skipping notification");
                return;
            }
        };
        let notice = PurchaseNotice {
            recipient: buyer.external_id,
            item_id: purchase.item_id,
            reference: purchase.reference.clone(),
        };
        if let Err(err) = self.notifier.purchase_completed(&notice).await {
            warn!(payment_reference = %purchase.reference, error = %err, "purchase notification failed");
        }
    }

    async fn settle_after_lost_race(&self, reference: &PaymentReference) -> Result<Settlement, Error> {
        let current = self.lookup(reference).await?;
        match current.status {
            PurchaseStatus::Completed => Ok(settled(&current, true)),
            PurchaseStatus::Failed => Err(purchase_failed()),
            PurchaseStatus::Pending => Err(Error::internal(
                "purchase still pending after a lost settlement race",
            )),
        }
    }
}

#[async_trait]
impl<P, U, V, N> PaymentReconciler for PaymentReconciliationService<P, U, V, N>
where
    P: PurchaseRepository,
    U: UserRepository,
    V: PaymentVerifier + ?Sized,
    N: PurchaseNotifier + ?Sized,
{
    async fn reconcile(&self, reference: &PaymentReference) -> Result<Settlement, Error> {
        let purchase = self.lookup(reference).await?;
        match purchase.status {
            PurchaseStatus::Completed => return Ok(settled(&purchase, true)),
            PurchaseStatus::Failed => return Err(purchase_failed()),
            PurchaseStatus::Pending => {}
        }

        let verification = self.ask_gateway(reference).await?;

        if !verification.is_for(reference) {
            warn!(
                payment_reference = %reference,
                gateway_reference = %verification.reference,
                "gateway answered for a different reference"
            );
            return Err(verification_failed("payment gateway returned a different reference"));
        }

        match &verification.status {
            GatewayStatus::Success => {}
            status => {
                if *status == GatewayStatus::Failed {
                    self.record_failure(&purchase).await?;
                }
                return Err(Error::payment_failed("payment was not successful").with_details(
                    json!({
                        "code": "payment_not_successful",
                        "gatewayStatus": status.as_str(),
                    }),
                ));
            }
        }

        if !verification.amount_matches(purchase.amount_expected) {
            warn!(
                payment_reference = %reference,
                expected = purchase.amount_expected.minor_units(),
                actual = verification.amount,
                "payment amount mismatch"
            );
            return Err(Error::payment_failed("paid amount does not match the price")
                .with_details(json!({
                    "code": "amount_mismatch",
                    "expected": purchase.amount_expected.minor_units(),
                    "actual": verification.amount,
                })));
        }

        let won = self
            .purchases
            .complete_if_pending(&purchase.id, self.clock.utc())
            .await
            .map_err(map_purchase_error)?;
        if !won {
            return self.settle_after_lost_race(reference).await;
        }

        info!(payment_reference = %reference, item_id = %purchase.item_id, "purchase settled");
        self.notify_buyer(&purchase).await;
        Ok(settled(&purchase, false))
    }
}

#[cfg(test)]
#[path = "payment_reconciliation_tests.rs"]
mod tests;
