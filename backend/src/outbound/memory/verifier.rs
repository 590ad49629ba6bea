//! Scripted payment verifier for local runs and integration tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::domain::ports::{PaymentVerifier, PaymentVerifierError};
use crate::domain::{GatewayStatus, PaymentReference, PaymentVerification};

/// Verifier answering from a table of scripted outcomes.
///
/// References with no script are reported as unknown to the gateway, the
/// way a real gateway answers with a 404.
#[derive(Default)]
pub struct ScriptedPaymentVerifier {
    outcomes: Mutex<HashMap<String, Result<PaymentVerification, PaymentVerifierError>>>,
    calls: AtomicUsize,
}

impl ScriptedPaymentVerifier {
    /// Create a verifier with no scripted outcomes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the gateway's answer for `reference`.
    pub fn script(
        &self,
        reference: &PaymentReference,
        outcome: Result<PaymentVerification, PaymentVerifierError>,
    ) {
        if let Ok(mut outcomes) = self.outcomes.lock() {
            outcomes.insert(reference.as_ref().to_owned(), outcome);
        }
    }

    /// Script a transaction in `status` for `amount` minor units.
    pub fn settle(&self, reference: &PaymentReference, status: &str, amount: i64) {
        self.script(
            reference,
            Ok(PaymentVerification {
                reference: reference.as_ref().to_owned(),
                status: GatewayStatus::parse(status),
                amount,
                currency: "NGN".to_owned(),
            }),
        );
    }

    /// Number of verification requests served.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentVerifier for ScriptedPaymentVerifier {
    async fn verify(
        &self,
        reference: &PaymentReference,
    ) -> Result<PaymentVerification, PaymentVerifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outcomes = self
            .outcomes
            .lock()
            .map_err(|_| PaymentVerifierError::transport("scripted verifier lock poisoned"))?;
        outcomes
            .get(reference.as_ref())
            .cloned()
            .unwrap_or_else(|| {
                Err(PaymentVerifierError::status(
                    404_u16,
                    "Transaction reference not found",
                ))
            })
    }
}
