//! Notifier that records notices instead of delivering them.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::ports::{PurchaseNotice, PurchaseNotifier, PurchaseNotifierError};

/// In-process notifier keeping every notice it is asked to send.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<PurchaseNotice>>,
}

impl RecordingNotifier {
    /// Create a notifier with an empty outbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Notices recorded so far, oldest first.
    pub fn sent(&self) -> Vec<PurchaseNotice> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PurchaseNotifier for RecordingNotifier {
    async fn purchase_completed(
        &self,
        notice: &PurchaseNotice,
    ) -> Result<(), PurchaseNotifierError> {
        self.sent
            .lock()
            .map_err(|_| PurchaseNotifierError::delivery("recording notifier lock poisoned"))?
            .push(notice.clone());
        Ok(())
    }
}
