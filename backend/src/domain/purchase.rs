//! Purchases and the payment references that tie them to the gateway.
//!
//! A purchase is created `pending` with a unique payment reference and moves
//! to `completed` (or `failed`) exactly once. A buyer holds at most one active
//! (pending or completed) purchase per item.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Amount, ItemId, UserId};

const REFERENCE_PREFIX: &str = "BT";
const REFERENCE_SUFFIX_LEN: usize = 7;
const REFERENCE_MAX: usize = 100;
const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Validation errors for purchase primitives.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PurchaseValidationError {
    /// The reference was empty once trimmed.
    #[error("payment reference must not be empty")]
    EmptyReference,
    /// The reference exceeded the gateway's limit.
    #[error("payment reference must be at most {max} characters")]
    ReferenceTooLong {
        /// Maximum accepted length.
        max: usize,
    },
    /// The reference contained characters the gateway rejects.
    #[error("payment reference may only contain letters, digits, '-', '.', and '='")]
    ReferenceCharacters,
    /// The status name was not recognised.
    #[error("unknown purchase status: {value}")]
    UnknownStatus {
        /// Rejected input.
        value: String,
    },
}

/// Purchase identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PurchaseId(Uuid);

impl PurchaseId {
    /// Allocate a fresh random id.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for PurchaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque, globally unique reference shared with the payment gateway.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PaymentReference(String);

impl PaymentReference {
    /// Validate a reference received from a client or the gateway.
    ///
    /// # Examples
    /// ```
    /// use storefront::domain::PaymentReference;
    ///
    /// assert!(PaymentReference::new("BT-1700000000000-K3J9Q2Z").is_ok());
    /// assert!(PaymentReference::new("BT 1").is_err());
    /// ```
    pub fn new(value: impl Into<String>) -> Result<Self, PurchaseValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(PurchaseValidationError::EmptyReference);
        }
        if trimmed.len() > REFERENCE_MAX {
            return Err(PurchaseValidationError::ReferenceTooLong { max: REFERENCE_MAX });
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '='))
        {
            return Err(PurchaseValidationError::ReferenceCharacters);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Mint a reference of the form `BT-{unix millis}-{7 base36 chars}`.
    pub fn generate<R: Rng + ?Sized>(now: DateTime<Utc>, rng: &mut R) -> Self {
        let suffix = (0..REFERENCE_SUFFIX_LEN)
            .map(|_| char::from(BASE36[rng.gen_range(0..BASE36.len())]))
            .collect::<String>();
        Self(format!(
            "{REFERENCE_PREFIX}-{}-{suffix}",
            now.timestamp_millis()
        ))
    }
}

impl AsRef<str> for PaymentReference {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for PaymentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PaymentReference {
    type Error = PurchaseValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PaymentReference> for String {
    fn from(value: PaymentReference) -> Self {
        value.0
    }
}

/// Source of fresh payment references.
pub trait PaymentReferenceSource: Send + Sync {
    /// Produce the next candidate reference.
    fn next_reference(&self) -> PaymentReference;
}

/// Production reference source: wall-clock millis plus a random suffix.
pub struct RandomPaymentReferences {
    clock: Arc<dyn Clock>,
}

impl RandomPaymentReferences {
    /// Create a source reading time from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl PaymentReferenceSource for RandomPaymentReferences {
    fn next_reference(&self) -> PaymentReference {
        PaymentReference::generate(self.clock.utc(), &mut rand::thread_rng())
    }
}

/// Lifecycle of a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    /// Awaiting payment confirmation.
    Pending,
    /// Payment verified; terminal.
    Completed,
    /// Payment declined by the gateway; terminal.
    Failed,
}

impl PurchaseStatus {
    /// Stable storage name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Whether the status blocks another purchase of the same item.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Completed)
    }
}

impl FromStr for PurchaseStatus {
    type Err = PurchaseValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(PurchaseValidationError::UnknownStatus {
                value: other.to_owned(),
            }),
        }
    }
}

/// A recorded intent to buy an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Purchase {
    /// Identifier.
    pub id: PurchaseId,
    /// Purchased item.
    pub item_id: ItemId,
    /// Purchasing user.
    pub buyer_id: UserId,
    /// Gateway reference; unique across purchases.
    pub reference: PaymentReference,
    /// Current status.
    pub status: PurchaseStatus,
    /// Item price captured at creation, in minor units.
    pub amount_expected: Amount,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Set exactly once, when the purchase completes.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Purchase {
    /// Build a new pending purchase.
    pub fn pending(
        item_id: ItemId,
        buyer_id: UserId,
        reference: PaymentReference,
        amount_expected: Amount,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PurchaseId::random(),
            item_id,
            buyer_id,
            reference,
            status: PurchaseStatus::Pending,
            amount_expected,
            created_at: now,
            completed_at: None,
        }
    }
}

/// What the buyer needs to start paying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseReceipt {
    /// Reference to hand to the gateway checkout.
    pub reference: PaymentReference,
    /// Amount to charge, in minor units.
    pub amount: Amount,
    /// Contact address passed to the gateway.
    pub email: String,
}

/// Result of reconciling a payment reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    /// Settled purchase.
    pub purchase_id: PurchaseId,
    /// Item unlocked by the purchase.
    pub item_id: ItemId,
    /// True when an earlier call had already completed the purchase.
    pub already_settled: bool,
}
