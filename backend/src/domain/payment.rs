//! What the payment gateway reports about a transaction.

use super::{Amount, PaymentReference};

/// Transaction status reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayStatus {
    /// Funds captured.
    Success,
    /// The gateway declined the charge.
    Failed,
    /// Any other state (abandoned, ongoing, reversed, ...).
    Other(String),
}

impl GatewayStatus {
    /// Interpret the gateway's status string.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "success" => Self::Success,
            "failed" => Self::Failed,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Status name for logs and error details.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Other(other) => other.as_str(),
        }
    }
}

/// Gateway verdict for one reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentVerification {
    /// Reference the gateway resolved.
    pub reference: String,
    /// Transaction status.
    pub status: GatewayStatus,
    /// Amount charged, in minor units.
    pub amount: i64,
    /// ISO currency code.
    pub currency: String,
}

impl PaymentVerification {
    /// Whether the gateway answered for `reference`.
    pub fn is_for(&self, reference: &PaymentReference) -> bool {
        self.reference == reference.as_ref()
    }

    /// Whether the charged amount equals `expected`.
    pub fn amount_matches(&self, expected: Amount) -> bool {
        self.amount == expected.minor_units()
    }
}
