//! DTOs for decoding the gateway's transaction verification response.

use serde::Deserialize;

use crate::domain::{GatewayStatus, PaymentVerification};

#[derive(Debug, Deserialize)]
pub(super) struct VerifyResponseDto {
    pub(super) status: bool,
    #[serde(default)]
    pub(super) message: String,
    pub(super) data: Option<TransactionDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TransactionDto {
    pub(super) status: String,
    pub(super) amount: i64,
    pub(super) currency: String,
    pub(super) reference: String,
}

impl VerifyResponseDto {
    pub(super) fn into_verification(self) -> Result<PaymentVerification, String> {
        if !self.status {
            return Err(format!("gateway rejected verification: {}", self.message));
        }
        let data = self
            .data
            .ok_or_else(|| "verification response is missing data".to_owned())?;
        Ok(PaymentVerification {
            reference: data.reference,
            status: GatewayStatus::parse(&data.status),
            amount: data.amount,
            currency: data.currency,
        })
    }
}
