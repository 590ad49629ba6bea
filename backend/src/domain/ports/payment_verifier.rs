//! Driven port for the payment gateway's transaction lookup.
//!
//! The gateway is the ground truth for settlement. Adapters own the wire
//! format; the domain only sees [`PaymentVerification`].

use async_trait::async_trait;

use crate::domain::{PaymentReference, PaymentVerification};

use super::define_port_error;

define_port_error! {
    /// Failures talking to the payment gateway.
    pub enum PaymentVerifierError {
        /// The request did not complete.
        Transport { message: String } => "payment gateway transport failed: {message}",
        /// The request exceeded its deadline.
        Timeout { message: String } => "payment gateway timed out: {message}",
        /// The gateway answered with a non-success HTTP status.
        Status { status: u16, message: String } =>
            "payment gateway returned status {status}: {message}",
        /// The gateway's response could not be decoded.
        Decode { message: String } => "payment gateway response invalid: {message}",
    }
}

/// Transaction lookup by payment reference.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentVerifier: Send + Sync {
    /// Ask the gateway what happened to `reference`.
    async fn verify(
        &self,
        reference: &PaymentReference,
    ) -> Result<PaymentVerification, PaymentVerifierError>;
}
