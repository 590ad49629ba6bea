//! Payment gateway outbound adapters.
//!
//! A thin HTTP implementation of the `PaymentVerifier` port.

mod dto;
mod http_verifier;

pub use http_verifier::{DEFAULT_GATEWAY_BASE_URL, HttpPaymentVerifier};
