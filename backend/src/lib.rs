//! Storefront backend library modules.
//!
//! The domain owns the trust boundary: init-data validation, session tokens,
//! identity resolution, the purchase ledger, and payment reconciliation.
//! Inbound adapters speak HTTP; outbound adapters speak PostgreSQL, the
//! payment gateway, and the bot API.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
