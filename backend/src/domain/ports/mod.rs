//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driving ports are implemented by domain services and called by inbound
//! adapters; driven ports are implemented by outbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod admin_query;
mod identity_resolver;
mod item_access_query;
mod item_repository;
mod payment_reconciler;
mod payment_verifier;
mod purchase_ledger;
mod purchase_notifier;
mod purchase_repository;
mod seller_profile_command;
mod seller_profile_repository;
mod user_repository;

#[cfg(test)]
pub use admin_query::MockAdminQuery;
pub use admin_query::{ADMIN_PURCHASE_LIMIT, ADMIN_SELLER_LIMIT, AdminQuery};
#[cfg(test)]
pub use identity_resolver::MockIdentityResolver;
pub use identity_resolver::IdentityResolver;
#[cfg(test)]
pub use item_access_query::MockItemAccessQuery;
pub use item_access_query::{ItemAccessQuery, PURCHASE_HISTORY_LIMIT};
#[cfg(test)]
pub use item_repository::MockItemRepository;
pub use item_repository::{ItemRepository, ItemRepositoryError};
#[cfg(test)]
pub use payment_reconciler::MockPaymentReconciler;
pub use payment_reconciler::PaymentReconciler;
#[cfg(test)]
pub use payment_verifier::MockPaymentVerifier;
pub use payment_verifier::{PaymentVerifier, PaymentVerifierError};
#[cfg(test)]
pub use purchase_ledger::MockPurchaseLedger;
pub use purchase_ledger::PurchaseLedger;
#[cfg(test)]
pub use purchase_notifier::MockPurchaseNotifier;
pub use purchase_notifier::{
    NoOpPurchaseNotifier, PurchaseNotice, PurchaseNotifier, PurchaseNotifierError,
};
#[cfg(test)]
pub use purchase_repository::MockPurchaseRepository;
pub use purchase_repository::{PurchaseRepository, PurchaseRepositoryError};
#[cfg(test)]
pub use seller_profile_command::MockSellerProfileCommand;
pub use seller_profile_command::{PublishedProfile, SellerProfileCommand};
#[cfg(test)]
pub use seller_profile_repository::MockSellerProfileRepository;
pub use seller_profile_repository::{SellerProfileRepository, SellerProfileRepositoryError};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserRepository, UserRepositoryError};
