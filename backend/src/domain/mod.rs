//! Domain primitives, policies, and services.
//!
//! Purpose: define the storefront's trust boundary independently of HTTP and
//! storage. Inbound adapters reach the services through the driving ports in
//! [`ports`]; services reach storage, the payment gateway, and the
//! notification channel through the driven ports.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic error payload.
//! - InitDataValidator: host-platform signature check.
//! - SessionSigner: stateless session tokens.
//! - Identity, purchase, and item types plus the services implementing the
//!   driving ports.

pub mod admin;
pub mod admin_service;
pub mod error;
pub mod identity;
pub mod identity_service;
pub mod init_data;
pub mod item;
pub mod item_access_service;
pub mod payment;
pub mod payment_reconciliation;
pub mod ports;
pub mod purchase;
pub mod purchase_ledger_service;
pub mod seller_profile;
pub mod seller_profile_service;
pub mod session;
pub mod trace_id;
pub mod user;

pub use self::admin::AdminAllowList;
pub use self::admin_service::AdminService;
pub use self::error::{Error, ErrorCode, TRACE_ID_HEADER};
pub use self::identity::{
    DISPLAY_NAME_MAX, ExternalId, ExternalIdError, ExternalIdentity, USERNAME_MAX,
};
pub use self::identity_service::IdentityService;
pub use self::init_data::{InitDataError, InitDataValidator, sign_init_data};
pub use self::item::{Amount, BookingCode, Item, ItemId, ItemValidationError, ItemView};
pub use self::item_access_service::ItemAccessService;
pub use self::payment::{GatewayStatus, PaymentVerification};
pub use self::payment_reconciliation::{DEFAULT_VERIFY_TIMEOUT, PaymentReconciliationService};
pub use self::purchase::{
    PaymentReference, PaymentReferenceSource, Purchase, PurchaseId, PurchaseReceipt,
    PurchaseStatus, PurchaseValidationError, RandomPaymentReferences, Settlement,
};
pub use self::purchase_ledger_service::{MAX_REFERENCE_RETRIES, PurchaseLedgerService};
pub use self::seller_profile::{
    PROFILE_BIO_MAX, PROFILE_NAME_MAX, PROFILE_NAME_MIN, SellerProfile, SellerProfileDraft,
    SellerProfileValidationError,
};
pub use self::seller_profile_service::SellerProfileService;
pub use self::session::{
    SESSION_TTL_DAYS, SessionCredential, SessionSigner, SessionToken, SessionTokenError,
};
pub use self::trace_id::TraceId;
pub use self::user::{User, UserId, UserRole, UserValidationError};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use storefront::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
