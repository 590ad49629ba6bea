//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they only depend
//! on driving ports and the credential checkers, and remain testable without
//! I/O.

use std::sync::Arc;

use crate::domain::ports::{
    AdminQuery, IdentityResolver, ItemAccessQuery, PaymentReconciler, PurchaseLedger,
    SellerProfileCommand,
};
use crate::domain::{AdminAllowList, InitDataValidator, SessionSigner};

/// Parameter object bundling the driving ports used by handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub identity: Arc<dyn IdentityResolver>,
    pub ledger: Arc<dyn PurchaseLedger>,
    pub reconciler: Arc<dyn PaymentReconciler>,
    pub items: Arc<dyn ItemAccessQuery>,
    pub profiles: Arc<dyn SellerProfileCommand>,
    pub admin: Arc<dyn AdminQuery>,
}

/// Credential checkers and cookie policy.
#[derive(Clone)]
pub struct HttpAuth {
    /// Host-signed init data validator.
    pub init_data: Arc<InitDataValidator>,
    /// Session token issuer and verifier.
    pub sessions: Arc<SessionSigner>,
    /// Administrator allow-list.
    pub admins: Arc<AdminAllowList>,
    /// Whether session cookies carry the `Secure` attribute.
    pub cookie_secure: bool,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub identity: Arc<dyn IdentityResolver>,
    pub ledger: Arc<dyn PurchaseLedger>,
    pub reconciler: Arc<dyn PaymentReconciler>,
    pub items: Arc<dyn ItemAccessQuery>,
    pub profiles: Arc<dyn SellerProfileCommand>,
    pub admin: Arc<dyn AdminQuery>,
    pub auth: HttpAuth,
}

impl HttpState {
    /// Construct state from a ports bundle and the credential checkers.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use mockable::DefaultClock;
    /// use storefront::domain::{
    ///     AdminAllowList, AdminService, IdentityService, InitDataValidator, ItemAccessService,
    ///     PaymentReconciliationService, PurchaseLedgerService, RandomPaymentReferences,
    ///     SellerProfileService, SessionSigner,
    /// };
    /// use storefront::domain::ports::NoOpPurchaseNotifier;
    /// use storefront::inbound::http::state::{HttpAuth, HttpState, HttpStatePorts};
    /// use storefront::outbound::memory::{InMemoryStore, ScriptedPaymentVerifier};
    ///
    /// let clock = Arc::new(DefaultClock);
    /// let store = Arc::new(InMemoryStore::new());
    /// let admins = Arc::new(AdminAllowList::default());
    /// let ports = HttpStatePorts {
    ///     identity: Arc::new(IdentityService::new(store.clone(), clock.clone())),
    ///     ledger: Arc::new(PurchaseLedgerService::new(
    ///         store.clone(),
    ///         store.clone(),
    ///         Arc::new(RandomPaymentReferences::new(clock.clone())),
    ///         clock.clone(),
    ///     )),
    ///     reconciler: Arc::new(PaymentReconciliationService::new(
    ///         store.clone(),
    ///         store.clone(),
    ///         Arc::new(ScriptedPaymentVerifier::new()),
    ///         Arc::new(NoOpPurchaseNotifier),
    ///         clock.clone(),
    ///     )),
    ///     items: Arc::new(ItemAccessService::new(store.clone(), store.clone())),
    ///     profiles: Arc::new(SellerProfileService::new(
    ///         store.clone(),
    ///         store.clone(),
    ///         admins.clone(),
    ///         clock.clone(),
    ///     )),
    ///     admin: Arc::new(AdminService::new(store.clone(), store, admins.clone())),
    /// };
    /// let auth = HttpAuth {
    ///     init_data: Arc::new(InitDataValidator::new("123:abc")),
    ///     sessions: Arc::new(SessionSigner::new(vec![7_u8; 32], clock)),
    ///     admins,
    ///     cookie_secure: true,
    /// };
    /// let state = HttpState::new(ports, auth);
    /// assert!(state.auth.cookie_secure);
    /// ```
    pub fn new(ports: HttpStatePorts, auth: HttpAuth) -> Self {
        let HttpStatePorts {
            identity,
            ledger,
            reconciler,
            items,
            profiles,
            admin,
        } = ports;
        Self {
            identity,
            ledger,
            reconciler,
            items,
            profiles,
            admin,
            auth,
        }
    }
}
