//! Builders wiring domain services over either PostgreSQL or in-memory
//! repositories.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};
use tracing::{info, warn};

use storefront::domain::ports::{
    ItemRepository, NoOpPurchaseNotifier, PaymentVerifier, PurchaseNotifier, PurchaseRepository,
    SellerProfileRepository, UserRepository,
};
use storefront::domain::{
    AdminAllowList, AdminService, IdentityService, InitDataValidator, ItemAccessService,
    PaymentReconciliationService, PurchaseLedgerService, RandomPaymentReferences,
    SellerProfileService, SessionSigner,
};
use storefront::inbound::http::auth_config::AuthSettings;
use storefront::inbound::http::state::{HttpAuth, HttpState, HttpStatePorts};
use storefront::outbound::memory::InMemoryStore;
use storefront::outbound::notify::TelegramNotifier;
use storefront::outbound::payment::HttpPaymentVerifier;
use storefront::outbound::persistence::{
    DieselItemRepository, DieselPurchaseRepository, DieselSellerProfileRepository,
    DieselUserRepository,
};

use super::ServerConfig;
use super::config::OutboundConfig;

/// One adapter per storage port.
struct Repositories<U, I, P, S> {
    users: Arc<U>,
    items: Arc<I>,
    purchases: Arc<P>,
    profiles: Arc<S>,
}

/// Gateway and notification adapters.
struct Outbound {
    verifier: Arc<dyn PaymentVerifier>,
    notifier: Arc<dyn PurchaseNotifier>,
}

fn build_ports<U, I, P, S>(
    repos: Repositories<U, I, P, S>,
    outbound: Outbound,
    admins: Arc<AdminAllowList>,
    clock: &Arc<dyn Clock>,
    verify_timeout: std::time::Duration,
) -> HttpStatePorts
where
    U: UserRepository + 'static,
    I: ItemRepository + 'static,
    P: PurchaseRepository + 'static,
    S: SellerProfileRepository + 'static,
{
    let Repositories {
        users,
        items,
        purchases,
        profiles,
    } = repos;
    HttpStatePorts {
        identity: Arc::new(IdentityService::new(users.clone(), clock.clone())),
        ledger: Arc::new(PurchaseLedgerService::new(
            items.clone(),
            purchases.clone(),
            Arc::new(RandomPaymentReferences::new(clock.clone())),
            clock.clone(),
        )),
        reconciler: Arc::new(
            PaymentReconciliationService::new(
                purchases.clone(),
                users.clone(),
                outbound.verifier,
                outbound.notifier,
                clock.clone(),
            )
            .with_verify_timeout(verify_timeout),
        ),
        items: Arc::new(ItemAccessService::new(items, purchases.clone())),
        profiles: Arc::new(SellerProfileService::new(
            users,
            profiles.clone(),
            admins.clone(),
            clock.clone(),
        )),
        admin: Arc::new(AdminService::new(profiles, purchases, admins)),
    }
}

fn build_outbound(auth: &AuthSettings, config: &OutboundConfig) -> std::io::Result<Outbound> {
    let verifier = HttpPaymentVerifier::new(
        config.gateway_base_url.clone(),
        auth.payment_secret.clone(),
        config.timeout,
    )
    .map_err(|err| std::io::Error::other(format!("payment gateway client: {err}")))?;

    let notifier: Arc<dyn PurchaseNotifier> = match &config.mini_app_url {
        Some(deep_link_base) => Arc::new(
            TelegramNotifier::new(
                config.bot_api_base_url.clone(),
                auth.bot_token.clone(),
                deep_link_base.clone(),
                config.timeout,
            )
            .map_err(|err| std::io::Error::other(format!("bot API client: {err}")))?,
        ),
        None => {
            warn!("mini app URL not configured; purchase notifications disabled");
            Arc::new(NoOpPurchaseNotifier)
        }
    };

    Ok(Outbound {
        verifier: Arc::new(verifier),
        notifier,
    })
}

/// Assemble handler state from configuration.
///
/// # Errors
///
/// Returns [`std::io::Error`] when an outbound HTTP client cannot be built.
pub(super) fn build_http_state(config: &ServerConfig) -> std::io::Result<web::Data<HttpState>> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let admins = Arc::new(config.auth.admins.clone());
    let outbound = build_outbound(&config.auth, &config.outbound)?;
    let timeout = config.outbound.timeout;

    let ports = match &config.db_pool {
        Some(pool) => build_ports(
            Repositories {
                users: Arc::new(DieselUserRepository::new(pool.clone())),
                items: Arc::new(DieselItemRepository::new(pool.clone())),
                purchases: Arc::new(DieselPurchaseRepository::new(pool.clone())),
                profiles: Arc::new(DieselSellerProfileRepository::new(pool.clone())),
            },
            outbound,
            admins.clone(),
            &clock,
            timeout,
        ),
        None => {
            info!("no database configured; using in-memory storage");
            let store = Arc::new(InMemoryStore::new());
            build_ports(
                Repositories {
                    users: store.clone(),
                    items: store.clone(),
                    purchases: store.clone(),
                    profiles: store,
                },
                outbound,
                admins.clone(),
                &clock,
                timeout,
            )
        }
    };

    let auth = HttpAuth {
        init_data: Arc::new(InitDataValidator::new(config.auth.bot_token.as_str())),
        sessions: Arc::new(SessionSigner::new(config.auth.session_key.to_vec(), clock)),
        admins,
        cookie_secure: config.auth.cookie_secure,
    };

    Ok(web::Data::new(HttpState::new(ports, auth)))
}
