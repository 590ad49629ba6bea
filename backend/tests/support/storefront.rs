//! In-process storefront wired over the in-memory adapters.
//!
//! Requests go through the real handlers, middleware, and domain services;
//! only storage, the payment gateway, and the bot are replaced.

use std::sync::Arc;

use actix_web::http::{StatusCode, header};
use actix_web::{App, test as actix_test, web};
use chrono::Utc;
use mockable::{Clock, DefaultClock};
use serde_json::Value;

use storefront::Trace;
use storefront::domain::{
    AdminAllowList, AdminService, Amount, BookingCode, ExternalId, ExternalIdentity, IdentityService,
    InitDataValidator, Item, ItemAccessService, ItemId, PaymentReconciliationService,
    PurchaseLedgerService, RandomPaymentReferences, SellerProfileService, SessionSigner, User,
    UserId, sign_init_data,
};
use storefront::inbound::http::configure_api;
use storefront::inbound::http::state::{HttpAuth, HttpState, HttpStatePorts};
use storefront::outbound::memory::{InMemoryStore, RecordingNotifier, ScriptedPaymentVerifier};

pub const BOT_TOKEN: &str = "424242:STOREFRONT-TEST";
pub const ADMIN_EXTERNAL_ID: &str = "900";
pub const BOOKING_CODE: &str = "SPORTY-8K2L";

/// Captured response.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub set_cookie: Option<String>,
    pub body: Value,
}

impl Reply {
    pub fn reason(&self) -> Option<&str> {
        self.body.pointer("/details/code").and_then(Value::as_str)
    }

    pub fn str_field(&self, pointer: &str) -> Option<&str> {
        self.body.pointer(pointer).and_then(Value::as_str)
    }
}

pub struct Storefront {
    pub store: Arc<InMemoryStore>,
    pub verifier: Arc<ScriptedPaymentVerifier>,
    pub notifier: Arc<RecordingNotifier>,
    state: web::Data<HttpState>,
}

impl Storefront {
    pub fn new() -> Self {
        let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
        let store = Arc::new(InMemoryStore::new());
        let verifier = Arc::new(ScriptedPaymentVerifier::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let admins = Arc::new(AdminAllowList::from_csv(ADMIN_EXTERNAL_ID));

        let ports = HttpStatePorts {
            identity: Arc::new(IdentityService::new(store.clone(), clock.clone())),
            ledger: Arc::new(PurchaseLedgerService::new(
                store.clone(),
                store.clone(),
                Arc::new(RandomPaymentReferences::new(clock.clone())),
                clock.clone(),
            )),
            reconciler: Arc::new(PaymentReconciliationService::new(
                store.clone(),
                store.clone(),
                verifier.clone(),
                notifier.clone(),
                clock.clone(),
            )),
            items: Arc::new(ItemAccessService::new(store.clone(), store.clone())),
            profiles: Arc::new(SellerProfileService::new(
                store.clone(),
                store.clone(),
                admins.clone(),
                clock.clone(),
            )),
            admin: Arc::new(AdminService::new(store.clone(), store.clone(), admins.clone())),
        };
        let auth = HttpAuth {
            init_data: Arc::new(InitDataValidator::new(BOT_TOKEN)),
            sessions: Arc::new(SessionSigner::new(vec![11_u8; 32], clock)),
            admins,
            cookie_secure: false,
        };

        Self {
            store,
            verifier,
            notifier,
            state: web::Data::new(HttpState::new(ports, auth)),
        }
    }

    /// Store a seller account with one listed item.
    pub fn list_item(&self, seller_external_id: &str, price: i64) -> (User, Item) {
        let identity = ExternalIdentity::new(
            ExternalId::new(seller_external_id).expect("valid external id"),
            "Ace Tips",
            Some("acetips".to_owned()),
        );
        let seller = User::first_contact(UserId::random(), &identity, Utc::now());
        let item = Item {
            id: ItemId::random(),
            seller_id: seller.id,
            title: "Saturday accumulator".to_owned(),
            price: Amount::new(price).expect("valid price"),
            booking_code: BookingCode::new(BOOKING_CODE),
        };
        self.store.put_user(seller.clone());
        self.store.put_item(item.clone());
        (seller, item)
    }

    /// Send `req` through a freshly initialised app.
    pub async fn call(&self, req: actix_test::TestRequest) -> Reply {
        let app = actix_test::init_service(
            App::new()
                .app_data(self.state.clone())
                .wrap(Trace)
                .configure(configure_api),
        )
        .await;
        let res = actix_test::call_service(&app, req.to_request()).await;
        let status = res.status();
        let set_cookie = res
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let bytes = actix_test::read_body(res).await;
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Reply {
            status,
            set_cookie,
            body,
        }
    }
}

/// Init data for `external_id` signed with [`BOT_TOKEN`].
pub fn init_data(external_id: &str, first_name: &str) -> String {
    let user = format!(r#"{{"id":{external_id},"first_name":"{first_name}"}}"#);
    let auth_date = Utc::now().timestamp().to_string();
    sign_init_data(
        &[("auth_date", auth_date.as_str()), ("user", user.as_str())],
        BOT_TOKEN,
    )
}

/// `name=value` pair from a `Set-Cookie` header.
pub fn cookie_pair(set_cookie: &str) -> String {
    set_cookie
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_owned()
}
