//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use chrono::{Duration, Utc};
use mockable::DefaultClock;

use crate::domain::ports::{
    MockAdminQuery, MockIdentityResolver, MockItemAccessQuery, MockPaymentReconciler,
    MockPurchaseLedger, MockSellerProfileCommand,
};
use crate::domain::{
    AdminAllowList, ExternalId, ExternalIdentity, InitDataValidator, SessionSigner, SessionToken,
    User, UserId, sign_init_data,
};

use super::state::{HttpAuth, HttpState, HttpStatePorts};

/// Bot token shared by the test validator and [`signed_init_data`].
pub const TEST_BOT_TOKEN: &str = "123456:TEST-TOKEN";
const TEST_SESSION_KEY: [u8; 32] = [7; 32];

/// Mock driving ports plus the allow-list, assembled into [`HttpState`].
#[derive(Default)]
pub struct TestPorts {
    pub identity: MockIdentityResolver,
    pub ledger: MockPurchaseLedger,
    pub reconciler: MockPaymentReconciler,
    pub items: MockItemAccessQuery,
    pub profiles: MockSellerProfileCommand,
    pub admin: MockAdminQuery,
    pub admins: AdminAllowList,
}

impl TestPorts {
    /// Resolve every verified identity to a fresh buyer account.
    pub fn resolving_any_identity(mut self) -> Self {
        self.identity
            .expect_resolve()
            .returning(|identity| Ok(user_for(identity)));
        self
    }

    /// Grant administrator rights to `external_id`.
    pub fn with_admin(mut self, external_id: &str) -> Self {
        self.admins = AdminAllowList::from_csv(external_id);
        self
    }

    /// Build handler state over the mocks with insecure cookies.
    pub fn into_state(self) -> HttpState {
        let admins = Arc::new(self.admins);
        HttpState::new(
            HttpStatePorts {
                identity: Arc::new(self.identity),
                ledger: Arc::new(self.ledger),
                reconciler: Arc::new(self.reconciler),
                items: Arc::new(self.items),
                profiles: Arc::new(self.profiles),
                admin: Arc::new(self.admin),
            },
            HttpAuth {
                init_data: Arc::new(InitDataValidator::new(TEST_BOT_TOKEN)),
                sessions: Arc::new(test_signer()),
                admins,
                cookie_secure: false,
            },
        )
    }
}

/// Account created on first contact for `identity`.
pub fn user_for(identity: &ExternalIdentity) -> User {
    User::first_contact(UserId::random(), identity, Utc::now())
}

/// Identity with the given external id and display name "Ada".
pub fn identity(external_id: &str) -> ExternalIdentity {
    ExternalIdentity::new(
        ExternalId::new(external_id).expect("valid external id"),
        "Ada",
        Some("ada".to_owned()),
    )
}

/// Init data for `external_id` signed with [`TEST_BOT_TOKEN`].
pub fn signed_init_data(external_id: &str) -> String {
    let user = format!(r#"{{"id":{external_id},"first_name":"Ada","username":"ada"}}"#);
    sign_init_data(
        &[
            ("auth_date", "1700000000"),
            ("query_id", "AAHdF6IQAAAAAN0XohDhrOrc"),
            ("user", user.as_str()),
        ],
        TEST_BOT_TOKEN,
    )
}

fn test_signer() -> SessionSigner {
    SessionSigner::new(TEST_SESSION_KEY.to_vec(), Arc::new(DefaultClock))
}

/// Session token for `external_id` accepted by [`TestPorts::into_state`].
pub fn session_token(external_id: &str) -> SessionToken {
    test_signer().issue(&identity(external_id))
}

/// Correctly signed session token whose expiry has passed.
pub fn expired_session_token(external_id: &str) -> String {
    test_signer()
        .with_ttl(Duration::seconds(-60))
        .issue(&identity(external_id))
        .into_inner()
}
