//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every REST handler, the response DTOs, and the
//! error wrappers from [`crate::inbound::http::schemas`], which keep the
//! domain error free of utoipa derives. Swagger UI serves it in debug
//! builds.

use crate::inbound::http::admin::{
    AdminAllowedResponse, AdminPurchaseResponse, SellerSummaryResponse,
};
use crate::inbound::http::health::ProbeResponse;
use crate::inbound::http::items::ItemResponse;
use crate::inbound::http::profile::{
    ProfileRequest, ProfileResponse, PublishedProfileResponse, SellerAccessResponse,
};
use crate::inbound::http::purchases::{
    CreatePurchaseRequest, PaymentReferenceRequest, PurchaseReceiptResponse, SettlementResponse,
};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use crate::inbound::http::session::{INIT_DATA_HEADER, SESSION_COOKIE_NAME};
use crate::inbound::http::users::{
    PurchaseResponse, SessionRequest, SessionResponse, UserResponse,
};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Register the three ways a caller can present credentials.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                SESSION_COOKIE_NAME,
                "Session cookie issued by POST /api/v1/session.",
            ))),
        );
        components.add_security_scheme(
            "InitData",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                INIT_DATA_HEADER,
                "Raw init data signed by the host platform.",
            ))),
        );
        components.add_security_scheme(
            "BearerSession",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Storefront API",
        description = "Sessions, purchases, and payment reconciliation for the tipster storefront."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = []), ("InitData" = []), ("BearerSession" = [])),
    paths(
        crate::inbound::http::users::create_session,
        crate::inbound::http::users::current_user,
        crate::inbound::http::users::purchase_history,
        crate::inbound::http::items::get_item,
        crate::inbound::http::purchases::create_purchase,
        crate::inbound::http::purchases::verify_payment,
        crate::inbound::http::purchases::payment_callback,
        crate::inbound::http::profile::publish_profile,
        crate::inbound::http::profile::seller_access,
        crate::inbound::http::admin::admin_allowed,
        crate::inbound::http::admin::list_sellers,
        crate::inbound::http::admin::approve_seller,
        crate::inbound::http::admin::list_purchases,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        SessionRequest,
        SessionResponse,
        UserResponse,
        PurchaseResponse,
        ItemResponse,
        CreatePurchaseRequest,
        PurchaseReceiptResponse,
        PaymentReferenceRequest,
        SettlementResponse,
        ProfileRequest,
        ProfileResponse,
        PublishedProfileResponse,
        SellerAccessResponse,
        AdminAllowedResponse,
        SellerSummaryResponse,
        AdminPurchaseResponse,
        ProbeResponse,
    )),
    tags(
        (name = "session", description = "Session establishment and the caller's account"),
        (name = "items", description = "Item detail with gated disclosure"),
        (name = "purchases", description = "Pending purchase creation"),
        (name = "payments", description = "Payment reconciliation"),
        (name = "profile", description = "Seller onboarding"),
        (name = "admin", description = "Administrator operations"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
