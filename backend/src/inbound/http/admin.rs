//! Administrator handlers.
//!
//! ```text
//! GET /api/v1/admin/allowed
//! GET /api/v1/admin/sellers
//! POST /api/v1/admin/sellers/{userId}/approve
//! GET /api/v1/admin/purchases
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use crate::domain::{Purchase, SellerProfile};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedCaller;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_user_id};

const USER_ID_FIELD: FieldName = FieldName::new("userId");

/// Answer to the administrator check.
#[derive(Debug, Serialize, ToSchema)]
pub struct AdminAllowedResponse {
    pub allowed: bool,
}

/// Confirm the caller is an administrator.
#[utoipa::path(
    get,
    path = "/api/v1/admin/allowed",
    responses(
        (status = 200, description = "Caller is an administrator", body = AdminAllowedResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Caller is not an administrator", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "adminAllowed"
)]
#[get("/admin/allowed")]
pub async fn admin_allowed(
    state: web::Data<HttpState>,
    caller: AuthenticatedCaller,
) -> ApiResult<web::Json<AdminAllowedResponse>> {
    let external_id = &caller.user().external_id;
    state.auth.admins.authorize(external_id).inspect_err(|_| {
        warn!(external_id = %external_id, "administrator check rejected");
    })?;
    Ok(web::Json(AdminAllowedResponse { allowed: true }))
}

/// One seller profile as seen by an administrator.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SellerSummaryResponse {
    pub user_id: String,
    pub display_name: String,
    pub is_approved: bool,
    pub created_at: String,
}

impl From<SellerProfile> for SellerSummaryResponse {
    fn from(value: SellerProfile) -> Self {
        Self {
            user_id: value.user_id.to_string(),
            display_name: value.display_name,
            is_approved: value.is_approved,
            created_at: value.created_at.to_rfc3339(),
        }
    }
}

/// One purchase across all buyers.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminPurchaseResponse {
    pub id: String,
    pub item_id: String,
    pub buyer_id: String,
    #[schema(example = "pending")]
    pub status: String,
    pub payment_reference: String,
    /// Price captured at purchase time, in minor units.
    pub amount_expected: i64,
    pub created_at: String,
}

impl From<Purchase> for AdminPurchaseResponse {
    fn from(value: Purchase) -> Self {
        Self {
            id: value.id.to_string(),
            item_id: value.item_id.to_string(),
            buyer_id: value.buyer_id.to_string(),
            status: value.status.as_str().to_owned(),
            payment_reference: value.reference.to_string(),
            amount_expected: value.amount_expected.minor_units(),
            created_at: value.created_at.to_rfc3339(),
        }
    }
}

/// List seller profiles, newest first, approved or not.
#[utoipa::path(
    get,
    path = "/api/v1/admin/sellers",
    responses(
        (status = 200, description = "Seller profiles", body = [SellerSummaryResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Caller is not an administrator", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "listSellers"
)]
#[get("/admin/sellers")]
pub async fn list_sellers(
    state: web::Data<HttpState>,
    caller: AuthenticatedCaller,
) -> ApiResult<web::Json<Vec<SellerSummaryResponse>>> {
    let sellers = state.admin.list_sellers(&caller.user().external_id).await?;
    Ok(web::Json(
        sellers.into_iter().map(SellerSummaryResponse::from).collect(),
    ))
}

/// List the 30 most recent purchases across all buyers.
#[utoipa::path(
    get,
    path = "/api/v1/admin/purchases",
    responses(
        (status = 200, description = "Recent purchases", body = [AdminPurchaseResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Caller is not an administrator", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "listPurchases"
)]
#[get("/admin/purchases")]
pub async fn list_purchases(
    state: web::Data<HttpState>,
    caller: AuthenticatedCaller,
) -> ApiResult<web::Json<Vec<AdminPurchaseResponse>>> {
    let purchases = state
        .admin
        .list_purchases(&caller.user().external_id)
        .await?;
    Ok(web::Json(
        purchases.into_iter().map(AdminPurchaseResponse::from).collect(),
    ))
}

/// Approve a seller profile.
#[utoipa::path(
    post,
    path = "/api/v1/admin/sellers/{userId}/approve",
    params(("userId" = String, Path, description = "Seller's user id")),
    responses(
        (status = 204, description = "Seller approved"),
        (status = 400, description = "Invalid user id", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Caller is not an administrator", body = ErrorSchema),
        (status = 404, description = "No seller profile", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "approveSeller"
)]
#[post("/admin/sellers/{user_id}/approve")]
pub async fn approve_seller(
    state: web::Data<HttpState>,
    caller: AuthenticatedCaller,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let user_id = parse_user_id(path.into_inner().as_str(), USER_ID_FIELD)?;
    state
        .profiles
        .approve_seller(&caller.user().external_id, &user_id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Amount, Error, ItemId, PaymentReference, SellerProfileDraft, UserId,
    };
    use crate::inbound::http::session::INIT_DATA_HEADER;
    use crate::inbound::http::test_utils::{TestPorts, signed_init_data};
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use chrono::Utc;
    use rstest::rstest;
    use serde_json::{Value, json};

    async fn call(
        ports: TestPorts,
        req: actix_test::TestRequest,
    ) -> (StatusCode, Option<Value>) {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(ports.into_state()))
                .service(
                    web::scope("/api/v1")
                        .service(admin_allowed)
                        .service(list_sellers)
                        .service(approve_seller)
                        .service(list_purchases),
                ),
        )
        .await;
        let req = req
            .insert_header((INIT_DATA_HEADER, signed_init_data("4242")))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        let status = res.status();
        let bytes = actix_test::read_body(res).await;
        (status, serde_json::from_slice(&bytes).ok())
    }

    #[rstest]
    #[case::listed("4242", StatusCode::OK)]
    #[case::unlisted("7", StatusCode::FORBIDDEN)]
    #[actix_web::test]
    async fn admin_check_follows_the_allow_list(#[case] admin: &str, #[case] expected: StatusCode) {
        let ports = TestPorts::default()
            .resolving_any_identity()
            .with_admin(admin);
        let (status, body) = call(
            ports,
            actix_test::TestRequest::get().uri("/api/v1/admin/allowed"),
        )
        .await;
        assert_eq!(status, expected);
        let body = body.expect("json body");
        if expected == StatusCode::OK {
            assert_eq!(body, json!({ "allowed": true }));
        } else {
            assert_eq!(body.pointer("/details/code"), Some(&json!("not_admin")));
        }
    }

    #[actix_web::test]
    async fn approval_passes_the_caller_to_the_service() {
        let seller = UserId::random();
        let mut ports = TestPorts::default().resolving_any_identity();
        ports
            .profiles
            .expect_approve_seller()
            .withf(move |caller, user_id| caller.as_ref() == "4242" && *user_id == seller)
            .times(1)
            .return_once(|_, _| Ok(()));

        let (status, body) = call(
            ports,
            actix_test::TestRequest::post().uri(&format!("/api/v1/admin/sellers/{seller}/approve")),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_none());
    }

    #[rstest]
    #[case::not_admin(
        Error::forbidden("administrator access required").with_reason("not_admin"),
        StatusCode::FORBIDDEN
    )]
    #[case::no_profile(Error::not_found("no seller profile"), StatusCode::NOT_FOUND)]
    #[actix_web::test]
    async fn approval_failures_map_to_status(#[case] error: Error, #[case] expected: StatusCode) {
        let mut ports = TestPorts::default().resolving_any_identity();
        ports
            .profiles
            .expect_approve_seller()
            .return_once(move |_, _| Err(error));

        let seller = UserId::random();
        let (status, _) = call(
            ports,
            actix_test::TestRequest::post().uri(&format!("/api/v1/admin/sellers/{seller}/approve")),
        )
        .await;
        assert_eq!(status, expected);
    }

    #[actix_web::test]
    async fn sellers_are_listed_for_the_caller() {
        let mut ports = TestPorts::default().resolving_any_identity();
        ports
            .admin
            .expect_list_sellers()
            .withf(|caller| caller.as_ref() == "4242")
            .times(1)
            .return_once(|_| {
                let draft =
                    SellerProfileDraft::try_new("Ace Tips", None, None).expect("valid draft");
                Ok(vec![SellerProfile::apply(
                    None,
                    UserId::random(),
                    &draft,
                    Utc::now(),
                )])
            });

        let (status, body) = call(
            ports,
            actix_test::TestRequest::get().uri("/api/v1/admin/sellers"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let body = body.expect("json body");
        assert_eq!(body.pointer("/0/displayName"), Some(&json!("Ace Tips")));
        assert_eq!(body.pointer("/0/isApproved"), Some(&json!(false)));
    }

    #[actix_web::test]
    async fn purchases_are_listed_with_their_buyers() {
        let buyer = UserId::random();
        let mut ports = TestPorts::default().resolving_any_identity();
        ports.admin.expect_list_purchases().times(1).return_once(move |_| {
            Ok(vec![Purchase::pending(
                ItemId::random(),
                buyer,
                PaymentReference::new("BT-1700000000000-K3J9Q2Z").expect("valid reference"),
                Amount::new(50_000).expect("valid amount"),
                Utc::now(),
            )])
        });

        let (status, body) = call(
            ports,
            actix_test::TestRequest::get().uri("/api/v1/admin/purchases"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let body = body.expect("json body");
        assert_eq!(body.pointer("/0/buyerId"), Some(&json!(buyer.to_string())));
        assert_eq!(body.pointer("/0/status"), Some(&json!("pending")));
        assert_eq!(body.pointer("/0/amountExpected"), Some(&json!(50_000)));
    }

    #[rstest]
    #[case::sellers("/api/v1/admin/sellers")]
    #[case::purchases("/api/v1/admin/purchases")]
    #[actix_web::test]
    async fn listings_refuse_non_admins(#[case] uri: &str) {
        let denied = || Error::forbidden("administrator access required").with_reason("not_admin");
        let mut ports = TestPorts::default().resolving_any_identity();
        ports
            .admin
            .expect_list_sellers()
            .returning(move |_| Err(denied()));
        ports
            .admin
            .expect_list_purchases()
            .returning(move |_| Err(denied()));

        let (status, body) = call(ports, actix_test::TestRequest::get().uri(uri)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(
            body.and_then(|body| body.pointer("/details/code").cloned()),
            Some(json!("not_admin"))
        );
    }

    #[actix_web::test]
    async fn approval_rejects_malformed_user_ids() {
        let mut ports = TestPorts::default().resolving_any_identity();
        ports.profiles.expect_approve_seller().never();
        let (status, body) = call(
            ports,
            actix_test::TestRequest::post().uri("/api/v1/admin/sellers/nobody/approve"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body.and_then(|body| body.pointer("/details/field").cloned()),
            Some(json!("userId"))
        );
    }
}
