//! Purchase and payment handlers.
//!
//! ```text
//! POST /api/v1/purchases {"itemId":"..."}
//! POST /api/v1/payments/verify {"reference":"BT-..."}
//! POST /api/v1/payments/callback {"reference":"BT-..."}
//! ```
//!
//! The callback is unauthenticated: the gateway holds no session, and
//! reconciliation trusts only the gateway's own verification answer.

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{PurchaseReceipt, Settlement};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedCaller;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, missing_field_error, parse_item_id, parse_payment_reference,
};

const ITEM_ID_FIELD: FieldName = FieldName::new("itemId");
const REFERENCE_FIELD: FieldName = FieldName::new("reference");

/// Request body for `POST /api/v1/purchases`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePurchaseRequest {
    pub item_id: Option<String>,
}

/// What the client needs to open the gateway checkout.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseReceiptResponse {
    #[schema(example = "BT-1700000000000-K3J9Q2Z")]
    pub payment_reference: String,
    /// Amount to charge, in minor units.
    #[schema(example = 50000)]
    pub amount_expected: i64,
    /// Contact address handed to the gateway.
    #[schema(example = "ada@telegram.user")]
    pub email: String,
}

impl From<PurchaseReceipt> for PurchaseReceiptResponse {
    fn from(value: PurchaseReceipt) -> Self {
        Self {
            payment_reference: value.reference.to_string(),
            amount_expected: value.amount.minor_units(),
            email: value.email,
        }
    }
}

/// Request body for payment verification and the gateway callback.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReferenceRequest {
    pub reference: Option<String>,
}

/// Outcome of a successful reconciliation.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettlementResponse {
    /// Always true; failures are reported as errors.
    pub settled: bool,
    /// True when an earlier call had already settled the purchase.
    pub already_settled: bool,
    pub purchase_id: String,
    pub item_id: String,
}

impl From<Settlement> for SettlementResponse {
    fn from(value: Settlement) -> Self {
        Self {
            settled: true,
            already_settled: value.already_settled,
            purchase_id: value.purchase_id.to_string(),
            item_id: value.item_id.to_string(),
        }
    }
}

/// Open a pending purchase of an item.
#[utoipa::path(
    post,
    path = "/api/v1/purchases",
    request_body = CreatePurchaseRequest,
    responses(
        (status = 201, description = "Pending purchase created", body = PurchaseReceiptResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Sellers cannot buy their own items", body = ErrorSchema),
        (status = 404, description = "Item not found", body = ErrorSchema),
        (status = 409, description = "Already purchased or in progress", body = ErrorSchema),
        (status = 503, description = "Storage unavailable", body = ErrorSchema)
    ),
    tags = ["purchases"],
    operation_id = "createPurchase"
)]
#[post("/purchases")]
pub async fn create_purchase(
    state: web::Data<HttpState>,
    caller: AuthenticatedCaller,
    payload: web::Json<CreatePurchaseRequest>,
) -> ApiResult<HttpResponse> {
    let raw = payload
        .into_inner()
        .item_id
        .ok_or_else(|| missing_field_error(ITEM_ID_FIELD))?;
    let item_id = parse_item_id(raw.trim(), ITEM_ID_FIELD)?;
    let receipt = state.ledger.create_purchase(caller.user(), &item_id).await?;
    Ok(HttpResponse::Created().json(PurchaseReceiptResponse::from(receipt)))
}

/// Reconcile a payment the caller just completed.
#[utoipa::path(
    post,
    path = "/api/v1/payments/verify",
    request_body = PaymentReferenceRequest,
    responses(
        (status = 200, description = "Purchase settled", body = SettlementResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 402, description = "Payment cannot settle the purchase", body = ErrorSchema),
        (status = 404, description = "Unknown reference", body = ErrorSchema),
        (status = 503, description = "Gateway unavailable", body = ErrorSchema)
    ),
    tags = ["payments"],
    operation_id = "verifyPayment"
)]
#[post("/payments/verify")]
pub async fn verify_payment(
    state: web::Data<HttpState>,
    _caller: AuthenticatedCaller,
    payload: web::Json<PaymentReferenceRequest>,
) -> ApiResult<web::Json<SettlementResponse>> {
    reconcile(&state, payload.into_inner()).await
}

/// Gateway completion callback.
#[utoipa::path(
    post,
    path = "/api/v1/payments/callback",
    request_body = PaymentReferenceRequest,
    responses(
        (status = 200, description = "Purchase settled", body = SettlementResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 402, description = "Payment cannot settle the purchase", body = ErrorSchema),
        (status = 404, description = "Unknown reference", body = ErrorSchema),
        (status = 503, description = "Gateway unavailable", body = ErrorSchema)
    ),
    tags = ["payments"],
    operation_id = "paymentCallback",
    security([])
)]
#[post("/payments/callback")]
pub async fn payment_callback(
    state: web::Data<HttpState>,
    payload: web::Json<PaymentReferenceRequest>,
) -> ApiResult<web::Json<SettlementResponse>> {
    reconcile(&state, payload.into_inner()).await
}

async fn reconcile(
    state: &HttpState,
    payload: PaymentReferenceRequest,
) -> ApiResult<web::Json<SettlementResponse>> {
    let reference = parse_payment_reference(payload.reference, REFERENCE_FIELD)?;
    let settlement = state.reconciler.reconcile(&reference).await?;
    Ok(web::Json(SettlementResponse::from(settlement)))
}

#[cfg(test)]
#[path = "purchases_tests.rs"]
mod tests;
