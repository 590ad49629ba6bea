//! Session and account handlers.
//!
//! ```text
//! POST /api/v1/session {"initDataRaw":"query_id=...&user=...&hash=..."}
//! GET /api/v1/users/me
//! GET /api/v1/users/me/purchases
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::domain::{Purchase, User};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::{AuthenticatedCaller, verify_credential};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::{Credential, session_cookie};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, missing_field_error};

const INIT_DATA_FIELD: FieldName = FieldName::new("initDataRaw");

/// Request body for `POST /api/v1/session`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    /// Init data exactly as the host client delivered it.
    pub init_data_raw: Option<String>,
}

/// Public view of a local account.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub id: String,
    #[schema(example = "123456789")]
    pub external_id: String,
    #[schema(example = "Ada Lovelace")]
    pub display_name: String,
    pub username: Option<String>,
    #[schema(example = "buyer")]
    pub role: String,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(value: User) -> Self {
        Self {
            id: value.id.to_string(),
            external_id: value.external_id.to_string(),
            display_name: value.display_name,
            username: value.username,
            role: value.role.as_str().to_owned(),
            created_at: value.created_at.to_rfc3339(),
        }
    }
}

/// Body returned when a session is established.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user: UserResponse,
}

/// One row of the caller's purchase history.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponse {
    pub id: String,
    pub item_id: String,
    #[schema(example = "BT-1700000000000-K3J9Q2Z")]
    pub payment_reference: String,
    #[schema(example = "completed")]
    pub status: String,
    /// Price captured at purchase time, in minor units.
    pub amount_expected: i64,
    pub created_at: String,
    pub completed_at: Option<String>,
}

impl From<Purchase> for PurchaseResponse {
    fn from(value: Purchase) -> Self {
        Self {
            id: value.id.to_string(),
            item_id: value.item_id.to_string(),
            payment_reference: value.reference.to_string(),
            status: value.status.as_str().to_owned(),
            amount_expected: value.amount_expected.minor_units(),
            created_at: value.created_at.to_rfc3339(),
            completed_at: value.completed_at.map(|at| at.to_rfc3339()),
        }
    }
}

/// Exchange host-signed init data for a session cookie.
#[utoipa::path(
    post,
    path = "/api/v1/session",
    request_body = SessionRequest,
    responses(
        (
            status = 200,
            description = "Session established",
            headers(("Set-Cookie" = String, description = "Session cookie")),
            body = SessionResponse
        ),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Init data rejected", body = ErrorSchema),
        (status = 503, description = "Storage unavailable", body = ErrorSchema)
    ),
    tags = ["session"],
    operation_id = "createSession",
    security([])
)]
#[post("/session")]
pub async fn create_session(
    state: web::Data<HttpState>,
    payload: web::Json<SessionRequest>,
) -> ApiResult<HttpResponse> {
    let raw = payload
        .into_inner()
        .init_data_raw
        .filter(|raw| !raw.trim().is_empty())
        .ok_or_else(|| missing_field_error(INIT_DATA_FIELD))?;
    let identity = verify_credential(&state.auth, &Credential::InitData(raw))?;
    let user = state.identity.resolve(&identity).await?;

    let sessions = &state.auth.sessions;
    let token = sessions.issue(&identity);
    info!(user_id = %user.id, "session established");

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(
            &token,
            sessions.ttl(),
            state.auth.cookie_secure,
        ))
        .json(SessionResponse {
            user: UserResponse::from(user),
        }))
}

/// Return the authenticated caller's account.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "currentUser"
)]
#[get("/users/me")]
pub async fn current_user(caller: AuthenticatedCaller) -> web::Json<UserResponse> {
    web::Json(UserResponse::from(caller.into_user()))
}

/// List the caller's most recent purchases, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/users/me/purchases",
    responses(
        (status = 200, description = "Purchase history", body = [PurchaseResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 503, description = "Storage unavailable", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "purchaseHistory"
)]
#[get("/users/me/purchases")]
pub async fn purchase_history(
    state: web::Data<HttpState>,
    caller: AuthenticatedCaller,
) -> ApiResult<HttpResponse> {
    let purchases = state.items.purchase_history(&caller.user().id).await?;
    Ok(HttpResponse::Ok()
        .insert_header(("Cache-Control", "private, no-store"))
        .json(
            purchases
                .into_iter()
                .map(PurchaseResponse::from)
                .collect::<Vec<_>>(),
        ))
}

#[cfg(test)]
#[path = "users_tests.rs"]
mod tests;
