//! Item detail handler.
//!
//! ```text
//! GET /api/v1/items/{id}
//! ```
//!
//! Anonymous callers see the public fields only. The booking code appears
//! when the caller holds a completed purchase of the item.

use actix_web::{HttpResponse, get, http::header, web};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::ItemView;
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::OptionalCaller;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_item_id};

const ITEM_ID_FIELD: FieldName = FieldName::new("id");

/// Item as returned to one viewer.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemResponse {
    pub id: String,
    pub seller_id: String,
    #[schema(example = "Saturday accumulator")]
    pub title: String,
    /// Price in minor units.
    #[schema(example = 50000)]
    pub price: i64,
    /// Present only for buyers with a completed purchase.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_code: Option<String>,
    pub is_purchased: bool,
}

impl From<ItemView> for ItemResponse {
    fn from(value: ItemView) -> Self {
        Self {
            id: value.id.to_string(),
            seller_id: value.seller_id.to_string(),
            title: value.title,
            price: value.price.minor_units(),
            booking_code: value
                .booking_code
                .map(|code| code.expose().to_owned()),
            is_purchased: value.is_purchased,
        }
    }
}

/// Fetch an item, disclosing its booking code to buyers who paid.
#[utoipa::path(
    get,
    path = "/api/v1/items/{id}",
    params(("id" = String, Path, description = "Item identifier")),
    responses(
        (status = 200, description = "Item", body = ItemResponse),
        (status = 400, description = "Invalid item id", body = ErrorSchema),
        (status = 404, description = "Item not found", body = ErrorSchema),
        (status = 503, description = "Storage unavailable", body = ErrorSchema)
    ),
    tags = ["items"],
    operation_id = "getItem",
    security([], ("SessionCookie" = []))
)]
#[get("/items/{id}")]
pub async fn get_item(
    state: web::Data<HttpState>,
    caller: OptionalCaller,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let item_id = parse_item_id(path.into_inner().as_str(), ITEM_ID_FIELD)?;
    let viewer = caller.user().map(|user| user.id);
    let view = state.items.item_view(&item_id, viewer).await?;
    let mut response = HttpResponse::Ok();
    if view.is_purchased {
        response.insert_header((header::CACHE_CONTROL, "private, no-store"));
    }
    Ok(response.json(ItemResponse::from(view)))
}
