//! Seller profile handlers.
//!
//! ```text
//! PUT /api/v1/profile {"displayName":"Ace Tips","bio":"...","photoUrl":"https://..."}
//! GET /api/v1/profile/access
//! ```

use actix_web::{get, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::PublishedProfile;
use crate::domain::{SellerProfile, SellerProfileDraft};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedCaller;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::users::UserResponse;
use crate::inbound::http::validation::{FieldName, missing_field_error, profile_validation_error};

const DISPLAY_NAME_FIELD: FieldName = FieldName::new("displayName");

/// Request body for `PUT /api/v1/profile`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRequest {
    #[schema(example = "Ace Tips")]
    pub display_name: Option<String>,
    pub bio: Option<String>,
    #[schema(example = "https://cdn.example.com/ace.jpg")]
    pub photo_url: Option<String>,
}

/// Stored seller profile.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub display_name: String,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
    /// Set by an administrator.
    pub is_approved: bool,
    pub updated_at: String,
}

impl From<SellerProfile> for ProfileResponse {
    fn from(value: SellerProfile) -> Self {
        Self {
            display_name: value.display_name,
            bio: value.bio,
            photo_url: value.photo_url.map(String::from),
            is_approved: value.is_approved,
            updated_at: value.updated_at.to_rfc3339(),
        }
    }
}

/// Caller and profile after publishing.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublishedProfileResponse {
    pub user: UserResponse,
    pub profile: ProfileResponse,
}

impl From<PublishedProfile> for PublishedProfileResponse {
    fn from(value: PublishedProfile) -> Self {
        Self {
            user: UserResponse::from(value.user),
            profile: ProfileResponse::from(value.profile),
        }
    }
}

/// Create or replace the caller's seller profile.
///
/// Publishing a profile upgrades a buyer to `both`; roles never narrow.
#[utoipa::path(
    put,
    path = "/api/v1/profile",
    request_body = ProfileRequest,
    responses(
        (status = 200, description = "Profile stored", body = PublishedProfileResponse),
        (status = 400, description = "Invalid profile", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 503, description = "Storage unavailable", body = ErrorSchema)
    ),
    tags = ["profile"],
    operation_id = "publishProfile"
)]
#[put("/profile")]
pub async fn publish_profile(
    state: web::Data<HttpState>,
    caller: AuthenticatedCaller,
    payload: web::Json<ProfileRequest>,
) -> ApiResult<web::Json<PublishedProfileResponse>> {
    let ProfileRequest {
        display_name,
        bio,
        photo_url,
    } = payload.into_inner();
    let display_name = display_name.ok_or_else(|| missing_field_error(DISPLAY_NAME_FIELD))?;
    let draft =
        SellerProfileDraft::try_new(&display_name, bio.as_deref(), photo_url.as_deref())
            .map_err(|error| profile_validation_error(&error))?;
    let published = state.profiles.publish_profile(caller.user(), draft).await?;
    Ok(web::Json(PublishedProfileResponse::from(published)))
}

/// Admission to the seller area.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SellerAccessResponse {
    pub allowed: bool,
    pub profile: ProfileResponse,
}

/// Admit the caller to the seller area.
///
/// Only sellers whose profile an administrator approved are admitted.
#[utoipa::path(
    get,
    path = "/api/v1/profile/access",
    responses(
        (status = 200, description = "Caller is an approved seller", body = SellerAccessResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (
            status = 403,
            description = "Caller has no seller profile (`not_seller`) or awaits approval (`seller_not_approved`)",
            body = ErrorSchema
        )
    ),
    tags = ["profile"],
    operation_id = "sellerAccess"
)]
#[get("/profile/access")]
pub async fn seller_access(
    state: web::Data<HttpState>,
    caller: AuthenticatedCaller,
) -> ApiResult<web::Json<SellerAccessResponse>> {
    let profile = state.profiles.seller_access(caller.user()).await?;
    Ok(web::Json(SellerAccessResponse {
        allowed: true,
        profile: ProfileResponse::from(profile),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Error, UserRole};
    use crate::inbound::http::session::INIT_DATA_HEADER;
    use crate::inbound::http::test_utils::{TestPorts, signed_init_data};
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use chrono::Utc;
    use rstest::rstest;
    use serde_json::{Value, json};

    async fn put_profile(ports: TestPorts, body: Value) -> (StatusCode, Value) {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(ports.into_state()))
                .service(web::scope("/api/v1").service(publish_profile)),
        )
        .await;
        let req = actix_test::TestRequest::put()
            .uri("/api/v1/profile")
            .insert_header((INIT_DATA_HEADER, signed_init_data("4242")))
            .set_json(body)
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        let status = res.status();
        (status, actix_test::read_body_json(res).await)
    }

    async fn get_access(ports: TestPorts) -> (StatusCode, Value) {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(ports.into_state()))
                .service(web::scope("/api/v1").service(seller_access)),
        )
        .await;
        let req = actix_test::TestRequest::get()
            .uri("/api/v1/profile/access")
            .insert_header((INIT_DATA_HEADER, signed_init_data("4242")))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        let status = res.status();
        (status, actix_test::read_body_json(res).await)
    }

    #[actix_web::test]
    async fn publishing_returns_the_upgraded_user() {
        let mut ports = TestPorts::default().resolving_any_identity();
        ports
            .profiles
            .expect_publish_profile()
            .withf(|user, draft| {
                user.external_id.as_ref() == "4242"
                    && draft.display_name() == "Ace Tips"
                    && draft.bio().is_none()
            })
            .times(1)
            .return_once(|user, draft| {
                let now = Utc::now();
                let mut user = user.clone();
                user.role = user.role.with_selling();
                Ok(PublishedProfile {
                    profile: SellerProfile::apply(None, user.id, &draft, now),
                    user,
                })
            });

        let (status, body) = put_profile(
            ports,
            json!({ "displayName": "  Ace Tips ", "bio": "", "photoUrl": "https://cdn.example.com/ace.jpg" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body.pointer("/user/role"),
            Some(&json!(UserRole::Both.as_str()))
        );
        assert_eq!(body.pointer("/profile/displayName"), Some(&json!("Ace Tips")));
        assert_eq!(body.pointer("/profile/isApproved"), Some(&json!(false)));
        assert_eq!(
            body.pointer("/profile/photoUrl"),
            Some(&json!("https://cdn.example.com/ace.jpg"))
        );
    }

    #[rstest]
    #[case::missing_name(json!({ "bio": "tips" }), "displayName", "missing_field")]
    #[case::short_name(json!({ "displayName": "A" }), "displayName", "too_short")]
    #[case::bad_photo(
        json!({ "displayName": "Ace", "photoUrl": "javascript:alert(1)" }),
        "photoUrl",
        "invalid_url"
    )]
    #[actix_web::test]
    async fn invalid_profiles_are_rejected_before_storage(
        #[case] body: Value,
        #[case] field: &str,
        #[case] reason: &str,
    ) {
        let mut ports = TestPorts::default().resolving_any_identity();
        ports.profiles.expect_publish_profile().never();

        let (status, body) = put_profile(ports, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.pointer("/details/field"), Some(&json!(field)));
        assert_eq!(body.pointer("/details/code"), Some(&json!(reason)));
    }

    #[actix_web::test]
    async fn storage_outages_surface_as_unavailable() {
        let mut ports = TestPorts::default().resolving_any_identity();
        ports
            .profiles
            .expect_publish_profile()
            .return_once(|_, _| Err(Error::service_unavailable("profiles unavailable")));

        let (status, _) = put_profile(ports, json!({ "displayName": "Ace Tips" })).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[actix_web::test]
    async fn approved_sellers_are_admitted() {
        let mut ports = TestPorts::default().resolving_any_identity();
        ports
            .profiles
            .expect_seller_access()
            .withf(|user| user.external_id.as_ref() == "4242")
            .times(1)
            .return_once(|user| {
                let draft =
                    SellerProfileDraft::try_new("Ace Tips", None, None).expect("valid draft");
                let mut profile = SellerProfile::apply(None, user.id, &draft, Utc::now());
                profile.is_approved = true;
                Ok(profile)
            });

        let (status, body) = get_access(ports).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.pointer("/allowed"), Some(&json!(true)));
        assert_eq!(body.pointer("/profile/isApproved"), Some(&json!(true)));
    }

    #[rstest]
    #[case::no_profile("not_seller")]
    #[case::unapproved("seller_not_approved")]
    #[actix_web::test]
    async fn seller_area_refusals_carry_a_reason(#[case] reason: &'static str) {
        let mut ports = TestPorts::default().resolving_any_identity();
        ports
            .profiles
            .expect_seller_access()
            .return_once(move |_| Err(Error::forbidden("seller area closed").with_reason(reason)));

        let (status, body) = get_access(ports).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body.pointer("/details/code"), Some(&json!(reason)));
    }
}
