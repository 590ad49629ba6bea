//! HTTP inbound adapter exposing REST endpoints.

pub mod admin;
pub mod auth;
pub mod auth_config;
pub mod error;
pub mod health;
pub mod items;
pub mod profile;
pub mod purchases;
pub mod schemas;
pub mod session;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub mod validation;

pub use error::ApiResult;

use actix_web::web;

/// Mount every `/api/v1` handler on `cfg`.
///
/// Handlers read [`state::HttpState`] from app data, so the caller must
/// register it on the enclosing `App`.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(users::create_session)
            .service(users::current_user)
            .service(users::purchase_history)
            .service(items::get_item)
            .service(purchases::create_purchase)
            .service(purchases::verify_payment)
            .service(purchases::payment_callback)
            .service(profile::publish_profile)
            .service(profile::seller_access)
            .service(admin::admin_allowed)
            .service(admin::list_sellers)
            .service(admin::approve_seller)
            .service(admin::list_purchases),
    );
}
