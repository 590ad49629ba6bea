//! Session credential transport.
//!
//! Session tokens travel in the `bt_session` cookie or an
//! `Authorization: Bearer` header; host-signed init data may be sent on any
//! request in the `X-Telegram-Init-Data` header instead.

use actix_web::HttpRequest;
use actix_web::cookie::{Cookie, SameSite, time::Duration as CookieDuration};
use actix_web::http::header::AUTHORIZATION;
use chrono::Duration;

use crate::domain::SessionToken;

/// Name of the session cookie.
pub const SESSION_COOKIE_NAME: &str = "bt_session";
/// Header carrying raw init data.
pub const INIT_DATA_HEADER: &str = "X-Telegram-Init-Data";

/// Credential presented by a caller.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Raw host-signed init data.
    InitData(String),
    /// Session token from the cookie or a bearer header.
    Session(String),
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InitData(_) => f.write_str("Credential::InitData(..)"),
            Self::Session(_) => f.write_str("Credential::Session(..)"),
        }
    }
}

/// Pick the credential a request carries.
///
/// Init data takes precedence over a bearer token, which takes precedence
/// over the cookie. Blank values are ignored.
pub fn credential_from_request(req: &HttpRequest) -> Option<Credential> {
    if let Some(raw) = header_value(req, INIT_DATA_HEADER) {
        return Some(Credential::InitData(raw.to_owned()));
    }
    if let Some(token) = header_value(req, AUTHORIZATION.as_str())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
    {
        return Some(Credential::Session(token.to_owned()));
    }
    req.cookie(SESSION_COOKIE_NAME)
        .map(|cookie| cookie.value().trim().to_owned())
        .filter(|token| !token.is_empty())
        .map(Credential::Session)
}

fn header_value<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Build the session cookie for `token`.
///
/// # Examples
/// ```
/// use actix_web::cookie::SameSite;
/// use chrono::Duration;
/// use storefront::inbound::http::session::session_cookie;
///
/// # fn token() -> storefront::domain::SessionToken {
/// #     use std::sync::Arc;
/// #     use mockable::DefaultClock;
/// #     use storefront::domain::{ExternalId, ExternalIdentity, SessionSigner};
/// #     let signer = SessionSigner::new(vec![1_u8; 32], Arc::new(DefaultClock));
/// #     signer.issue(&ExternalIdentity::new(ExternalId::new("1").expect("id"), "A", None))
/// # }
/// let cookie = session_cookie(&token(), Duration::days(30), true);
/// assert_eq!(cookie.http_only(), Some(true));
/// assert_eq!(cookie.same_site(), Some(SameSite::Lax));
/// ```
pub fn session_cookie(token: &SessionToken, ttl: Duration, secure: bool) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE_NAME, token.as_str().to_owned())
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::seconds(ttl.num_seconds()))
        .finish()
}
