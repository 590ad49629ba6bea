//! HTTP rendering of domain errors.
//!
//! Every failure becomes the JSON error envelope with a status derived from
//! its [`ErrorCode`]. Internal errors are logged in full and redacted before
//! they leave the process.

use actix_web::http::header::{self, CacheControl, CacheDirective};
use actix_web::{HttpResponse, HttpResponseBuilder, ResponseError, http::StatusCode};
use tracing::{error, warn};

use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER};

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, Error>;

/// Challenge returned with 401 responses.
pub const AUTH_CHALLENGE: &str = r#"Bearer realm="storefront""#;

/// Seconds a client should wait before retrying a 503.
pub const RETRY_AFTER_SECS: u32 = 5;

const REDACTED_MESSAGE: &str = "Internal server error";

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::PaymentFailed => StatusCode::PAYMENT_REQUIRED,
        ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Client-facing copy of `error`.
///
/// Internal errors lose their message and details but keep the trace id so
/// operators can correlate the report with server logs.
fn client_view(error: &Error) -> Error {
    if error.code() != ErrorCode::InternalError {
        return error.clone();
    }
    match error.trace_id() {
        Some(id) => Error::internal(REDACTED_MESSAGE).with_trace_id(id.to_owned()),
        None => Error::internal(REDACTED_MESSAGE),
    }
}

fn log_failure(error: &Error) {
    match error.code() {
        ErrorCode::InternalError => error!(
            message = %error.message(),
            trace_id = ?error.trace_id(),
            "internal error"
        ),
        ErrorCode::ServiceUnavailable => warn!(
            message = %error.message(),
            reason = ?error.reason(),
            trace_id = ?error.trace_id(),
            "dependency unavailable"
        ),
        _ => {}
    }
}

fn insert_code_headers(builder: &mut HttpResponseBuilder, code: ErrorCode) {
    match code {
        ErrorCode::Unauthorized => {
            builder.insert_header((header::WWW_AUTHENTICATE, AUTH_CHALLENGE));
        }
        ErrorCode::ServiceUnavailable => {
            builder.insert_header((header::RETRY_AFTER, RETRY_AFTER_SECS.to_string()));
        }
        _ => {}
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        log_failure(self);
        let mut builder = HttpResponse::build(self.status_code());
        builder.insert_header(CacheControl(vec![CacheDirective::NoStore]));
        insert_code_headers(&mut builder, self.code());
        if let Some(id) = self.trace_id() {
            builder.insert_header((TRACE_ID_HEADER, id.to_owned()));
        }
        builder.json(client_view(self))
    }
}

impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        error!(error = %err, "actix error promoted to domain error");
        Error::internal(REDACTED_MESSAGE)
    }
}
