//! Caller authentication for HTTP handlers.
//!
//! Every identity-dependent handler takes an [`AuthenticatedCaller`]; public
//! reads that personalise their answer take an [`OptionalCaller`]. Both turn
//! the request's credential into a verified [`ExternalIdentity`] and resolve
//! it to a local [`User`]. Identity values supplied in request bodies are
//! never trusted.

use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;
use tracing::debug;

use crate::domain::{Error, ExternalIdentity, User};

use super::session::{Credential, credential_from_request};
use super::state::{HttpAuth, HttpState};

/// Turn a presented credential into a verified identity.
///
/// # Errors
/// Returns `401 Unauthorized` with `details.code` set to the rejection
/// reason: `invalid` or `no_identity` for init data, `expired` or
/// `bad_signature` for session tokens.
pub fn verify_credential(auth: &HttpAuth, credential: &Credential) -> Result<ExternalIdentity, Error> {
    match credential {
        Credential::InitData(raw) => auth.init_data.validate(raw).map_err(|error| {
            debug!(reason = error.reason(), "init data rejected");
            Error::unauthorized("init data could not be verified").with_reason(error.reason())
        }),
        Credential::Session(token) => auth
            .sessions
            .verify(token)
            .map(|credential| credential.identity().clone())
            .map_err(|error| {
                debug!(reason = error.reason(), "session token rejected");
                Error::unauthorized("session is not valid").with_reason(error.reason())
            }),
    }
}

fn missing_credentials() -> Error {
    Error::unauthorized("authentication required").with_reason("missing_credentials")
}

fn state_from(req: &HttpRequest) -> Result<web::Data<HttpState>, Error> {
    req.app_data::<web::Data<HttpState>>()
        .cloned()
        .ok_or_else(|| Error::internal("HTTP state is not registered"))
}

/// A caller whose credential verified and whose user record exists.
#[derive(Debug, Clone)]
pub struct AuthenticatedCaller {
    user: User,
    identity: ExternalIdentity,
}

impl AuthenticatedCaller {
    /// The caller's local account.
    pub fn user(&self) -> &User {
        &self.user
    }

    /// The verified identity the caller presented.
    pub fn identity(&self) -> &ExternalIdentity {
        &self.identity
    }

    /// Consume the caller, keeping the user.
    pub fn into_user(self) -> User {
        self.user
    }
}

impl FromRequest for AuthenticatedCaller {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = state_from(req);
        let credential = credential_from_request(req);
        Box::pin(async move {
            let state = state?;
            let credential = credential.ok_or_else(missing_credentials)?;
            let identity = verify_credential(&state.auth, &credential)?;
            let user = state.identity.resolve(&identity).await?;
            Ok(Self { user, identity })
        })
    }
}

/// A caller who may be anonymous.
///
/// Missing or unverifiable credentials yield an anonymous caller; store
/// failures while resolving a verified identity still fail the request.
#[derive(Debug, Clone)]
pub struct OptionalCaller(Option<User>);

impl OptionalCaller {
    /// The caller's account, when they authenticated.
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }
}

impl FromRequest for OptionalCaller {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = state_from(req);
        let credential = credential_from_request(req);
        Box::pin(async move {
            let state = state?;
            let Some(credential) = credential else {
                return Ok(Self(None));
            };
            let Ok(identity) = verify_credential(&state.auth, &credential) else {
                return Ok(Self(None));
            };
            let user = state.identity.resolve(&identity).await?;
            Ok(Self(Some(user)))
        })
    }
}
