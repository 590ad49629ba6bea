//! Stateless session tokens.
//!
//! A session token is a compact HS256 JWS: three base64url segments
//! (`header.claims.signature`) with the signature computed over the first two.
//! Tokens carry the caller's external id, display name, and username so
//! authenticated requests need no database read to identify the caller.

use std::fmt;
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use hmac::Mac;
use mockable::Clock;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::init_data::{HmacSha256, keyed_mac};
use super::{ExternalId, ExternalIdentity};

/// Session lifetime in days.
pub const SESSION_TTL_DAYS: i64 = 30;
const ALGORITHM: &str = "HS256";
const TOKEN_TYPE: &str = "JWT";

/// Reasons a session token is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionTokenError {
    /// The signature is valid but the token is past its expiry.
    #[error("session token has expired")]
    Expired,
    /// The token is malformed or was not signed with the current key.
    #[error("session token signature is invalid")]
    BadSignature,
}

impl SessionTokenError {
    /// Machine-readable reason reported to clients.
    pub fn reason(self) -> &'static str {
        match self {
            Self::Expired => "expired",
            Self::BadSignature => "bad_signature",
        }
    }
}

/// Opaque signed session token.
///
/// `Debug` is redacted so tokens do not leak into logs.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// Borrow the encoded token.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Consume the wrapper and return the encoded token.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(..)")
    }
}

/// Verified claims of a session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCredential {
    identity: ExternalIdentity,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl SessionCredential {
    /// Identity the token was issued for.
    pub fn identity(&self) -> &ExternalIdentity {
        &self.identity
    }

    /// Issue timestamp.
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Expiry timestamp.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenHeader {
    alg: String,
    typ: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenClaims {
    sub: String,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    username: Option<String>,
    iat: i64,
    exp: i64,
}

/// Issues and verifies session tokens with a symmetric key.
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use mockable::DefaultClock;
/// use storefront::domain::{ExternalId, ExternalIdentity, SessionSigner};
///
/// let signer = SessionSigner::new(vec![7_u8; 32], Arc::new(DefaultClock));
/// let identity = ExternalIdentity::new(ExternalId::new("42").expect("id"), "Ada", None);
/// let token = signer.issue(&identity);
/// let credential = signer.verify(token.as_str()).expect("fresh token verifies");
/// assert_eq!(credential.identity(), &identity);
/// ```
pub struct SessionSigner {
    keyed: HmacSha256,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl SessionSigner {
    /// Create a signer with the default thirty-day lifetime.
    pub fn new(key: impl Into<Vec<u8>>, clock: Arc<dyn Clock>) -> Self {
        let key = Zeroizing::new(key.into());
        Self {
            keyed: keyed_mac(&key),
            ttl: Duration::days(SESSION_TTL_DAYS),
            clock,
        }
    }

    /// Override the token lifetime.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Token lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `identity`, valid from now until now + TTL.
    pub fn issue(&self, identity: &ExternalIdentity) -> SessionToken {
        let issued_at = self.clock.utc().timestamp();
        let claims = TokenClaims {
            sub: identity.external_id().to_string(),
            name: identity.display_name().to_owned(),
            username: identity.username().map(str::to_owned),
            iat: issued_at,
            exp: issued_at + self.ttl.num_seconds(),
        };
        let header = TokenHeader {
            alg: ALGORITHM.to_owned(),
            typ: TOKEN_TYPE.to_owned(),
        };
        let signing_input = format!("{}.{}", encode_json(&header), encode_json(&claims));
        let digest = self.mac(signing_input.as_bytes()).finalize().into_bytes();
        let signature = URL_SAFE_NO_PAD.encode(digest);
        SessionToken(format!("{signing_input}.{signature}"))
    }

    /// Verify `token`, checking the signature before the expiry.
    ///
    /// # Errors
    /// [`SessionTokenError::BadSignature`] for malformed or foreign tokens and
    /// [`SessionTokenError::Expired`] once `exp` has passed.
    pub fn verify(&self, token: &str) -> Result<SessionCredential, SessionTokenError> {
        let mut segments = token.trim().split('.');
        let (Some(header), Some(claims), Some(signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(SessionTokenError::BadSignature);
        };

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| SessionTokenError::BadSignature)?;
        let mut mac = self.mac(header.as_bytes());
        mac.update(b".");
        mac.update(claims.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| SessionTokenError::BadSignature)?;

        let header: TokenHeader = decode_json(header)?;
        if header.alg != ALGORITHM {
            return Err(SessionTokenError::BadSignature);
        }
        let claims: TokenClaims = decode_json(claims)?;

        let now = self.clock.utc().timestamp();
        if now >= claims.exp {
            return Err(SessionTokenError::Expired);
        }

        let external_id =
            ExternalId::new(claims.sub).map_err(|_| SessionTokenError::BadSignature)?;
        let issued_at =
            DateTime::from_timestamp(claims.iat, 0).ok_or(SessionTokenError::BadSignature)?;
        let expires_at =
            DateTime::from_timestamp(claims.exp, 0).ok_or(SessionTokenError::BadSignature)?;
        Ok(SessionCredential {
            identity: ExternalIdentity::new(external_id, claims.name, claims.username),
            issued_at,
            expires_at,
        })
    }

    fn mac(&self, input: &[u8]) -> HmacSha256 {
        let mut mac = self.keyed.clone();
        mac.update(input);
        mac
    }
}

fn encode_json<T: Serialize>(value: &T) -> String {
    // Serialising these plain structs cannot fail.
    URL_SAFE_NO_PAD.encode(serde_json::to_vec(value).unwrap_or_default())
}

fn decode_json<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, SessionTokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| SessionTokenError::BadSignature)?;
    serde_json::from_slice(&bytes).map_err(|_| SessionTokenError::BadSignature)
}
