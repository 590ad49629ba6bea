//! Verification of the host platform's signed launch payload ("init data").
//!
//! The payload is a URL-encoded form. Its `hash` field is
//! `hex(HMAC_SHA256(secret, check_string))` where
//! `secret = HMAC_SHA256(key = "WebAppData", message = bot_token)` and the
//! check string joins every other `key=value` pair, sorted by key, with `\n`.
//! The embedded `user` field is a JSON object describing the caller.

use hmac::digest::{Key, KeyInit};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use url::form_urlencoded;
use zeroize::{Zeroize, Zeroizing};

use super::{ExternalId, ExternalIdentity};

pub(crate) type HmacSha256 = Hmac<Sha256>;

/// Fixed key used to derive the validation secret from the bot token.
const DERIVATION_KEY: &[u8] = b"WebAppData";
const HASH_FIELD: &str = "hash";
const USER_FIELD: &str = "user";

/// Reasons an init-data payload is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InitDataError {
    /// The payload was empty.
    #[error("init data is empty")]
    Empty,
    /// The payload has no `hash` field.
    #[error("init data carries no hash")]
    MissingHash,
    /// The `hash` field does not match the payload.
    #[error("init data signature does not match")]
    BadSignature,
    /// The signature is valid but no `user` field is present.
    #[error("init data carries no user identity")]
    NoIdentity,
    /// The `user` field could not be decoded into an identity.
    #[error("init data user field is malformed: {message}")]
    MalformedIdentity {
        /// Decoder diagnostic.
        message: String,
    },
}

impl InitDataError {
    /// Machine-readable reason reported to clients.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Empty | Self::MissingHash | Self::BadSignature => "invalid",
            Self::NoIdentity | Self::MalformedIdentity { .. } => "no_identity",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HostUserId {
    Number(i64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct HostUser {
    id: HostUserId,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    username: Option<String>,
}

/// Validates init-data payloads against a bot token.
///
/// The derived secret is computed once at construction.
///
/// # Examples
/// ```
/// use storefront::domain::init_data::{InitDataValidator, sign_init_data};
///
/// let payload = sign_init_data(
///     &[("auth_date", "1700000000"), ("user", r#"{"id":42,"first_name":"Ada"}"#)],
///     "123:token",
/// );
/// let identity = InitDataValidator::new("123:token")
///     .validate(&payload)
///     .expect("payload verifies");
/// assert_eq!(identity.external_id().as_ref(), "42");
/// ```
pub struct InitDataValidator {
    secret: Zeroizing<[u8; 32]>,
}

impl InitDataValidator {
    /// Derive the validation secret from `bot_token`.
    pub fn new(bot_token: &str) -> Self {
        Self {
            secret: Zeroizing::new(hmac_sha256(DERIVATION_KEY, bot_token.as_bytes())),
        }
    }

    /// Verify `raw` and extract the identity it asserts.
    ///
    /// # Errors
    /// Returns [`InitDataError`] when the payload is empty, unsigned, signed
    /// with a different token, or lacks a usable `user` field.
    pub fn validate(&self, raw: &str) -> Result<ExternalIdentity, InitDataError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(InitDataError::Empty);
        }

        let mut provided_hash = None;
        let mut fields = Vec::new();
        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            if key == HASH_FIELD {
                provided_hash.get_or_insert(value.into_owned());
            } else {
                fields.push((key.into_owned(), value.into_owned()));
            }
        }
        let provided_hash = provided_hash
            .filter(|hash| !hash.is_empty())
            .ok_or(InitDataError::MissingHash)?;

        let expected_hash = hex::encode(hmac_sha256(
            self.secret.as_slice(),
            check_string(&mut fields).as_bytes(),
        ));
        let matches: bool = expected_hash
            .as_bytes()
            .ct_eq(provided_hash.as_bytes())
            .into();
        if !matches {
            return Err(InitDataError::BadSignature);
        }

        let user_json = fields
            .iter()
            .find(|(key, _)| key == USER_FIELD)
            .map(|(_, value)| value.as_str())
            .ok_or(InitDataError::NoIdentity)?;
        parse_identity(user_json)
    }
}

/// Verify `raw` against `bot_token` without keeping the validator.
///
/// # Errors
/// See [`InitDataValidator::validate`].
pub fn validate(raw: &str, bot_token: &str) -> Result<ExternalIdentity, InitDataError> {
    InitDataValidator::new(bot_token).validate(raw)
}

/// Encode `fields` as an init-data payload signed for `bot_token`.
///
/// This is the inverse of [`InitDataValidator::validate`] and is used by local
/// tooling and tests to mint payloads.
pub fn sign_init_data(fields: &[(&str, &str)], bot_token: &str) -> String {
    let secret = Zeroizing::new(hmac_sha256(DERIVATION_KEY, bot_token.as_bytes()));
    let mut owned = fields
        .iter()
        .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
        .collect::<Vec<_>>();
    let hash = hex::encode(hmac_sha256(
        secret.as_slice(),
        check_string(&mut owned).as_bytes(),
    ));

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in &owned {
        serializer.append_pair(key, value);
    }
    serializer.append_pair(HASH_FIELD, &hash);
    serializer.finish()
}

fn check_string(fields: &mut [(String, String)]) -> String {
    fields.sort();
    fields
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn parse_identity(user_json: &str) -> Result<ExternalIdentity, InitDataError> {
    let user: HostUser =
        serde_json::from_str(user_json).map_err(|err| InitDataError::MalformedIdentity {
            message: err.to_string(),
        })?;
    let raw_id = match user.id {
        HostUserId::Number(id) => id.to_string(),
        HostUserId::Text(id) => id,
    };
    let external_id = ExternalId::new(raw_id).map_err(|err| InitDataError::MalformedIdentity {
        message: err.to_string(),
    })?;
    Ok(ExternalIdentity::from_profile(
        external_id,
        user.first_name.as_deref(),
        user.last_name.as_deref(),
        user.username.as_deref(),
    ))
}

/// HMAC-SHA256 keyed with `key` of any length.
///
/// Keys longer than the SHA-256 block are hashed first and shorter ones are
/// zero-padded, so the key always fills exactly one block.
pub(crate) fn keyed_mac(key: &[u8]) -> HmacSha256 {
    let mut block = Key::<HmacSha256>::default();
    let hashed;
    let source: &[u8] = if key.len() > block.len() {
        hashed = <Sha256 as Digest>::digest(key);
        hashed.as_slice()
    } else {
        key
    };
    for (slot, byte) in block.iter_mut().zip(source) {
        *slot = *byte;
    }
    let mac = <HmacSha256 as KeyInit>::new(&block);
    block.as_mut_slice().zeroize();
    mac
}

pub(crate) fn hmac_sha256(key: &[u8], message: &[u8]) -> [u8; 32] {
    let mut mac = keyed_mac(key);
    mac.update(message);
    let mut digest = [0_u8; 32];
    for (slot, byte) in digest.iter_mut().zip(mac.finalize().into_bytes()) {
        *slot = byte;
    }
    digest
}
