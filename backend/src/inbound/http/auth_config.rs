//! Authentication configuration parsing and validation.
//!
//! Secrets and cookie toggles come from the environment through
//! [`mockable::Env`] so they can be validated in isolation. Debug builds
//! tolerate missing toggles with warnings; release builds require them.

use std::path::PathBuf;

use mockable::Env;
use rand::RngCore;
use tracing::warn;
use zeroize::{Zeroize, Zeroizing};

use crate::domain::AdminAllowList;

const SESSION_SECRET_DEFAULT_PATH: &str = "/var/run/secrets/session_secret";
/// Minimum session signing key length accepted in release builds.
pub const SESSION_SECRET_MIN_LEN: usize = 32;
pub const BOT_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";
pub const SECRET_FILE_ENV: &str = "SESSION_SECRET_FILE";
pub const COOKIE_SECURE_ENV: &str = "SESSION_COOKIE_SECURE";
pub const ALLOW_EPHEMERAL_ENV: &str = "SESSION_ALLOW_EPHEMERAL";
/// Comma-separated external ids granted administrator rights.
pub const ADMIN_IDS_ENV: &str = "ADMIN_EXTERNAL_IDS";
pub const PAYMENT_SECRET_ENV: &str = "PAYMENT_SECRET_KEY";
const BOOL_EXPECTED: &str = "1|0|true|false|yes|no|y|n";

/// Build mode for configuration validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Debug builds tolerate defaults and emit warnings for missing toggles.
    Debug,
    /// Release builds require explicit, valid toggles.
    Release,
}

impl BuildMode {
    /// Determine the build mode from `cfg!(debug_assertions)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use storefront::inbound::http::auth_config::BuildMode;
    ///
    /// let mode = BuildMode::from_debug_assertions();
    /// if cfg!(debug_assertions) {
    ///     assert_eq!(mode, BuildMode::Debug);
    /// } else {
    ///     assert_eq!(mode, BuildMode::Release);
    /// }
    /// ```
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Secrets and toggles needed to authenticate callers.
pub struct AuthSettings {
    /// HS256 key for session tokens.
    pub session_key: Zeroizing<Vec<u8>>,
    /// Whether the session cookie is marked `Secure`.
    pub cookie_secure: bool,
    /// Bot token used to check init data signatures and send notifications.
    pub bot_token: Zeroizing<String>,
    /// External ids with administrator rights.
    pub admins: AdminAllowList,
    /// Payment gateway secret key.
    pub payment_secret: Zeroizing<String>,
}

/// Errors raised while validating authentication configuration.
#[derive(thiserror::Error, Debug)]
pub enum AuthConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {name}")]
    MissingEnv { name: &'static str },
    /// A variable is present but contains an invalid value.
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    /// Reading the session secret file failed.
    #[error("failed to read session secret at {path}: {source}")]
    SecretRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The session secret is too short for release builds.
    #[error("session secret at {path} too short: need >= {min_len} bytes, got {length}")]
    SecretTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
    /// Release builds must not allow ephemeral session keys.
    #[error("SESSION_ALLOW_EPHEMERAL must be 0 in release builds")]
    EphemeralNotAllowed,
}

/// Build authentication settings from environment variables and build mode.
///
/// # Examples
///
/// ```rust
/// use mockable::MockEnv;
/// use storefront::inbound::http::auth_config::{BuildMode, auth_settings_from_env};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let key_path = std::env::temp_dir().join("session_secret_example");
/// std::fs::write(&key_path, vec![b'k'; 32])?;
///
/// let key_path = key_path.to_str().expect("valid path").to_string();
/// let mut env = MockEnv::new();
/// let secret_path = key_path.clone();
/// env.expect_string().returning(move |name| match name {
///     "TELEGRAM_BOT_TOKEN" => Some("123:abc".to_string()),
///     "SESSION_SECRET_FILE" => Some(secret_path.clone()),
///     "SESSION_COOKIE_SECURE" => Some("1".to_string()),
///     "SESSION_ALLOW_EPHEMERAL" => Some("0".to_string()),
///     "ADMIN_EXTERNAL_IDS" => Some("101,202".to_string()),
///     "PAYMENT_SECRET_KEY" => Some("sk_test_x".to_string()),
///     _ => None,
/// });
///
/// let settings = auth_settings_from_env(&env, BuildMode::Release)?;
/// assert!(settings.cookie_secure);
/// assert_eq!(settings.admins.len(), 2);
///
/// std::fs::remove_file(&key_path)?;
/// # Ok(())
/// # }
/// ```
pub fn auth_settings_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<AuthSettings, AuthConfigError> {
    let bot_token = required_secret(env, BOT_TOKEN_ENV)?;
    let cookie_secure = bool_from_env(env, mode, COOKIE_SECURE_ENV, true)?;
    let allow_ephemeral = allow_ephemeral_from_env(env, mode)?;
    let session_key = session_key_from_env(env, mode, allow_ephemeral)?;
    let admins = env
        .string(ADMIN_IDS_ENV)
        .map(|raw| AdminAllowList::from_csv(&raw))
        .unwrap_or_default();
    let payment_secret = payment_secret_from_env(env, mode)?;

    Ok(AuthSettings {
        session_key,
        cookie_secure,
        bot_token,
        admins,
        payment_secret,
    })
}

fn required_secret<E: Env>(
    env: &E,
    name: &'static str,
) -> Result<Zeroizing<String>, AuthConfigError> {
    env.string(name)
        .map(|value| Zeroizing::new(value.trim().to_owned()))
        .filter(|value| !value.is_empty())
        .ok_or(AuthConfigError::MissingEnv { name })
}

fn payment_secret_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<Zeroizing<String>, AuthConfigError> {
    match required_secret(env, PAYMENT_SECRET_ENV) {
        Ok(secret) => Ok(secret),
        Err(error) if mode.is_debug() => {
            warn!("{error}; payment verification will be rejected by the gateway");
            Ok(Zeroizing::new(String::new()))
        }
        Err(error) => Err(error),
    }
}

fn bool_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
    name: &'static str,
    default_value: bool,
) -> Result<bool, AuthConfigError> {
    match env.string(name) {
        Some(value) => match parse_bool(&value) {
            Some(flag) => Ok(flag),
            None if mode.is_debug() => {
                warn!(value = %value, "invalid {name}; defaulting to {default_value}");
                Ok(default_value)
            }
            None => Err(AuthConfigError::InvalidEnv {
                name,
                value,
                expected: BOOL_EXPECTED,
            }),
        },
        None if mode.is_debug() => {
            warn!("{name} not set; defaulting to {default_value}");
            Ok(default_value)
        }
        None => Err(AuthConfigError::MissingEnv { name }),
    }
}

fn allow_ephemeral_from_env<E: Env>(env: &E, mode: BuildMode) -> Result<bool, AuthConfigError> {
    let allow = bool_from_env(env, mode, ALLOW_EPHEMERAL_ENV, false)?;
    if allow && !mode.is_debug() {
        return Err(AuthConfigError::EphemeralNotAllowed);
    }
    Ok(allow)
}

fn session_key_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
    allow_ephemeral: bool,
) -> Result<Zeroizing<Vec<u8>>, AuthConfigError> {
    let path = PathBuf::from(
        env.string(SECRET_FILE_ENV)
            .unwrap_or_else(|| SESSION_SECRET_DEFAULT_PATH.to_owned()),
    );

    match std::fs::read(&path) {
        Ok(mut bytes) => {
            let length = bytes.len();
            if mode == BuildMode::Release && length < SESSION_SECRET_MIN_LEN {
                bytes.zeroize();
                return Err(AuthConfigError::SecretTooShort {
                    path,
                    length,
                    min_len: SESSION_SECRET_MIN_LEN,
                });
            }
            Ok(Zeroizing::new(bytes))
        }
        Err(error) if mode.is_debug() || allow_ephemeral => {
            warn!(
                path = %path.display(),
                error = %error,
                "using temporary session secret (dev only)"
            );
            let mut key = Zeroizing::new(vec![0_u8; SESSION_SECRET_MIN_LEN]);
            rand::thread_rng().fill_bytes(key.as_mut_slice());
            Ok(key)
        }
        Err(error) => Err(AuthConfigError::SecretRead {
            path,
            source: error,
        }),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}
