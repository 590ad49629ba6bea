//! External identities asserted by the host messaging platform.
//!
//! An [`ExternalIdentity`] is what a verified init-data payload or session
//! token tells us about the caller. It is mapped to a local
//! [`User`](super::User) by the identity resolver.

use std::fmt;

use serde::{Deserialize, Serialize};

const EXTERNAL_ID_MAX: usize = 64;
/// Longest stored display name, in characters.
pub const DISPLAY_NAME_MAX: usize = 128;
/// Longest stored username, in characters.
pub const USERNAME_MAX: usize = 64;
const FALLBACK_DISPLAY_NAME: &str = "User";

/// Validation errors for [`ExternalId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExternalIdError {
    /// The identifier was empty once trimmed.
    #[error("external id must not be empty")]
    Empty,
    /// The identifier exceeded the storage limit.
    #[error("external id must be at most {max} characters")]
    TooLong {
        /// Maximum accepted length.
        max: usize,
    },
    /// The identifier contained whitespace or control characters.
    #[error("external id must not contain whitespace or control characters")]
    InvalidCharacters,
}

/// Identifier of a user on the host platform, stable across sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExternalId(String);

impl ExternalId {
    /// Validate and construct an [`ExternalId`].
    ///
    /// # Examples
    /// ```
    /// use storefront::domain::ExternalId;
    ///
    /// let id = ExternalId::new("424242").expect("valid id");
    /// assert_eq!(id.as_ref(), "424242");
    /// assert!(ExternalId::new(" ").is_err());
    /// ```
    pub fn new(value: impl Into<String>) -> Result<Self, ExternalIdError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ExternalIdError::Empty);
        }
        if trimmed.chars().count() > EXTERNAL_ID_MAX {
            return Err(ExternalIdError::TooLong {
                max: EXTERNAL_ID_MAX,
            });
        }
        if trimmed
            .chars()
            .any(|c| c.is_whitespace() || c.is_control())
        {
            return Err(ExternalIdError::InvalidCharacters);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for ExternalId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ExternalId {
    type Error = ExternalIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ExternalId> for String {
    fn from(value: ExternalId) -> Self {
        value.0
    }
}

/// Identity claims for a caller, already verified by the caller of this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
    external_id: ExternalId,
    display_name: String,
    username: Option<String>,
}

impl ExternalIdentity {
    /// Build an identity from verified claims.
    ///
    /// A blank display name falls back to the username, then to `"User"`.
    /// Names longer than the storage limits are cut at a character boundary.
    pub fn new(
        external_id: ExternalId,
        display_name: impl Into<String>,
        username: Option<String>,
    ) -> Self {
        let username = username
            .map(|name| clamp_chars(name.trim(), USERNAME_MAX))
            .filter(|name| !name.is_empty());
        let display_name = clamp_chars(display_name.into().trim(), DISPLAY_NAME_MAX);
        let display_name = if display_name.is_empty() {
            username
                .clone()
                .unwrap_or_else(|| FALLBACK_DISPLAY_NAME.to_owned())
        } else {
            display_name
        };
        Self {
            external_id,
            display_name,
            username,
        }
    }

    /// Build an identity from the host's profile fields.
    ///
    /// The display name joins first and last names; when both are absent the
    /// username is used, then `"User"`.
    ///
    /// # Examples
    /// ```
    /// use storefront::domain::{ExternalId, ExternalIdentity};
    ///
    /// let id = ExternalId::new("7").expect("valid id");
    /// let identity = ExternalIdentity::from_profile(id, Some("Ada"), Some("Lovelace"), None);
    /// assert_eq!(identity.display_name(), "Ada Lovelace");
    /// ```
    pub fn from_profile(
        external_id: ExternalId,
        first_name: Option<&str>,
        last_name: Option<&str>,
        username: Option<&str>,
    ) -> Self {
        let display_name = [first_name, last_name]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        Self::new(external_id, display_name, username.map(str::to_owned))
    }

    /// Host platform identifier.
    pub fn external_id(&self) -> &ExternalId {
        &self.external_id
    }

    /// Human-facing name.
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Host username, when the user has one.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }
}

fn clamp_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect::<String>().trim_end().to_owned()
}
