//! Local user accounts.
//!
//! Every caller is represented by one [`User`] keyed by its external id. Users
//! start as buyers; publishing a seller profile widens the role to
//! [`UserRole::Both`]. Roles never narrow.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ExternalId, ExternalIdentity};

/// Validation errors for user primitives.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// The user id was not a UUID.
    #[error("user id must be a valid UUID")]
    InvalidId,
    /// The role name was not recognised.
    #[error("unknown user role: {value}")]
    UnknownRole {
        /// Rejected input.
        value: String,
    },
}

/// Local user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid);

impl UserId {
    /// Parse a user id from its string form.
    pub fn new(value: impl AsRef<str>) -> Result<Self, UserValidationError> {
        Uuid::parse_str(value.as_ref().trim())
            .map(Self)
            .map_err(|_| UserValidationError::InvalidId)
    }

    /// Allocate a fresh random id.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.to_string()
    }
}

/// What a user may do in the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// May purchase items.
    Buyer,
    /// May publish items.
    Seller,
    /// May purchase and publish.
    Both,
}

impl UserRole {
    /// Stable storage name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buyer => "buyer",
            Self::Seller => "seller",
            Self::Both => "both",
        }
    }

    /// Whether the role allows publishing items.
    pub fn can_sell(self) -> bool {
        matches!(self, Self::Seller | Self::Both)
    }

    /// Role after the user publishes a seller profile.
    ///
    /// # Examples
    /// ```
    /// use storefront::domain::UserRole;
    ///
    /// assert_eq!(UserRole::Buyer.with_selling(), UserRole::Both);
    /// assert_eq!(UserRole::Seller.with_selling(), UserRole::Seller);
    /// ```
    #[must_use]
    pub fn with_selling(self) -> Self {
        match self {
            Self::Buyer => Self::Both,
            other => other,
        }
    }
}

impl FromStr for UserRole {
    type Err = UserValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "buyer" => Ok(Self::Buyer),
            "seller" => Ok(Self::Seller),
            "both" => Ok(Self::Both),
            other => Err(UserValidationError::UnknownRole {
                value: other.to_owned(),
            }),
        }
    }
}

/// A local user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Local identifier.
    pub id: UserId,
    /// Host platform identifier; unique across users.
    pub external_id: ExternalId,
    /// Display name captured at first contact.
    pub display_name: String,
    /// Host username captured at first contact.
    pub username: Option<String>,
    /// Current role.
    pub role: UserRole,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Build the account created the first time an identity is seen.
    pub fn first_contact(id: UserId, identity: &ExternalIdentity, now: DateTime<Utc>) -> Self {
        Self {
            id,
            external_id: identity.external_id().clone(),
            display_name: identity.display_name().to_owned(),
            username: identity.username().map(str::to_owned),
            role: UserRole::Buyer,
            created_at: now,
        }
    }

    /// Synthetic contact address handed to the payment gateway.
    pub fn contact_email(&self) -> String {
        let local = self.username.as_deref().unwrap_or(self.external_id.as_ref());
        format!("{local}@telegram.user")
    }
}
