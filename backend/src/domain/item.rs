//! Sellable items and the gated booking code they carry.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UserId;

/// Validation errors for item primitives.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ItemValidationError {
    /// The item id was not a UUID.
    #[error("item id must be a valid UUID")]
    InvalidId,
    /// Amounts are stored in minor units and cannot be negative.
    #[error("amount must not be negative, got {value}")]
    NegativeAmount {
        /// Rejected input.
        value: i64,
    },
}

/// Item identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemId(Uuid);

impl ItemId {
    /// Parse an item id from its string form.
    pub fn new(value: impl AsRef<str>) -> Result<Self, ItemValidationError> {
        Uuid::parse_str(value.as_ref().trim())
            .map(Self)
            .map_err(|_| ItemValidationError::InvalidId)
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

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ItemId {
    type Error = ItemValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ItemId> for String {
    fn from(value: ItemId) -> Self {
        value.to_string()
    }
}

/// Money in the currency's minor units (kobo for NGN).
///
/// # Examples
/// ```
/// use storefront::domain::Amount;
///
/// let price = Amount::new(50_000).expect("non-negative");
/// assert_eq!(price.minor_units(), 50_000);
/// assert!(Amount::new(-1).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Amount(i64);

impl Amount {
    /// Validate and wrap a minor-unit amount.
    pub fn new(minor_units: i64) -> Result<Self, ItemValidationError> {
        if minor_units < 0 {
            return Err(ItemValidationError::NegativeAmount { value: minor_units });
        }
        Ok(Self(minor_units))
    }

    /// Value in minor units.
    pub fn minor_units(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for Amount {
    type Error = ItemValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for i64 {
    fn from(value: Amount) -> Self {
        value.0
    }
}

/// Secret payload disclosed only to buyers with a completed purchase.
///
/// `Debug` is redacted so the code cannot reach logs by accident.
#[derive(Clone, PartialEq, Eq)]
pub struct BookingCode(String);

impl BookingCode {
    /// Wrap a booking code.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Reveal the code.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for BookingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BookingCode(..)")
    }
}

/// A sellable item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Identifier.
    pub id: ItemId,
    /// Publishing user.
    pub seller_id: UserId,
    /// Public title.
    pub title: String,
    /// Price in minor units.
    pub price: Amount,
    /// Gated payload.
    pub booking_code: BookingCode,
}

impl Item {
    /// Project the item for a viewer.
    ///
    /// The booking code is included only when `purchased` is true.
    pub fn view(&self, purchased: bool) -> ItemView {
        ItemView {
            id: self.id,
            seller_id: self.seller_id,
            title: self.title.clone(),
            price: self.price,
            booking_code: purchased.then(|| self.booking_code.clone()),
            is_purchased: purchased,
        }
    }
}

/// Item as seen by a particular viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemView {
    /// Identifier.
    pub id: ItemId,
    /// Publishing user.
    pub seller_id: UserId,
    /// Public title.
    pub title: String,
    /// Price in minor units.
    pub price: Amount,
    /// Present only when the viewer completed a purchase.
    pub booking_code: Option<BookingCode>,
    /// Whether the viewer completed a purchase.
    pub is_purchased: bool,
}
