//! Seller profiles published by users who want to list items.

use chrono::{DateTime, Utc};
use url::Url;

use super::UserId;

/// Minimum display name length, in characters.
pub const PROFILE_NAME_MIN: usize = 2;
/// Maximum display name length, in characters.
pub const PROFILE_NAME_MAX: usize = 60;
/// Maximum bio length, in characters.
pub const PROFILE_BIO_MAX: usize = 500;

/// Validation errors for [`SellerProfileDraft`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SellerProfileValidationError {
    /// The display name is shorter than [`PROFILE_NAME_MIN`].
    #[error("display name must be at least {min} characters")]
    NameTooShort {
        /// Minimum accepted length.
        min: usize,
    },
    /// The display name is longer than [`PROFILE_NAME_MAX`].
    #[error("display name must be at most {max} characters")]
    NameTooLong {
        /// Maximum accepted length.
        max: usize,
    },
    /// The bio is longer than [`PROFILE_BIO_MAX`].
    #[error("bio must be at most {max} characters")]
    BioTooLong {
        /// Maximum accepted length.
        max: usize,
    },
    /// The photo URL is not an absolute http(s) URL.
    #[error("photo URL must be an absolute http or https URL")]
    InvalidPhotoUrl,
}

impl SellerProfileValidationError {
    /// Request field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::NameTooShort { .. } | Self::NameTooLong { .. } => "displayName",
            Self::BioTooLong { .. } => "bio",
            Self::InvalidPhotoUrl => "photoUrl",
        }
    }

    /// Machine-readable reason.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NameTooShort { .. } => "too_short",
            Self::NameTooLong { .. } | Self::BioTooLong { .. } => "too_long",
            Self::InvalidPhotoUrl => "invalid_url",
        }
    }
}

/// Validated profile fields submitted by a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SellerProfileDraft {
    display_name: String,
    bio: Option<String>,
    photo_url: Option<Url>,
}

impl SellerProfileDraft {
    /// Validate raw profile input.
    ///
    /// Blank optional fields are treated as absent.
    ///
    /// # Examples
    /// ```
    /// use storefront::domain::SellerProfileDraft;
    ///
    /// let draft = SellerProfileDraft::try_new("Ace Tips", Some(""), None).expect("valid draft");
    /// assert_eq!(draft.display_name(), "Ace Tips");
    /// assert!(draft.bio().is_none());
    /// ```
    pub fn try_new(
        display_name: &str,
        bio: Option<&str>,
        photo_url: Option<&str>,
    ) -> Result<Self, SellerProfileValidationError> {
        let display_name = display_name.trim();
        let name_len = display_name.chars().count();
        if name_len < PROFILE_NAME_MIN {
            return Err(SellerProfileValidationError::NameTooShort {
                min: PROFILE_NAME_MIN,
            });
        }
        if name_len > PROFILE_NAME_MAX {
            return Err(SellerProfileValidationError::NameTooLong {
                max: PROFILE_NAME_MAX,
            });
        }

        let bio = bio.map(str::trim).filter(|value| !value.is_empty());
        if bio.is_some_and(|value| value.chars().count() > PROFILE_BIO_MAX) {
            return Err(SellerProfileValidationError::BioTooLong {
                max: PROFILE_BIO_MAX,
            });
        }

        let photo_url = photo_url
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(parse_photo_url)
            .transpose()?;

        Ok(Self {
            display_name: display_name.to_owned(),
            bio: bio.map(str::to_owned),
            photo_url,
        })
    }

    /// Public name.
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Optional biography.
    pub fn bio(&self) -> Option<&str> {
        self.bio.as_deref()
    }

    /// Optional avatar URL.
    pub fn photo_url(&self) -> Option<&Url> {
        self.photo_url.as_ref()
    }
}

fn parse_photo_url(raw: &str) -> Result<Url, SellerProfileValidationError> {
    let url = Url::parse(raw).map_err(|_| SellerProfileValidationError::InvalidPhotoUrl)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(SellerProfileValidationError::InvalidPhotoUrl),
    }
}

/// A stored seller profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SellerProfile {
    /// Owning user.
    pub user_id: UserId,
    /// Public name.
    pub display_name: String,
    /// Optional biography.
    pub bio: Option<String>,
    /// Optional avatar URL.
    pub photo_url: Option<Url>,
    /// Set by an administrator.
    pub is_approved: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl SellerProfile {
    /// Apply `draft` on top of an existing profile, or create one.
    ///
    /// Approval survives edits.
    pub fn apply(
        existing: Option<Self>,
        user_id: UserId,
        draft: &SellerProfileDraft,
        now: DateTime<Utc>,
    ) -> Self {
        let (is_approved, created_at) = existing
            .map(|profile| (profile.is_approved, profile.created_at))
            .unwrap_or((false, now));
        Self {
            user_id,
            display_name: draft.display_name().to_owned(),
            bio: draft.bio().map(str::to_owned),
            photo_url: draft.photo_url().cloned(),
            is_approved,
            created_at,
            updated_at: now,
        }
    }
}
