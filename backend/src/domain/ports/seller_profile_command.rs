//! Driving port for seller onboarding.

use async_trait::async_trait;

use crate::domain::{Error, ExternalId, SellerProfile, SellerProfileDraft, User, UserId};

/// Result of publishing a seller profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedProfile {
    /// The user after any role upgrade.
    pub user: User,
    /// The stored profile.
    pub profile: SellerProfile,
}

/// Seller profile writes and the seller-area gate.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SellerProfileCommand: Send + Sync {
    /// Create or replace the caller's seller profile, upgrading a buyer to
    /// `both`.
    async fn publish_profile(
        &self,
        user: &User,
        draft: SellerProfileDraft,
    ) -> Result<PublishedProfile, Error>;

    /// Approve a seller. Only administrators may call this.
    ///
    /// # Errors
    ///
    /// Returns `forbidden` with reason `not_admin` for other callers and
    /// `not_found` when the user has no profile.
    async fn approve_seller(&self, caller: &ExternalId, user_id: &UserId) -> Result<(), Error>;

    /// Admit `user` to the seller area, returning their profile.
    ///
    /// # Errors
    ///
    /// Returns `forbidden` with reason `not_seller` when the user cannot sell
    /// or has no profile, and `seller_not_approved` while the profile awaits
    /// approval.
    async fn seller_access(&self, user: &User) -> Result<SellerProfile, Error>;
}
