//! Driven port for seller profiles.

use async_trait::async_trait;

use crate::domain::{SellerProfile, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by seller profile adapters.
    pub enum SellerProfileRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "seller profile repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "seller profile repository query failed: {message}",
    }
}

/// Storage for seller profiles, one per user.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SellerProfileRepository: Send + Sync {
    /// Fetch the profile owned by `user_id`.
    async fn find(&self, user_id: &UserId)
    -> Result<Option<SellerProfile>, SellerProfileRepositoryError>;

    /// Insert the profile owned by `profile.user_id` or update its public
    /// fields. The stored approval flag is left untouched; only
    /// [`approve`](Self::approve) changes it.
    async fn save(&self, profile: &SellerProfile) -> Result<(), SellerProfileRepositoryError>;

    /// Mark a profile approved. Returns `false` when no profile exists.
    async fn approve(&self, user_id: &UserId) -> Result<bool, SellerProfileRepositoryError>;

    /// Profiles ordered by creation time, newest first.
    async fn list_recent(&self, limit: u32)
    -> Result<Vec<SellerProfile>, SellerProfileRepositoryError>;
}
