//! Driven port for user persistence.
//!
//! Adapters must enforce uniqueness of `external_id` and report a violation
//! as [`UserRepositoryError::DuplicateExternalId`] so concurrent first contact
//! can be resolved by re-reading.

use async_trait::async_trait;

use crate::domain::{ExternalId, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// Another user already holds the external id.
        DuplicateExternalId { external_id: String } =>
            "user with external id {external_id} already exists",
    }
}

/// Storage for local user accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch the user mapped to a host identity.
    async fn find_by_external_id(
        &self,
        external_id: &ExternalId,
    ) -> Result<Option<User>, UserRepositoryError>;

    /// Fetch a user by local identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError>;

    /// Insert a new user; fails with `DuplicateExternalId` on collision.
    async fn insert(&self, user: &User) -> Result<(), UserRepositoryError>;

    /// Widen a buyer's role to `both`.
    ///
    /// Returns `false` when the stored role already allows selling.
    async fn grant_selling(&self, id: &UserId) -> Result<bool, UserRepositoryError>;
}
