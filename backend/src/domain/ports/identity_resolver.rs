//! Driving port mapping host identities to local users.
//!
//! Callers only reach this port with an identity that has already passed
//! signature or session verification.

use async_trait::async_trait;

use crate::domain::{Error, ExternalIdentity, User};

/// Resolve verified host identities to local accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Return the user for `identity`, creating a buyer on first contact.
    ///
    /// Concurrent first contact for the same identity yields one user.
    ///
    /// # Errors
    ///
    /// Returns `service_unavailable` when storage is unreachable and
    /// `internal_error` for other storage failures.
    async fn resolve(&self, identity: &ExternalIdentity) -> Result<User, Error>;
}
