//! Administrator allow-list.
//!
//! The list is built once at start-up from configuration and handed to the
//! services that need it; there is no global lookup.

use std::collections::HashSet;

use super::{Error, ExternalId};

/// Immutable set of external ids granted administrator rights.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminAllowList {
    members: HashSet<ExternalId>,
}

impl AdminAllowList {
    /// Build the allow-list from explicit ids.
    pub fn new(members: impl IntoIterator<Item = ExternalId>) -> Self {
        Self {
            members: members.into_iter().collect(),
        }
    }

    /// Parse a comma-separated list, skipping blank and invalid entries.
    ///
    /// # Examples
    /// ```
    /// use storefront::domain::{AdminAllowList, ExternalId};
    ///
    /// let admins = AdminAllowList::from_csv("101, 202,,");
    /// assert_eq!(admins.len(), 2);
    /// assert!(admins.is_admin(&ExternalId::new("202").expect("valid id")));
    /// ```
    pub fn from_csv(raw: &str) -> Self {
        Self::new(
            raw.split(',')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .filter_map(|entry| ExternalId::new(entry).ok()),
        )
    }

    /// Whether `external_id` is an administrator.
    pub fn is_admin(&self, external_id: &ExternalId) -> bool {
        self.members.contains(external_id)
    }

    /// Reject callers that are not administrators.
    ///
    /// # Errors
    /// Returns a forbidden [`Error`] with reason `not_admin`.
    pub fn authorize(&self, external_id: &ExternalId) -> Result<(), Error> {
        if self.is_admin(external_id) {
            Ok(())
        } else {
            Err(Error::forbidden("administrator access required").with_reason("not_admin"))
        }
    }

    /// Number of administrators.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
