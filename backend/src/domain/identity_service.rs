//! Identity resolution service.
//!
//! Implements [`IdentityResolver`] over a [`UserRepository`]. First contact
//! inserts a buyer; a unique violation on insert means another request won
//! the race, and the stored user is re-read.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, info};

use crate::domain::ports::{IdentityResolver, UserRepository, UserRepositoryError};
use crate::domain::{Error, ExternalIdentity, User, UserId};

/// Identity resolver backed by a user repository.
#[derive(Clone)]
pub struct IdentityService<U> {
    users: Arc<U>,
    clock: Arc<dyn Clock>,
}

impl<U> IdentityService<U> {
    /// Create a resolver over `users`.
    pub fn new(users: Arc<U>, clock: Arc<dyn Clock>) -> Self {
        Self { users, clock }
    }
}

pub(crate) fn map_user_error(error: UserRepositoryError) -> Error {
    match error {
        UserRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserRepositoryError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserRepositoryError::DuplicateExternalId { external_id } => {
            Error::internal(format!("unexpected duplicate user for {external_id}"))
        }
    }
}

impl<U> IdentityService<U>
where
    U: UserRepository,
{
    async fn find(&self, identity: &ExternalIdentity) -> Result<Option<User>, Error> {
        self.users
            .find_by_external_id(identity.external_id())
            .await
            .map_err(map_user_error)
    }
}

#[async_trait]
impl<U> IdentityResolver for IdentityService<U>
where
    U: UserRepository,
{
    async fn resolve(&self, identity: &ExternalIdentity) -> Result<User, Error> {
        if let Some(user) = self.find(identity).await? {
            return Ok(user);
        }

        let user = User::first_contact(UserId::random(), identity, self.clock.utc());
        match self.users.insert(&user).await {
            Ok(()) => {
                info!(user_id = %user.id, external_id = %user.external_id, "created user on first contact");
                Ok(user)
            }
            Err(UserRepositoryError::DuplicateExternalId { .. }) => {
                debug!(external_id = %user.external_id, "lost first-contact race; re-reading user");
                self.find(identity).await?.ok_or_else(|| {
                    Error::internal("user vanished after duplicate external id")
                })
            }
            Err(err) => Err(map_user_error(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for identity resolution.

    use super::*;
    use crate::domain::ports::MockUserRepository;
    use crate::domain::{ErrorCode, ExternalId, UserRole};
    use chrono::Utc;
    use mockable::DefaultClock;
    use rstest::{fixture, rstest};

    #[fixture]
    fn identity() -> ExternalIdentity {
        ExternalIdentity::new(
            ExternalId::new("777").expect("valid id"),
            "Ada",
            Some("ada".to_owned()),
        )
    }

    fn service(repo: MockUserRepository) -> IdentityService<MockUserRepository> {
        IdentityService::new(Arc::new(repo), Arc::new(DefaultClock))
    }

    #[rstest]
    #[tokio::test]
    async fn returns_existing_user_without_inserting(identity: ExternalIdentity) {
        let existing = User::first_contact(UserId::random(), &identity, Utc::now());
        let expected = existing.clone();
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_external_id()
            .times(1)
            .return_once(move |_| Ok(Some(existing)));
        repo.expect_insert().times(0);

        let user = service(repo).resolve(&identity).await.expect("resolves");
        assert_eq!(user, expected);
    }

    #[rstest]
    #[tokio::test]
    async fn creates_buyer_on_first_contact(identity: ExternalIdentity) {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_external_id()
            .times(1)
            .return_once(|_| Ok(None));
        repo.expect_insert()
            .withf(|user| user.role == UserRole::Buyer && user.external_id.as_ref() == "777")
            .times(1)
            .return_once(|_| Ok(()));

        let user = service(repo).resolve(&identity).await.expect("resolves");
        assert_eq!(user.role, UserRole::Buyer);
        assert_eq!(user.display_name, "Ada");
    }

    #[rstest]
    #[tokio::test]
    async fn rereads_after_losing_the_insert_race(identity: ExternalIdentity) {
        let winner = User::first_contact(UserId::random(), &identity, Utc::now());
        let winner_id = winner.id;
        let mut repo = MockUserRepository::new();
        let mut seq = mockall::Sequence::new();
        repo.expect_find_by_external_id()
            .times(1)
            .in_sequence(&mut seq)
            .return_once(|_| Ok(None));
        repo.expect_insert()
            .times(1)
            .in_sequence(&mut seq)
            .return_once(|_| Err(UserRepositoryError::duplicate_external_id("777")));
        repo.expect_find_by_external_id()
            .times(1)
            .in_sequence(&mut seq)
            .return_once(move |_| Ok(Some(winner)));

        let user = service(repo).resolve(&identity).await.expect("resolves");
        assert_eq!(user.id, winner_id);
    }

    #[rstest]
    #[case(UserRepositoryError::connection("refused"), ErrorCode::ServiceUnavailable)]
    #[case(UserRepositoryError::query("syntax"), ErrorCode::InternalError)]
    #[tokio::test]
    async fn maps_repository_failures(
        identity: ExternalIdentity,
        #[case] failure: UserRepositoryError,
        #[case] expected: ErrorCode,
    ) {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_external_id()
            .times(1)
            .return_once(move |_| Err(failure));

        let error = service(repo).resolve(&identity).await.expect_err("fails");
        assert_eq!(error.code(), expected);
    }
}
