//! Seller onboarding service.
//!
//! Publishing a profile stores it and then widens the owner's role; approval
//! is restricted to the injected administrator allow-list.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use super::identity_service::map_user_error;
use crate::domain::ports::{
    PublishedProfile, SellerProfileCommand, SellerProfileRepository,
    SellerProfileRepositoryError, UserRepository,
};
use crate::domain::{
    AdminAllowList, Error, ExternalId, SellerProfile, SellerProfileDraft, User, UserId,
};

/// Seller profile command backed by user and profile repositories.
#[derive(Clone)]
pub struct SellerProfileService<U, S> {
    users: Arc<U>,
    profiles: Arc<S>,
    admins: Arc<AdminAllowList>,
    clock: Arc<dyn Clock>,
}

impl<U, S> SellerProfileService<U, S> {
    /// Create the service.
    pub fn new(
        users: Arc<U>,
        profiles: Arc<S>,
        admins: Arc<AdminAllowList>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            profiles,
            admins,
            clock,
        }
    }
}

pub(crate) fn map_profile_error(error: SellerProfileRepositoryError) -> Error {
    match error {
        SellerProfileRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("seller profile repository unavailable: {message}"))
        }
        SellerProfileRepositoryError::Query { message } => {
            Error::internal(format!("seller profile repository error: {message}"))
        }
    }
}

#[async_trait]
impl<U, S> SellerProfileCommand for SellerProfileService<U, S>
where
    U: UserRepository,
    S: SellerProfileRepository,
{
    async fn publish_profile(
        &self,
        user: &User,
        draft: SellerProfileDraft,
    ) -> Result<PublishedProfile, Error> {
        let existing = self
            .profiles
            .find(&user.id)
            .await
            .map_err(map_profile_error)?;
        let profile = SellerProfile::apply(existing, user.id, &draft, self.clock.utc());
        self.profiles
            .save(&profile)
            .await
            .map_err(map_profile_error)?;

        let mut user = user.clone();
        let upgraded = user.role.with_selling();
        if upgraded != user.role {
            self.users
                .grant_selling(&user.id)
                .await
                .map_err(map_user_error)?;
            info!(user_id = %user.id, from = user.role.as_str(), to = upgraded.as_str(), "upgraded user role");
            user.role = upgraded;
        }

        Ok(PublishedProfile { user, profile })
    }

    async fn approve_seller(&self, caller: &ExternalId, user_id: &UserId) -> Result<(), Error> {
        self.admins.authorize(caller)?;
        let approved = self
            .profiles
            .approve(user_id)
            .await
            .map_err(map_profile_error)?;
        if !approved {
            return Err(Error::not_found(format!(
                "no seller profile for user {user_id}"
            )));
        }
        info!(user_id = %user_id, admin = %caller, "approved seller");
        Ok(())
    }

    async fn seller_access(&self, user: &User) -> Result<SellerProfile, Error> {
        let not_seller = || Error::forbidden("seller profile required").with_reason("not_seller");
        if !user.role.can_sell() {
            return Err(not_seller());
        }
        let profile = self
            .profiles
            .find(&user.id)
            .await
            .map_err(map_profile_error)?
            .ok_or_else(not_seller)?;
        if !profile.is_approved {
            return Err(Error::forbidden("seller profile awaits approval")
                .with_reason("seller_not_approved"));
        }
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for seller onboarding.

    use super::*;
    use crate::domain::ports::{MockSellerProfileRepository, MockUserRepository};
    use crate::domain::{ErrorCode, ExternalIdentity, UserRole};
    use chrono::Utc;
    use mockable::DefaultClock;
    use rstest::{fixture, rstest};

    #[fixture]
    fn buyer() -> User {
        let identity = ExternalIdentity::new(
            ExternalId::new("1234").expect("valid id"),
            "Tipster",
            None,
        );
        User::first_contact(UserId::random(), &identity, Utc::now())
    }

    fn service(
        users: MockUserRepository,
        profiles: MockSellerProfileRepository,
        admins: &str,
    ) -> SellerProfileService<MockUserRepository, MockSellerProfileRepository> {
        SellerProfileService::new(
            Arc::new(users),
            Arc::new(profiles),
            Arc::new(AdminAllowList::from_csv(admins)),
            Arc::new(DefaultClock),
        )
    }

    fn draft() -> SellerProfileDraft {
        SellerProfileDraft::try_new("Ace Tips", Some("Daily accas"), None).expect("valid draft")
    }

    #[rstest]
    #[tokio::test]
    async fn publishing_upgrades_buyers(buyer: User) {
        let mut profiles = MockSellerProfileRepository::new();
        profiles.expect_find().times(1).return_once(|_| Ok(None));
        profiles.expect_save().times(1).return_once(|_| Ok(()));
        let mut users = MockUserRepository::new();
        users
            .expect_grant_selling()
            .times(1)
            .return_once(|_| Ok(true));

        let published = service(users, profiles, "")
            .publish_profile(&buyer, draft())
            .await
            .expect("published");
        assert_eq!(published.user.role, UserRole::Both);
        assert_eq!(published.profile.display_name, "Ace Tips");
        assert!(!published.profile.is_approved);
    }

    #[rstest]
    #[tokio::test]
    async fn sellers_keep_their_role(mut buyer: User) {
        buyer.role = UserRole::Seller;
        let mut profiles = MockSellerProfileRepository::new();
        profiles.expect_find().times(1).return_once(|_| Ok(None));
        profiles.expect_save().times(1).return_once(|_| Ok(()));
        let mut users = MockUserRepository::new();
        users.expect_grant_selling().times(0);

        let published = service(users, profiles, "")
            .publish_profile(&buyer, draft())
            .await
            .expect("published");
        assert_eq!(published.user.role, UserRole::Seller);
    }

    #[rstest]
    #[tokio::test]
    async fn failed_saves_do_not_upgrade(buyer: User) {
        let mut profiles = MockSellerProfileRepository::new();
        profiles.expect_find().times(1).return_once(|_| Ok(None));
        profiles
            .expect_save()
            .times(1)
            .return_once(|_| Err(SellerProfileRepositoryError::connection("down")));
        let mut users = MockUserRepository::new();
        users.expect_grant_selling().times(0);

        let error = service(users, profiles, "")
            .publish_profile(&buyer, draft())
            .await
            .expect_err("save fails");
        assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
    }

    #[rstest]
    #[tokio::test]
    async fn only_admins_approve() {
        let mut profiles = MockSellerProfileRepository::new();
        profiles.expect_approve().times(0);

        let error = service(MockUserRepository::new(), profiles, "1")
            .approve_seller(&ExternalId::new("2").expect("valid id"), &UserId::random())
            .await
            .expect_err("not admin");
        assert_eq!(error.code(), ErrorCode::Forbidden);
        assert_eq!(error.reason(), Some("not_admin"));
    }

    #[rstest]
    #[case(true, None)]
    #[case(false, Some(ErrorCode::NotFound))]
    #[tokio::test]
    async fn admins_approve_existing_profiles(
        #[case] exists: bool,
        #[case] expected_error: Option<ErrorCode>,
    ) {
        let mut profiles = MockSellerProfileRepository::new();
        profiles
            .expect_approve()
            .times(1)
            .return_once(move |_| Ok(exists));

        let result = service(MockUserRepository::new(), profiles, "1")
            .approve_seller(&ExternalId::new("1").expect("valid id"), &UserId::random())
            .await;
        assert_eq!(result.err().map(|error| error.code()), expected_error);
    }
    fn stored_profile(owner: UserId, approved: bool) -> SellerProfile {
        let mut profile = SellerProfile::apply(None, owner, &draft(), Utc::now());
        profile.is_approved = approved;
        profile
    }

    #[rstest]
    #[case::buyer_only(UserRole::Buyer, Some(false), "not_seller")]
    #[case::missing_profile(UserRole::Both, None, "not_seller")]
    #[case::awaiting_approval(UserRole::Seller, Some(false), "seller_not_approved")]
    #[tokio::test]
    async fn seller_area_requires_an_approved_profile(
        mut buyer: User,
        #[case] role: UserRole,
        #[case] approved: Option<bool>,
        #[case] reason: &str,
    ) {
        buyer.role = role;
        let owner = buyer.id;
        let mut profiles = MockSellerProfileRepository::new();
        profiles
            .expect_find()
            .returning(move |_| Ok(approved.map(|flag| stored_profile(owner, flag))));

        let error = service(MockUserRepository::new(), profiles, "")
            .seller_access(&buyer)
            .await
            .expect_err("access denied");
        assert_eq!(error.code(), ErrorCode::Forbidden);
        assert_eq!(error.reason(), Some(reason));
    }

    #[rstest]
    #[tokio::test]
    async fn approved_sellers_enter_the_seller_area(mut buyer: User) {
        buyer.role = UserRole::Both;
        let owner = buyer.id;
        let mut profiles = MockSellerProfileRepository::new();
        profiles
            .expect_find()
            .times(1)
            .return_once(move |_| Ok(Some(stored_profile(owner, true))));

        let profile = service(MockUserRepository::new(), profiles, "")
            .seller_access(&buyer)
            .await
            .expect("access granted");
        assert_eq!(profile.user_id, owner);
    }
}
