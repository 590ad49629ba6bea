//! Integration tests for `DieselUserRepository` against embedded PostgreSQL.
//!
//! First contact relies on the `users_external_id_key` constraint to pick a
//! single winner when two requests for a new user arrive together.

use std::sync::Arc;

use chrono::Utc;
use mockable::{Clock, DefaultClock};
use rstest::{fixture, rstest};

use storefront::domain::ports::{IdentityResolver, UserRepository, UserRepositoryError};
use storefront::domain::{
    DISPLAY_NAME_MAX, ExternalId, ExternalIdentity, IdentityService, USERNAME_MAX, User, UserId,
    UserRole,
};
use storefront::outbound::persistence::DieselUserRepository;

#[allow(dead_code)]
#[path = "support/embedded_postgres.rs"]
mod embedded_postgres;

use embedded_postgres::DatabaseContext;

struct Users {
    db: DatabaseContext,
    repository: DieselUserRepository,
}

#[fixture]
fn users() -> Option<Users> {
    let db = embedded_postgres::database_context()?;
    let repository = DieselUserRepository::new(db.pool.clone());
    Some(Users { db, repository })
}

fn identity(external_id: &str, first: &str, last: &str) -> ExternalIdentity {
    let display_name = format!("{first} {last}");
    ExternalIdentity::new(
        ExternalId::new(external_id).expect("valid external id"),
        display_name,
        Some("tipster".to_owned()),
    )
}

#[rstest]
fn concurrent_first_contact_creates_one_user(users: Option<Users>) {
    let Some(users) = users else {
        eprintln!("SKIP-TEST-CLUSTER: concurrent_first_contact_creates_one_user skipped");
        return;
    };
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let repository = Arc::new(users.repository.clone());
    let first = IdentityService::new(repository.clone(), clock.clone());
    let second = IdentityService::new(repository, clock);
    let newcomer = identity("5150", "Bola", "Ade");

    let (a, b) = users
        .db
        .block_on(async { tokio::join!(first.resolve(&newcomer), second.resolve(&newcomer)) });
    let a = a.expect("first racer resolves");
    let b = b.expect("second racer resolves");
    assert_eq!(a.id, b.id);

    let stored = users
        .db
        .block_on(users.repository.find_by_external_id(newcomer.external_id()))
        .expect("lookup")
        .expect("stored");
    assert_eq!(stored.id, a.id);
    assert_eq!(stored.role, UserRole::Buyer);
}

#[rstest]
fn duplicate_external_ids_are_reported(users: Option<Users>) {
    let Some(users) = users else {
        eprintln!("SKIP-TEST-CLUSTER: duplicate_external_ids_are_reported skipped");
        return;
    };
    let newcomer = identity("6160", "Chi", "Obi");
    let original = User::first_contact(UserId::random(), &newcomer, Utc::now());
    let twin = User::first_contact(UserId::random(), &newcomer, Utc::now());

    users
        .db
        .block_on(users.repository.insert(&original))
        .expect("first insert");
    let error = users
        .db
        .block_on(users.repository.insert(&twin))
        .expect_err("external id taken");
    assert!(
        matches!(error, UserRepositoryError::DuplicateExternalId { .. }),
        "unexpected error: {error:?}"
    );
}

#[rstest]
fn longest_profile_names_fit_the_columns(users: Option<Users>) {
    let Some(users) = users else {
        eprintln!("SKIP-TEST-CLUSTER: longest_profile_names_fit_the_columns skipped");
        return;
    };
    let newcomer = ExternalIdentity::new(
        ExternalId::new("7170").expect("valid external id"),
        format!("{} {}", "A".repeat(64), "B".repeat(64)),
        Some("u".repeat(80)),
    );
    let user = User::first_contact(UserId::random(), &newcomer, Utc::now());

    users
        .db
        .block_on(users.repository.insert(&user))
        .expect("clamped names fit");
    let stored = users
        .db
        .block_on(users.repository.find_by_id(&user.id))
        .expect("lookup")
        .expect("stored");
    assert_eq!(stored.display_name.chars().count(), DISPLAY_NAME_MAX);
    assert_eq!(
        stored.username.as_deref().map(|name| name.chars().count()),
        Some(USERNAME_MAX)
    );
}

#[rstest]
fn selling_is_granted_once(users: Option<Users>) {
    let Some(users) = users else {
        eprintln!("SKIP-TEST-CLUSTER: selling_is_granted_once skipped");
        return;
    };
    let buyer = User::first_contact(UserId::random(), &identity("8180", "Dee", "Eze"), Utc::now());
    users
        .db
        .block_on(users.repository.insert(&buyer))
        .expect("insert");

    users.db.block_on(async {
        assert!(users.repository.grant_selling(&buyer.id).await.expect("grant"));
        assert!(!users.repository.grant_selling(&buyer.id).await.expect("regrant"));
        let stored = users
            .repository
            .find_by_id(&buyer.id)
            .await
            .expect("lookup")
            .expect("stored");
        assert_eq!(stored.role, UserRole::Both);
    });
}
