//! PostgreSQL-backed `UserRepository`.

use std::str::FromStr;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{UserRepository, UserRepositoryError};
use crate::domain::{ExternalId, User, UserId, UserRole};

use super::diesel_error_mapping::{DieselFailure, classify_diesel_error};
use super::models::{NewUserRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel implementation of [`UserRepository`].
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserRepositoryError {
    UserRepositoryError::connection(error.into_message())
}

fn map_diesel_error(error: diesel::result::Error, external_id: Option<&str>) -> UserRepositoryError {
    match classify_diesel_error(error) {
        DieselFailure::UniqueViolation { .. } => {
            UserRepositoryError::duplicate_external_id(external_id.unwrap_or_default())
        }
        DieselFailure::Connection(message) => UserRepositoryError::connection(message),
        DieselFailure::Query(message) => UserRepositoryError::query(message),
    }
}

fn row_to_user(row: UserRow) -> Result<User, UserRepositoryError> {
    let external_id = ExternalId::new(row.external_id)
        .map_err(|err| UserRepositoryError::query(format!("invalid stored external id: {err}")))?;
    let role = UserRole::from_str(&row.role)
        .map_err(|err| UserRepositoryError::query(format!("invalid stored role: {err}")))?;
    Ok(User {
        id: UserId::from_uuid(row.id),
        external_id,
        display_name: row.display_name,
        username: row.username,
        role,
        created_at: row.created_at,
    })
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn find_by_external_id(
        &self,
        external_id: &ExternalId,
    ) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        users::table
            .filter(users::external_id.eq(external_id.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, None))?
            .map(row_to_user)
            .transpose()
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        users::table
            .find(id.as_uuid())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, None))?
            .map(row_to_user)
            .transpose()
    }

    async fn insert(&self, user: &User) -> Result<(), UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewUserRow {
            id: *user.id.as_uuid(),
            external_id: user.external_id.as_ref(),
            display_name: &user.display_name,
            username: user.username.as_deref(),
            role: user.role.as_str(),
            created_at: user.created_at,
        };
        diesel::insert_into(users::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| map_diesel_error(err, Some(user.external_id.as_ref())))
    }

    async fn grant_selling(&self, id: &UserId) -> Result<bool, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(
            users::table
                .filter(users::id.eq(id.as_uuid()))
                .filter(users::role.eq(UserRole::Buyer.as_str())),
        )
        .set(users::role.eq(UserRole::Both.as_str()))
        .execute(&mut conn)
        .await
        .map_err(|err| map_diesel_error(err, None))?;
        Ok(updated == 1)
    }
}
