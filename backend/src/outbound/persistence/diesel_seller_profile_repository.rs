//! PostgreSQL-backed `SellerProfileRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;
use url::Url;

use crate::domain::ports::{SellerProfileRepository, SellerProfileRepositoryError};
use crate::domain::{SellerProfile, UserId};

use super::diesel_error_mapping::{DieselFailure, classify_diesel_error};
use super::models::{NewSellerProfileRow, SellerProfileRow};
use super::pool::{DbPool, PoolError};
use super::schema::seller_profiles;

/// Diesel implementation of [`SellerProfileRepository`].
#[derive(Clone)]
pub struct DieselSellerProfileRepository {
    pool: DbPool,
}

impl DieselSellerProfileRepository {
    /// Create a repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> SellerProfileRepositoryError {
    SellerProfileRepositoryError::connection(error.into_message())
}

fn map_diesel_error(error: diesel::result::Error) -> SellerProfileRepositoryError {
    match classify_diesel_error(error) {
        DieselFailure::Connection(message) => SellerProfileRepositoryError::connection(message),
        DieselFailure::Query(message) => SellerProfileRepositoryError::query(message),
        DieselFailure::UniqueViolation { .. } => {
            SellerProfileRepositoryError::query("database error")
        }
    }
}

fn row_to_profile(row: SellerProfileRow) -> Result<SellerProfile, SellerProfileRepositoryError> {
    let photo_url = row
        .photo_url
        .as_deref()
        .map(Url::parse)
        .transpose()
        .map_err(|err| {
            SellerProfileRepositoryError::query(format!("invalid stored photo url: {err}"))
        })?;
    Ok(SellerProfile {
        user_id: UserId::from_uuid(row.user_id),
        display_name: row.display_name,
        bio: row.bio,
        photo_url,
        is_approved: row.is_approved,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

#[async_trait]
impl SellerProfileRepository for DieselSellerProfileRepository {
    async fn find(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SellerProfile>, SellerProfileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        seller_profiles::table
            .find(user_id.as_uuid())
            .select(SellerProfileRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_profile)
            .transpose()
    }

    async fn save(&self, profile: &SellerProfile) -> Result<(), SellerProfileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewSellerProfileRow {
            user_id: *profile.user_id.as_uuid(),
            display_name: &profile.display_name,
            bio: profile.bio.as_deref(),
            photo_url: profile.photo_url.as_ref().map(Url::as_str),
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        };
        diesel::insert_into(seller_profiles::table)
            .values(&row)
            .on_conflict(seller_profiles::user_id)
            .do_update()
            .set((
                seller_profiles::display_name.eq(excluded(seller_profiles::display_name)),
                seller_profiles::bio.eq(excluded(seller_profiles::bio)),
                seller_profiles::photo_url.eq(excluded(seller_profiles::photo_url)),
                seller_profiles::updated_at.eq(excluded(seller_profiles::updated_at)),
            ))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn approve(&self, user_id: &UserId) -> Result<bool, SellerProfileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(seller_profiles::table.find(user_id.as_uuid()))
            .set(seller_profiles::is_approved.eq(true))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }

    async fn list_recent(
        &self,
        limit: u32,
    ) -> Result<Vec<SellerProfile>, SellerProfileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = seller_profiles::table
            .order(seller_profiles::created_at.desc())
            .limit(i64::from(limit))
            .select(SellerProfileRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_profile).collect()
    }
}
