//! PostgreSQL-backed `ItemRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{ItemRepository, ItemRepositoryError};
use crate::domain::{Amount, BookingCode, Item, ItemId, UserId};

use super::diesel_error_mapping::{DieselFailure, classify_diesel_error};
use super::models::ItemRow;
use super::pool::{DbPool, PoolError};
use super::schema::items;

/// Diesel implementation of [`ItemRepository`].
#[derive(Clone)]
pub struct DieselItemRepository {
    pool: DbPool,
}

impl DieselItemRepository {
    /// Create a repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ItemRepositoryError {
    ItemRepositoryError::connection(error.into_message())
}

fn map_diesel_error(error: diesel::result::Error) -> ItemRepositoryError {
    match classify_diesel_error(error) {
        DieselFailure::Connection(message) => ItemRepositoryError::connection(message),
        DieselFailure::Query(message) => ItemRepositoryError::query(message),
        DieselFailure::UniqueViolation { .. } => ItemRepositoryError::query("database error"),
    }
}

fn row_to_item(row: ItemRow) -> Result<Item, ItemRepositoryError> {
    let price = Amount::new(row.price)
        .map_err(|err| ItemRepositoryError::query(format!("invalid stored price: {err}")))?;
    Ok(Item {
        id: ItemId::from_uuid(row.id),
        seller_id: UserId::from_uuid(row.seller_id),
        title: row.title,
        price,
        booking_code: BookingCode::new(row.booking_code),
    })
}

#[async_trait]
impl ItemRepository for DieselItemRepository {
    async fn find_by_id(&self, id: &ItemId) -> Result<Option<Item>, ItemRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        items::table
            .find(id.as_uuid())
            .select(ItemRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_item)
            .transpose()
    }
}
