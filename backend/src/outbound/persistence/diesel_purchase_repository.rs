//! PostgreSQL-backed `PurchaseRepository`.
//!
//! Two unique rules live in the schema: `purchases_payment_reference_key` and
//! the partial index `purchases_active_buyer_item_idx`. Status transitions
//! are single `UPDATE ... WHERE status = 'pending'` statements; the affected
//! row count tells the caller whether it won.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{PurchaseRepository, PurchaseRepositoryError};
use crate::domain::{
    Amount, ItemId, PaymentReference, Purchase, PurchaseId, PurchaseStatus, UserId,
};

use super::diesel_error_mapping::{DieselFailure, classify_diesel_error};
use super::models::{NewPurchaseRow, PurchaseRow};
use super::pool::{DbPool, PoolError};
use super::schema::purchases;

const REFERENCE_CONSTRAINT: &str = "purchases_payment_reference_key";
const ACTIVE_PURCHASE_INDEX: &str = "purchases_active_buyer_item_idx";

/// Diesel implementation of [`PurchaseRepository`].
#[derive(Clone)]
pub struct DieselPurchaseRepository {
    pool: DbPool,
}

impl DieselPurchaseRepository {
    /// Create a repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> PurchaseRepositoryError {
    PurchaseRepositoryError::connection(error.into_message())
}

fn map_diesel_error(error: diesel::result::Error) -> PurchaseRepositoryError {
    match classify_diesel_error(error) {
        DieselFailure::Connection(message) => PurchaseRepositoryError::connection(message),
        DieselFailure::Query(message) => PurchaseRepositoryError::query(message),
        DieselFailure::UniqueViolation { constraint } => PurchaseRepositoryError::query(format!(
            "unexpected unique violation on {}",
            constraint.as_deref().unwrap_or("unknown constraint")
        )),
    }
}

fn map_insert_error(error: diesel::result::Error, purchase: &Purchase) -> PurchaseRepositoryError {
    match classify_diesel_error(error) {
        DieselFailure::UniqueViolation { constraint } => match constraint.as_deref() {
            Some(ACTIVE_PURCHASE_INDEX) => PurchaseRepositoryError::active_purchase_exists(
                purchase.buyer_id.to_string(),
                purchase.item_id.to_string(),
            ),
            Some(REFERENCE_CONSTRAINT) => {
                PurchaseRepositoryError::duplicate_reference(purchase.reference.as_ref())
            }
            other => PurchaseRepositoryError::query(format!(
                "unexpected unique violation on {}",
                other.unwrap_or("unknown constraint")
            )),
        },
        DieselFailure::Connection(message) => PurchaseRepositoryError::connection(message),
        DieselFailure::Query(message) => PurchaseRepositoryError::query(message),
    }
}

fn row_to_purchase(row: PurchaseRow) -> Result<Purchase, PurchaseRepositoryError> {
    let corrupt = |what: &str, err: &dyn std::fmt::Display| {
        PurchaseRepositoryError::query(format!("invalid stored {what}: {err}"))
    };
    let reference = PaymentReference::new(row.payment_reference)
        .map_err(|err| corrupt("payment reference", &err))?;
    let status = PurchaseStatus::from_str(&row.status).map_err(|err| corrupt("status", &err))?;
    let amount_expected =
        Amount::new(row.amount_expected).map_err(|err| corrupt("amount", &err))?;
    Ok(Purchase {
        id: PurchaseId::from_uuid(row.id),
        item_id: ItemId::from_uuid(row.item_id),
        buyer_id: UserId::from_uuid(row.buyer_id),
        reference,
        status,
        amount_expected,
        created_at: row.created_at,
        completed_at: row.completed_at,
    })
}

fn rows_to_purchases(rows: Vec<PurchaseRow>) -> Result<Vec<Purchase>, PurchaseRepositoryError> {
    rows.into_iter().map(row_to_purchase).collect()
}

fn active_statuses() -> [&'static str; 2] {
    [
        PurchaseStatus::Pending.as_str(),
        PurchaseStatus::Completed.as_str(),
    ]
}

#[async_trait]
impl PurchaseRepository for DieselPurchaseRepository {
    async fn insert(&self, purchase: &Purchase) -> Result<(), PurchaseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewPurchaseRow {
            id: *purchase.id.as_uuid(),
            item_id: *purchase.item_id.as_uuid(),
            buyer_id: *purchase.buyer_id.as_uuid(),
            payment_reference: purchase.reference.as_ref(),
            status: purchase.status.as_str(),
            amount_expected: purchase.amount_expected.minor_units(),
            created_at: purchase.created_at,
        };
        diesel::insert_into(purchases::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| map_insert_error(err, purchase))
    }

    async fn find_by_reference(
        &self,
        reference: &PaymentReference,
    ) -> Result<Option<Purchase>, PurchaseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        purchases::table
            .filter(purchases::payment_reference.eq(reference.as_ref()))
            .select(PurchaseRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_purchase)
            .transpose()
    }

    async fn find_active(
        &self,
        buyer_id: &UserId,
        item_id: &ItemId,
    ) -> Result<Option<Purchase>, PurchaseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        purchases::table
            .filter(purchases::buyer_id.eq(buyer_id.as_uuid()))
            .filter(purchases::item_id.eq(item_id.as_uuid()))
            .filter(purchases::status.eq_any(active_statuses()))
            .select(PurchaseRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_purchase)
            .transpose()
    }

    async fn complete_if_pending(
        &self,
        id: &PurchaseId,
        completed_at: DateTime<Utc>,
    ) -> Result<bool, PurchaseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(
            purchases::table
                .filter(purchases::id.eq(id.as_uuid()))
                .filter(purchases::status.eq(PurchaseStatus::Pending.as_str())),
        )
        .set((
            purchases::status.eq(PurchaseStatus::Completed.as_str()),
            purchases::completed_at.eq(Some(completed_at)),
        ))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(updated == 1)
    }

    async fn fail_if_pending(&self, id: &PurchaseId) -> Result<bool, PurchaseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(
            purchases::table
                .filter(purchases::id.eq(id.as_uuid()))
                .filter(purchases::status.eq(PurchaseStatus::Pending.as_str())),
        )
        .set(purchases::status.eq(PurchaseStatus::Failed.as_str()))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(updated == 1)
    }

    async fn has_completed(
        &self,
        buyer_id: &UserId,
        item_id: &ItemId,
    ) -> Result<bool, PurchaseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::select(diesel::dsl::exists(
            purchases::table
                .filter(purchases::buyer_id.eq(buyer_id.as_uuid()))
                .filter(purchases::item_id.eq(item_id.as_uuid()))
                .filter(purchases::status.eq(PurchaseStatus::Completed.as_str())),
        ))
        .get_result::<bool>(&mut conn)
        .await
        .map_err(map_diesel_error)
    }

    async fn list_for_buyer(
        &self,
        buyer_id: &UserId,
        limit: u32,
    ) -> Result<Vec<Purchase>, PurchaseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = purchases::table
            .filter(purchases::buyer_id.eq(buyer_id.as_uuid()))
            .order(purchases::created_at.desc())
            .limit(i64::from(limit))
            .select(PurchaseRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows_to_purchases(rows)
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<Purchase>, PurchaseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = purchases::table
            .order(purchases::created_at.desc())
            .limit(i64::from(limit))
            .select(PurchaseRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows_to_purchases(rows)
    }
}
