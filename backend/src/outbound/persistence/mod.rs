//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Repositories translate between Diesel rows and domain types and map
//! database failures into port errors. Uniqueness and conditional-update
//! guarantees come from the schema in `backend/migrations`:
//!
//! - `users.external_id` is unique.
//! - `purchases.payment_reference` is unique.
//! - A partial unique index allows one pending or completed purchase per
//!   buyer and item.
//!
//! # Example
//!
//! ```no_run
//! use storefront::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
//!
//! # async fn example() -> Result<(), storefront::outbound::persistence::PoolError> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/storefront")).await?;
//! let users = DieselUserRepository::new(pool);
//! # let _ = users;
//! # Ok(())
//! # }
//! ```

mod diesel_error_mapping;
mod diesel_item_repository;
mod diesel_purchase_repository;
mod diesel_seller_profile_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_item_repository::DieselItemRepository;
pub use diesel_purchase_repository::DieselPurchaseRepository;
pub use diesel_seller_profile_repository::DieselSellerProfileRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MIGRATIONS, MigrationError, migrate, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
