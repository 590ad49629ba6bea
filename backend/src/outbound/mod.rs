//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel
//! - **memory**: in-process store used when no database is configured
//! - **payment**: HTTP client for the payment gateway's verification API
//! - **notify**: Telegram Bot API notifier
//!
//! Adapters translate between domain types and wire or storage
//! representations. They contain no business logic.

pub mod memory;
pub mod notify;
pub mod payment;
pub mod persistence;
