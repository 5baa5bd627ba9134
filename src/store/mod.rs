//! Durable order table. This core only appends orders and reads them back.

mod memory;
mod sea_orm_store;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{NewOrder, OrderRecord};

pub use memory::MemoryOrderStore;
pub use sea_orm_store::SeaOrmOrderStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("stored order {id} is malformed: {reason}")]
    Corrupt { id: String, reason: String },

    #[error("order store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone)]
pub enum InsertOutcome {
    Inserted(OrderRecord),
    /// An order with the same idempotency key already exists.
    Duplicate(OrderRecord),
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert(&self, order: NewOrder) -> Result<InsertOutcome, StoreError>;

    /// Most recent order recorded for a payment session.
    async fn find_latest_by_session(
        &self,
        session_reference: &str,
    ) -> Result<Option<OrderRecord>, StoreError>;

    /// Most recent order created at or after `since`, optionally restricted
    /// to one customer email.
    async fn find_latest_since(
        &self,
        since: DateTime<Utc>,
        customer_email: Option<&str>,
    ) -> Result<Option<OrderRecord>, StoreError>;

    async fn find_latest(&self) -> Result<Option<OrderRecord>, StoreError>;
}
