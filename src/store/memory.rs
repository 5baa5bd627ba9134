use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{InsertOutcome, OrderStore, StoreError};
use crate::models::{NewOrder, OrderRecord};

/// Process-local order table, for development without Postgres and for tests.
#[derive(Debug, Default)]
pub struct MemoryOrderStore {
    orders: RwLock<Vec<OrderRecord>>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts with an explicit creation time.
    pub async fn insert_at(
        &self,
        order: NewOrder,
        created_at: DateTime<Utc>,
    ) -> InsertOutcome {
        let mut orders = self.orders.write().await;
        if let Some(key) = order.idempotency_key.as_deref() {
            if let Some(existing) = orders
                .iter()
                .find(|o| o.idempotency_key.as_deref() == Some(key))
            {
                return InsertOutcome::Duplicate(existing.clone());
            }
        }
        let record = OrderRecord::from_new(Uuid::new_v4(), order, created_at);
        orders.push(record.clone());
        InsertOutcome::Inserted(record)
    }

    pub async fn all(&self) -> Vec<OrderRecord> {
        self.orders.read().await.clone()
    }

    async fn latest_matching<F>(&self, predicate: F) -> Option<OrderRecord>
    where
        F: Fn(&OrderRecord) -> bool,
    {
        let orders = self.orders.read().await;
        // Later inserts win ties on `created_at`.
        orders
            .iter()
            .enumerate()
            .filter(|(_, order)| predicate(order))
            .max_by_key(|(position, order)| (order.created_at, *position))
            .map(|(_, order)| order.clone())
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn insert(&self, order: NewOrder) -> Result<InsertOutcome, StoreError> {
        Ok(self.insert_at(order, Utc::now()).await)
    }

    async fn find_latest_by_session(
        &self,
        session_reference: &str,
    ) -> Result<Option<OrderRecord>, StoreError> {
        Ok(self
            .latest_matching(|order| {
                order.payment_session_reference.as_deref() == Some(session_reference)
            })
            .await)
    }

    async fn find_latest_since(
        &self,
        since: DateTime<Utc>,
        customer_email: Option<&str>,
    ) -> Result<Option<OrderRecord>, StoreError> {
        Ok(self
            .latest_matching(|order| {
                order.created_at >= since
                    && customer_email
                        .is_none_or(|email| order.customer_email.as_deref() == Some(email))
            })
            .await)
    }

    async fn find_latest(&self) -> Result<Option<OrderRecord>, StoreError> {
        Ok(self.latest_matching(|_| true).await)
    }
}
