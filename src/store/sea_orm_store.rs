use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
};
use uuid::Uuid;

use super::{InsertOutcome, OrderStore, StoreError};
use crate::{
    entity::orders::{
        ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel,
    },
    models::{NewOrder, OrderRecord, OrderType},
};

#[derive(Debug, Clone)]
pub struct SeaOrmOrderStore {
    orm: DatabaseConnection,
}

impl SeaOrmOrderStore {
    pub fn new(orm: DatabaseConnection) -> Self {
        Self { orm }
    }

    async fn latest(&self, condition: Condition) -> Result<Option<OrderRecord>, StoreError> {
        Orders::find()
            .filter(condition)
            .order_by_desc(OrderCol::CreatedAt)
            .one(&self.orm)
            .await?
            .map(order_from_entity)
            .transpose()
    }

    async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<OrderRecord>, StoreError> {
        self.latest(Condition::all().add(OrderCol::IdempotencyKey.eq(key)))
            .await
    }
}

#[async_trait]
impl OrderStore for SeaOrmOrderStore {
    async fn insert(&self, order: NewOrder) -> Result<InsertOutcome, StoreError> {
        let items = serde_json::to_value(&order.items).map_err(|e| StoreError::Corrupt {
            id: order.order_code.clone(),
            reason: e.to_string(),
        })?;
        let idempotency_key = order.idempotency_key.clone();

        let active = OrderActive {
            id: Set(Uuid::new_v4()),
            restaurant_id: Set(order.restaurant_id),
            customer_name: Set(order.customer_name),
            customer_email: Set(order.customer_email),
            customer_phone: Set(order.customer_phone),
            customer_address: Set(order.customer_address),
            items: Set(items),
            total_amount: Set(order.total_amount),
            status: Set(order.status),
            payment_reference: Set(order.payment_reference),
            order_type: Set(order.order_type.as_str().to_string()),
            order_code: Set(Some(order.order_code)),
            payment_session_reference: Set(order.payment_session_reference),
            idempotency_key: Set(order.idempotency_key),
            created_at: NotSet,
        };

        match active.insert(&self.orm).await {
            Ok(model) => Ok(InsertOutcome::Inserted(order_from_entity(model)?)),
            Err(err) => {
                let unique_violation = matches!(
                    err.sql_err(),
                    Some(SqlErr::UniqueConstraintViolation(_))
                );
                if let (true, Some(key)) = (unique_violation, idempotency_key.as_deref()) {
                    if let Some(existing) = self.find_by_idempotency_key(key).await? {
                        return Ok(InsertOutcome::Duplicate(existing));
                    }
                }
                Err(err.into())
            }
        }
    }

    async fn find_latest_by_session(
        &self,
        session_reference: &str,
    ) -> Result<Option<OrderRecord>, StoreError> {
        self.latest(Condition::all().add(OrderCol::PaymentSessionReference.eq(session_reference)))
            .await
    }

    async fn find_latest_since(
        &self,
        since: DateTime<Utc>,
        customer_email: Option<&str>,
    ) -> Result<Option<OrderRecord>, StoreError> {
        let mut condition = Condition::all().add(OrderCol::CreatedAt.gte(since));
        if let Some(email) = customer_email {
            condition = condition.add(OrderCol::CustomerEmail.eq(email));
        }
        self.latest(condition).await
    }

    async fn find_latest(&self) -> Result<Option<OrderRecord>, StoreError> {
        self.latest(Condition::all()).await
    }
}

fn order_from_entity(model: OrderModel) -> Result<OrderRecord, StoreError> {
    let items = serde_json::from_value(model.items).map_err(|e| StoreError::Corrupt {
        id: model.id.to_string(),
        reason: e.to_string(),
    })?;
    let order_type = OrderType::parse(&model.order_type).unwrap_or_else(|| {
        tracing::warn!(order_id = %model.id, order_type = %model.order_type, "unknown order type");
        OrderType::default()
    });

    Ok(OrderRecord {
        id: model.id,
        restaurant_id: model.restaurant_id,
        customer_name: model.customer_name,
        customer_email: model.customer_email,
        customer_phone: model.customer_phone,
        customer_address: model.customer_address,
        items,
        total_amount: model.total_amount,
        status: model.status,
        payment_reference: model.payment_reference,
        order_type,
        order_code: model.order_code,
        payment_session_reference: model.payment_session_reference,
        idempotency_key: model.idempotency_key,
        created_at: model.created_at.with_timezone(&Utc),
    })
}
