use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Option group title -> chosen choice text, as submitted by the client.
pub type SelectedOptions = BTreeMap<String, String>;

/// Address stored for orders collected at the restaurant.
pub const PICKUP_ADDRESS: &str = "À emporter";

pub const ORDER_STATUS_PAID: &str = "paid";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    #[default]
    Delivery,
    Pickup,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Delivery => "delivery",
            OrderType::Pickup => "pickup",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "delivery" => Some(OrderType::Delivery),
            "pickup" => Some(OrderType::Pickup),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OptionChoice {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub price_override: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OptionGroup {
    pub title: String,
    pub required: bool,
    pub choices: Vec<OptionChoice>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: String,
    #[schema(value_type = String)]
    pub base_price: Decimal,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionGroup>,
}

impl MenuItem {
    pub fn option_group(&self, title: &str) -> Option<&OptionGroup> {
        self.options.iter().find(|group| group.title == title)
    }
}

/// One cart entry as composed by the browser. Only `id`, `quantity` and
/// `selected_options` are used; the asserted price is never trusted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "price")]
    #[schema(value_type = Option<f64>)]
    pub base_price: Option<Decimal>,
    pub quantity: i64,
    #[serde(default)]
    pub selected_options: Option<SelectedOptions>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrustedLineItem {
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = String)]
    pub unit_price: Decimal,
    pub unit_price_minor_units: i64,
    pub quantity: u32,
}

/// Compact cart line carried in session metadata and persisted with the order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineSnapshot {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub quantity: u32,
    #[serde(default)]
    pub selected_options: Option<SelectedOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CustomerInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: Option<String>,
}

/// Order fields decided by the webhook, before the store assigns identity.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub restaurant_id: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: String,
    pub customer_address: String,
    pub items: Vec<OrderLineSnapshot>,
    pub total_amount: Decimal,
    pub status: String,
    pub payment_reference: Option<String>,
    pub order_type: OrderType,
    pub order_code: String,
    pub payment_session_reference: Option<String>,
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderRecord {
    pub id: Uuid,
    pub restaurant_id: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: String,
    pub customer_address: String,
    pub items: Vec<OrderLineSnapshot>,
    #[schema(value_type = String)]
    pub total_amount: Decimal,
    pub status: String,
    pub payment_reference: Option<String>,
    pub order_type: OrderType,
    pub order_code: Option<String>,
    pub payment_session_reference: Option<String>,
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl OrderRecord {
    pub fn from_new(id: Uuid, order: NewOrder, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            restaurant_id: order.restaurant_id,
            customer_name: order.customer_name,
            customer_email: order.customer_email,
            customer_phone: order.customer_phone,
            customer_address: order.customer_address,
            items: order.items,
            total_amount: order.total_amount,
            status: order.status,
            payment_reference: order.payment_reference,
            order_type: order.order_type,
            order_code: Some(order.order_code),
            payment_session_reference: order.payment_session_reference,
            idempotency_key: order.idempotency_key,
            created_at,
        }
    }
}
