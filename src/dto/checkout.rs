use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{CartLine, CustomerInfo};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub cart_items: Vec<CartLine>,
    #[serde(default)]
    pub customer_info: CustomerInfo,
    /// Client-side total, accepted for compatibility and never trusted.
    #[serde(default)]
    #[schema(value_type = Option<f64>)]
    pub total_amount: Option<serde_json::Value>,
    #[serde(default)]
    pub restaurant_id: Option<String>,
    #[serde(default)]
    pub order_type: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionResponse {
    pub session_id: String,
    pub url: String,
}
