//! Payment provider seam. The provider is trusted for session creation,
//! customer email lookup and signed webhook events.

mod events;
mod signature;
mod stripe;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub use events::{CHECKOUT_COMPLETED, CompletedCheckoutSession, CustomerDetails, WebhookEvent};
pub use signature::{SignatureError, sign_payload, verify_signature};
pub use stripe::StripeClient;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("payment provider is not configured")]
    NotConfigured,

    #[error("payment provider request failed: {0}")]
    Transport(String),

    #[error("invalid checkout session id: {0:?}")]
    InvalidSessionId(String),

    #[error("{0}")]
    Rejected(String),

    #[error("unexpected payment provider response: {0}")]
    InvalidResponse(String),
}

/// One line of the provider's checkout page, priced in minor units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderLineItem {
    pub name: String,
    pub description: Option<String>,
    pub currency: String,
    pub unit_amount: i64,
    pub quantity: u32,
}

/// Metadata attached to the session and echoed back in the webhook.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetadata {
    pub restaurant_id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub order_type: String,
    pub order_data: String,
}

impl SessionMetadata {
    pub fn pairs(&self) -> [(&'static str, &str); 6] {
        [
            ("restaurantId", self.restaurant_id.as_str()),
            ("customerName", self.customer_name.as_str()),
            ("customerPhone", self.customer_phone.as_str()),
            ("customerAddress", self.customer_address.as_str()),
            ("orderData", self.order_data.as_str()),
            ("orderType", self.order_type.as_str()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckoutSessionRequest {
    pub line_items: Vec<ProviderLineItem>,
    pub success_url: String,
    pub cancel_url: String,
    pub customer_email: Option<String>,
    pub metadata: SessionMetadata,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSessionHandle {
    pub id: String,
    pub url: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSessionHandle, GatewayError>;

    async fn session_customer_email(&self, session_id: &str)
    -> Result<Option<String>, GatewayError>;
}
