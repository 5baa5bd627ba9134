use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebhookAck {
    pub received: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignored: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_code: Option<String>,
}

impl WebhookAck {
    pub fn saved(order_code: Option<String>) -> Self {
        Self {
            received: true,
            ignored: None,
            duplicate: None,
            reason: None,
            order_code,
        }
    }

    pub fn ignored(reason: impl Into<String>) -> Self {
        Self {
            received: true,
            ignored: Some(true),
            duplicate: None,
            reason: Some(reason.into()),
            order_code: None,
        }
    }

    pub fn duplicate(order_code: Option<String>) -> Self {
        Self {
            received: true,
            ignored: None,
            duplicate: Some(true),
            reason: Some("Event already processed".into()),
            order_code,
        }
    }
}
