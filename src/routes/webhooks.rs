use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
};

use crate::{
    dto::webhooks::WebhookAck,
    error::AppResult,
    services::webhook_service::{self, WebhookOutcome},
    state::AppState,
};

pub const SIGNATURE_HEADER: &str = "stripe-signature";

pub fn router() -> Router<AppState> {
    Router::new().route("/stripe", post(stripe_webhook))
}

/// The raw body is needed as-is for signature verification.
#[utoipa::path(
    post,
    path = "/api/webhooks/stripe",
    request_body(content = String, description = "Signed provider event", content_type = "application/json"),
    params(("stripe-signature" = String, Header, description = "Provider signature header")),
    responses(
        (status = 200, description = "Event acknowledged", body = WebhookAck),
        (status = 400, description = "Signature verification failed"),
        (status = 500, description = "Order could not be saved; the provider retries"),
    ),
    tag = "Webhooks"
)]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<WebhookAck>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    let ack = match webhook_service::handle_stripe_webhook(&state, &body, signature).await? {
        WebhookOutcome::Ignored { reason } => WebhookAck::ignored(reason),
        // Notifications keep running after the response is sent.
        WebhookOutcome::Persisted { order, .. } => WebhookAck::saved(order.order_code),
        WebhookOutcome::Duplicate { order } => WebhookAck::duplicate(order.order_code),
    };
    Ok(Json(ack))
}
