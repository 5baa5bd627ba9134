use chrono::Utc;
use tokio::task::JoinHandle;

use crate::{
    error::{AppError, AppResult},
    models::{
        NewOrder, ORDER_STATUS_PAID, OrderLineSnapshot, OrderRecord, OrderType, PICKUP_ADDRESS,
    },
    payments::{
        CHECKOUT_COMPLETED, CompletedCheckoutSession, SignatureError, WebhookEvent,
        verify_signature,
    },
    services::{notification_service, pricing},
    state::AppState,
    store::InsertOutcome,
};

pub const EVENT_NOT_HANDLED: &str = "Event type not handled";
pub const NOT_FOR_THIS_RESTAURANT: &str = "Not for this restaurant";

#[derive(Debug)]
pub enum WebhookOutcome {
    /// Verified but not acted on.
    Ignored { reason: &'static str },
    /// Order stored; notifications run on the returned task.
    Persisted {
        order: OrderRecord,
        notifications: JoinHandle<()>,
    },
    /// The session was already turned into an order.
    Duplicate { order: OrderRecord },
}

/// Verifies a provider event and turns a completed checkout into a paid order.
pub async fn handle_stripe_webhook(
    state: &AppState,
    payload: &[u8],
    signature: Option<&str>,
) -> AppResult<WebhookOutcome> {
    let config = state.config.as_ref();
    let secret = config
        .stripe_webhook_secret
        .as_deref()
        .ok_or_else(|| AppError::Configuration("Webhook secret is not configured".into()))?;
    let signature = signature.ok_or(SignatureError::MissingHeader)?;

    if let Err(err) = verify_signature(
        payload,
        signature,
        secret,
        Utc::now().timestamp(),
        config.webhook_tolerance_secs,
    ) {
        tracing::warn!(error = %err, "webhook signature verification failed");
        return Err(err.into());
    }

    let event: WebhookEvent = serde_json::from_slice(payload)
        .map_err(|e| AppError::Validation(format!("Invalid event payload: {e}")))?;
    tracing::debug!(event_id = ?event.id, event_type = %event.event_type, "webhook verified");

    if event.event_type != CHECKOUT_COMPLETED {
        return Ok(WebhookOutcome::Ignored {
            reason: EVENT_NOT_HANDLED,
        });
    }

    let session: CompletedCheckoutSession = serde_json::from_value(event.data.object)
        .map_err(|e| AppError::Validation(format!("Invalid checkout session: {e}")))?;

    if session.meta("restaurantId") != Some(config.restaurant_id.as_str()) {
        tracing::info!(
            session_id = %session.id,
            restaurant_id = ?session.meta("restaurantId"),
            "webhook for another restaurant ignored"
        );
        return Ok(WebhookOutcome::Ignored {
            reason: NOT_FOR_THIS_RESTAURANT,
        });
    }

    let order = new_order_from_session(state, &session)?;
    let order_code = order.order_code.clone();

    match state.store.insert(order).await {
        Ok(InsertOutcome::Inserted(record)) => {
            tracing::info!(
                order_id = %record.id,
                %order_code,
                session_id = %session.id,
                total = %record.total_amount,
                "order saved"
            );
            let restaurant_email = config
                .restaurant_email
                .clone()
                .unwrap_or_else(|| state.menu.catalog().restaurant.email.clone());
            let notifications = notification_service::spawn_order_notifications(
                state.menu.clone(),
                state.notifier.clone(),
                restaurant_email,
                record.clone(),
            );
            Ok(WebhookOutcome::Persisted {
                order: record,
                notifications,
            })
        }
        Ok(InsertOutcome::Duplicate(existing)) => {
            tracing::info!(
                order_id = %existing.id,
                session_id = %session.id,
                "checkout session already recorded"
            );
            Ok(WebhookOutcome::Duplicate { order: existing })
        }
        Err(err) => {
            tracing::error!(session_id = %session.id, error = %err, "failed to save order");
            Err(err.into())
        }
    }
}

fn new_order_from_session(
    state: &AppState,
    session: &CompletedCheckoutSession,
) -> AppResult<NewOrder> {
    let order_data = session
        .meta("orderData")
        .ok_or_else(|| AppError::Validation("Missing order data".into()))?;
    let items: Vec<OrderLineSnapshot> = serde_json::from_str(order_data)
        .map_err(|e| AppError::Validation(format!("Invalid order data: {e}")))?;
    let amount_total = session
        .amount_total
        .ok_or_else(|| AppError::Validation("Missing amount total".into()))?;

    let order_type = session
        .meta("orderType")
        .and_then(OrderType::parse)
        .unwrap_or_default();
    let customer_address = match order_type {
        OrderType::Pickup => PICKUP_ADDRESS.to_string(),
        OrderType::Delivery => session
            .meta("customerAddress")
            .unwrap_or(PICKUP_ADDRESS)
            .to_string(),
    };
    let idempotency_key = state.config.webhook_dedup.then(|| session.id.clone());

    Ok(NewOrder {
        restaurant_id: state.config.restaurant_id.clone(),
        customer_name: session.meta("customerName").unwrap_or_default().to_string(),
        customer_email: session.email().map(str::to_string),
        customer_phone: session.meta("customerPhone").unwrap_or_default().to_string(),
        customer_address,
        items,
        total_amount: pricing::from_minor_units(amount_total),
        status: ORDER_STATUS_PAID.to_string(),
        payment_reference: session.payment_intent.clone(),
        order_type,
        order_code: state.order_codes.next_code(),
        payment_session_reference: Some(session.id.clone()),
        idempotency_key,
    })
}
