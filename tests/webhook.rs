mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use bengale_checkout::{
    config::AppConfig,
    error::{AppError, AppResult},
    models::{OrderType, PICKUP_ADDRESS},
    payments::{SignatureError, sign_payload, verify_signature},
    routes::create_router,
    state::AppState,
    services::webhook_service::{
        self, EVENT_NOT_HANDLED, NOT_FOR_THIS_RESTAURANT, WebhookOutcome,
    },
};
use chrono::Utc;
use rust_decimal_macros::dec;
use serde_json::json;
use tower::ServiceExt;

use common::{
    CUSTOMER_EMAIL, FakeGateway, RESTAURANT_INBOX, RecordingNotifier,
    WEBHOOK_SECRET, body_json, checkout_completed_event, context, context_with, delivery_metadata,
    sign, test_config, with_failing_store,
};

/// Delivers `payload` with a fresh valid signature.
async fn deliver(state: &AppState, payload: &[u8]) -> AppResult<WebhookOutcome> {
    let signature = sign(payload);
    webhook_service::handle_stripe_webhook(state, payload, Some(signature.as_str())).await
}

fn completed_payload(session_id: &str) -> Vec<u8> {
    checkout_completed_event(session_id, delivery_metadata(), 3830)
        .to_string()
        .into_bytes()
}

#[test]
fn signature_round_trip_and_rejections() {
    let payload = br#"{"type":"ping"}"#;
    let now = 1_700_000_000;
    let good = format!(
        "t={now},v1={}",
        sign_payload(payload, WEBHOOK_SECRET, &now.to_string())
    );

    assert_eq!(verify_signature(payload, &good, WEBHOOK_SECRET, now, 300), Ok(()));
    assert_eq!(
        verify_signature(b"{\"type\":\"pong\"}", &good, WEBHOOK_SECRET, now, 300),
        Err(SignatureError::Mismatch)
    );
    assert_eq!(
        verify_signature(payload, &good, "whsec_other", now, 300),
        Err(SignatureError::Mismatch)
    );
    assert_eq!(
        verify_signature(payload, &good, WEBHOOK_SECRET, now + 301, 300),
        Err(SignatureError::StaleTimestamp)
    );
    assert_eq!(
        verify_signature(payload, "v1=abc", WEBHOOK_SECRET, now, 300),
        Err(SignatureError::MalformedHeader)
    );
}

#[test]
fn any_matching_v1_signature_is_accepted() {
    let payload = b"{}";
    let now = 1_700_000_000;
    let header = format!(
        "t={now},v1=deadbeef,v1={}",
        sign_payload(payload, WEBHOOK_SECRET, &now.to_string())
    );
    assert_eq!(verify_signature(payload, &header, WEBHOOK_SECRET, now, 300), Ok(()));
}

#[tokio::test]
async fn missing_webhook_secret_is_a_configuration_error() {
    let config = AppConfig {
        stripe_webhook_secret: None,
        ..test_config()
    };
    let ctx = context_with(config, FakeGateway::default(), RecordingNotifier::default());
    let payload = completed_payload("cs_test_a");

    let err = deliver(&ctx.state, &payload)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Configuration(_)));
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn unsigned_or_tampered_events_are_rejected() {
    let ctx = context();
    let payload = completed_payload("cs_test_a");

    let missing = webhook_service::handle_stripe_webhook(&ctx.state, &payload, None)
        .await
        .unwrap_err();
    assert!(matches!(missing, AppError::SignatureInvalid(_)));

    let signature = sign(&payload);
    let tampered = completed_payload("cs_test_b");
    let err =
        webhook_service::handle_stripe_webhook(&ctx.state, &tampered, Some(signature.as_str()))
            .await
            .unwrap_err();
    assert!(matches!(err, AppError::SignatureInvalid(_)));
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);

    let stale_ts = (Utc::now().timestamp() - 3600).to_string();
    let stale = format!(
        "t={stale_ts},v1={}",
        sign_payload(&payload, WEBHOOK_SECRET, &stale_ts)
    );
    let err = webhook_service::handle_stripe_webhook(&ctx.state, &payload, Some(stale.as_str()))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::SignatureInvalid(_)));

    assert!(ctx.store.all().await.is_empty());
}

#[tokio::test]
async fn other_event_types_are_ignored() {
    let ctx = context();
    let payload = json!({
        "id": "evt_1",
        "type": "payment_intent.created",
        "data": {"object": {"id": "pi_1"}}
    })
    .to_string()
    .into_bytes();

    let outcome = deliver(&ctx.state, &payload)
        .await
        .expect("event accepted");

    assert!(matches!(outcome, WebhookOutcome::Ignored { reason } if reason == EVENT_NOT_HANDLED));
    assert!(ctx.store.all().await.is_empty());
}

#[tokio::test]
async fn events_for_another_restaurant_are_ignored() {
    let ctx = context();
    let mut metadata = delivery_metadata();
    metadata["restaurantId"] = json!("le-taj-mahal");
    let payload = checkout_completed_event("cs_test_a", metadata, 3830)
        .to_string()
        .into_bytes();

    let outcome = deliver(&ctx.state, &payload)
        .await
        .expect("event accepted");

    assert!(
        matches!(outcome, WebhookOutcome::Ignored { reason } if reason == NOT_FOR_THIS_RESTAURANT)
    );
    assert!(ctx.store.all().await.is_empty());
    assert_eq!(ctx.notifier.attempts(), 0);
}

#[tokio::test]
async fn completed_checkout_becomes_a_paid_order() {
    let ctx = context();
    let payload = completed_payload("cs_test_a");

    let outcome = deliver(&ctx.state, &payload)
        .await
        .expect("order saved");

    let WebhookOutcome::Persisted {
        order,
        notifications,
    } = outcome
    else {
        panic!("expected a persisted order");
    };
    assert_eq!(order.order_code.as_deref(), Some("1234"));
    assert_eq!(order.total_amount, dec!(38.30));
    assert_eq!(order.status, "paid");
    assert_eq!(order.order_type, OrderType::Delivery);
    assert_eq!(order.customer_email.as_deref(), Some(CUSTOMER_EMAIL));
    assert_eq!(order.customer_address, "12 Rue Stanislas, 54000 Nancy");
    assert_eq!(order.payment_reference.as_deref(), Some("pi_test_1"));
    assert_eq!(order.payment_session_reference.as_deref(), Some("cs_test_a"));
    assert_eq!(order.idempotency_key.as_deref(), Some("cs_test_a"));
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].quantity, 2);

    notifications.await.expect("notification task");
    let sent = ctx.notifier.sent();
    assert_eq!(sent.len(), 2);

    let to_restaurant = sent
        .iter()
        .find(|m| m.to == RESTAURANT_INBOX)
        .expect("restaurant email");
    assert!(to_restaurant.subject.contains("#1234"));
    assert!(to_restaurant.text.contains("Curry x2 (35.80€)"));
    assert!(to_restaurant.text.contains("Options: Choix de la viande: Crevettes"));
    assert!(to_restaurant.text.contains("Total : 38.30€"));

    let to_customer = sent.iter().find(|m| m.to == CUSTOMER_EMAIL).expect("customer email");
    assert!(to_customer.text.contains("Sous-total : 35.80€"));
    assert!(to_customer.text.contains("Frais de livraison : 2.50€"));
    assert!(to_customer.text.contains("Adresse de livraison : 12 Rue Stanislas"));
}

#[tokio::test]
async fn pickup_orders_store_the_pickup_sentinel() {
    let ctx = context();
    let mut metadata = delivery_metadata();
    metadata["orderType"] = json!("pickup");
    metadata["customerAddress"] = json!(PICKUP_ADDRESS);
    let payload = checkout_completed_event("cs_test_p", metadata, 3580)
        .to_string()
        .into_bytes();

    let outcome = deliver(&ctx.state, &payload)
        .await
        .expect("order saved");

    let WebhookOutcome::Persisted { order, notifications } = outcome else {
        panic!("expected a persisted order");
    };
    assert_eq!(order.order_type, OrderType::Pickup);
    assert_eq!(order.customer_address, PICKUP_ADDRESS);
    assert_eq!(order.total_amount, dec!(35.80));

    notifications.await.expect("notification task");
    let to_customer = ctx
        .notifier
        .sent()
        .into_iter()
        .find(|m| m.to == CUSTOMER_EMAIL)
        .expect("customer email");
    assert!(to_customer.text.contains("30-45 minutes"));
    assert!(to_customer.text.contains("Adresse du restaurant : 51 Rue de la Hache"));
    assert!(!to_customer.text.contains("Frais de livraison"));
}

#[tokio::test]
async fn redelivered_event_is_absorbed() {
    let ctx = context();
    let payload = completed_payload("cs_test_a");

    let first = deliver(&ctx.state, &payload)
        .await
        .expect("first delivery");
    let WebhookOutcome::Persisted { notifications, .. } = first else {
        panic!("expected a persisted order");
    };
    notifications.await.expect("notification task");

    let second = deliver(&ctx.state, &payload)
        .await
        .expect("second delivery");

    let WebhookOutcome::Duplicate { order } = second else {
        panic!("expected the redelivery to be absorbed");
    };
    assert_eq!(order.order_code.as_deref(), Some("1234"));
    assert_eq!(ctx.store.all().await.len(), 1);
    assert_eq!(ctx.notifier.sent().len(), 2);
}

#[tokio::test]
async fn without_dedup_a_redelivery_creates_a_second_order() {
    let config = AppConfig {
        webhook_dedup: false,
        ..test_config()
    };
    let ctx = context_with(config, FakeGateway::default(), RecordingNotifier::default());
    let payload = completed_payload("cs_test_a");

    for _ in 0..2 {
        let outcome = deliver(&ctx.state, &payload)
            .await
            .expect("delivery accepted");
        let WebhookOutcome::Persisted { notifications, .. } = outcome else {
            panic!("expected a persisted order");
        };
        notifications.await.expect("notification task");
    }

    let orders = ctx.store.all().await;
    assert_eq!(orders.len(), 2);
    let codes: Vec<_> = orders.iter().filter_map(|o| o.order_code.as_deref()).collect();
    assert_eq!(codes, vec!["1234", "5678"]);
    assert!(orders.iter().all(|o| o.idempotency_key.is_none()));
}

#[tokio::test]
async fn store_failure_asks_the_provider_to_retry() {
    let ctx = context();
    let state = with_failing_store(&ctx.state);
    let payload = completed_payload("cs_test_a");

    let err = deliver(&state, &payload)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Persistence(_)));
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(ctx.notifier.attempts(), 0);
}

#[tokio::test]
async fn notification_failure_does_not_fail_the_order() {
    let ctx = context_with(
        test_config(),
        FakeGateway::default(),
        RecordingNotifier::failing_for(RESTAURANT_INBOX),
    );
    let payload = completed_payload("cs_test_a");

    let outcome = deliver(&ctx.state, &payload)
        .await
        .expect("order saved despite mail failure");

    let WebhookOutcome::Persisted { notifications, .. } = outcome else {
        panic!("expected a persisted order");
    };
    notifications.await.expect("notification task");
    assert_eq!(ctx.notifier.attempts(), 2);
    let sent = ctx.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, CUSTOMER_EMAIL);
    assert_eq!(ctx.store.all().await.len(), 1);
}

#[tokio::test]
async fn missing_amount_total_is_rejected() {
    let ctx = context();
    let mut event = checkout_completed_event("cs_test_a", delivery_metadata(), 0);
    event["data"]["object"]
        .as_object_mut()
        .expect("session object")
        .remove("amount_total");
    let payload = event.to_string().into_bytes();

    let err = deliver(&ctx.state, &payload)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert!(ctx.store.all().await.is_empty());
}

#[tokio::test]
async fn http_webhook_acknowledges_with_order_code() {
    let ctx = context();
    let payload = completed_payload("cs_test_a");

    let response = create_router(ctx.state.clone())
        .oneshot(
            Request::post("/api/webhooks/stripe")
                .header(header::CONTENT_TYPE, "application/json")
                .header("stripe-signature", sign(&payload))
                .body(Body::from(payload.clone()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json, json!({"received": true, "orderCode": "1234"}));

    let replay = create_router(ctx.state.clone())
        .oneshot(
            Request::post("/.netlify/functions/stripe-webhook")
                .header("stripe-signature", sign(&payload))
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(replay.status(), StatusCode::OK);
    let json = body_json(replay).await;
    assert_eq!(json["duplicate"], true);
    assert_eq!(ctx.store.all().await.len(), 1);
}

#[tokio::test]
async fn http_webhook_bad_signature_is_400() {
    let ctx = context();
    let payload = completed_payload("cs_test_a");

    let response = create_router(ctx.state)
        .oneshot(
            Request::post("/api/webhooks/stripe")
                .header("stripe-signature", "t=1,v1=00")
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(
        json["error"]
            .as_str()
            .is_some_and(|msg| msg.starts_with("Webhook Error:"))
    );
}
