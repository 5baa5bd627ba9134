mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use bengale_checkout::{
    error::AppError,
    routes::create_router,
    services::lookup_service::{self, LookupStrategy},
};
use chrono::{Duration, Utc};
use serde_json::json;
use tower::ServiceExt;

use common::{CUSTOMER_EMAIL, body_json, context, new_order, with_failing_store};

#[tokio::test]
async fn finds_order_by_session() {
    let ctx = context();
    let now = Utc::now();
    ctx.store
        .insert_at(
            new_order("4321", Some("cs_test_a"), Some(CUSTOMER_EMAIL)),
            now - Duration::minutes(1),
        )
        .await;
    ctx.store
        .insert_at(new_order("8765", Some("cs_test_b"), Some(CUSTOMER_EMAIL)), now)
        .await;

    let found = lookup_service::lookup_order_code(&ctx.state, "cs_test_a")
        .await
        .expect("order found");

    assert_eq!(found.order_code, "4321");
    assert_eq!(found.strategy, LookupStrategy::BySession);
}

#[tokio::test]
async fn falls_back_to_recent_order_from_the_same_customer() {
    let ctx = context();
    let now = Utc::now();
    ctx.gateway.set_customer_email(Some(CUSTOMER_EMAIL));
    ctx.store
        .insert_at(new_order("1111", None, Some(CUSTOMER_EMAIL)), now - Duration::minutes(3))
        .await;
    ctx.store
        .insert_at(new_order("2222", None, Some("autre@example.com")), now - Duration::minutes(1))
        .await;

    let found = lookup_service::lookup_order_code(&ctx.state, "cs_unknown")
        .await
        .expect("order found");

    assert_eq!(found.order_code, "1111");
    assert_eq!(found.strategy, LookupStrategy::RecentWindow { by_email: true });
}

#[tokio::test]
async fn without_email_the_window_is_unfiltered() {
    let ctx = context();
    let now = Utc::now();
    ctx.store
        .insert_at(new_order("1111", None, Some(CUSTOMER_EMAIL)), now - Duration::minutes(3))
        .await;
    ctx.store
        .insert_at(new_order("2222", None, None), now - Duration::minutes(1))
        .await;

    let found = lookup_service::lookup_order_code(&ctx.state, "cs_unknown")
        .await
        .expect("order found");

    assert_eq!(found.order_code, "2222");
    assert_eq!(found.strategy, LookupStrategy::RecentWindow { by_email: false });
}

#[tokio::test]
async fn last_resort_is_the_most_recent_order() {
    let ctx = context();
    let now = Utc::now();
    ctx.gateway.set_customer_email(Some(CUSTOMER_EMAIL));
    ctx.store
        .insert_at(new_order("3333", None, Some("autre@example.com")), now - Duration::hours(2))
        .await;
    ctx.store
        .insert_at(new_order("4444", None, Some("autre@example.com")), now - Duration::minutes(30))
        .await;

    let found = lookup_service::lookup_order_code(&ctx.state, "cs_unknown")
        .await
        .expect("order found");

    assert_eq!(found.order_code, "4444");
    assert_eq!(found.strategy, LookupStrategy::MostRecent);
}

#[tokio::test]
async fn empty_store_is_not_found() {
    let ctx = context();
    let err = lookup_service::lookup_order_code(&ctx.state, "cs_unknown")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::OrderNotFound));
    assert_eq!(err.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn matched_order_without_code_is_not_found() {
    let ctx = context();
    ctx.store
        .insert_at(new_order("", Some("cs_test_a"), None), Utc::now())
        .await;

    let err = lookup_service::lookup_order_code(&ctx.state, "cs_test_a")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::OrderNotFound));
}

#[tokio::test]
async fn store_errors_are_not_hidden() {
    let ctx = context();
    let state = with_failing_store(&ctx.state);

    let err = lookup_service::lookup_order_code(&state, "cs_test_a")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Persistence(_)));
}

#[tokio::test]
async fn http_lookup_returns_order_number() {
    let ctx = context();
    ctx.store
        .insert_at(new_order("4321", Some("cs_test_a"), None), Utc::now())
        .await;
    let app = create_router(ctx.state.clone());

    let response = app
        .clone()
        .oneshot(
            Request::get("/api/orders/code?session_id=cs_test_a")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"orderNumber": "4321"}));

    let legacy = app
        .oneshot(
            Request::get("/.netlify/functions/get-order-number?session_id=cs_test_a")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(legacy.status(), StatusCode::OK);
}

#[tokio::test]
async fn http_lookup_errors() {
    let ctx = context();
    let app = create_router(ctx.state);

    let missing = app
        .clone()
        .oneshot(Request::get("/api/orders/code").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(missing).await, json!({"error": "Missing session_id"}));

    let not_found = app
        .oneshot(
            Request::get("/api/orders/code?session_id=cs_nothing")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(not_found).await, json!({"error": "Order not found"}));
}
