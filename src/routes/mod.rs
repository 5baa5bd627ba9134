use axum::{
    Json, Router,
    http::{Method, StatusCode, Uri, header::CONTENT_TYPE},
    routing::{get, post},
};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};

use crate::state::AppState;

pub mod checkout;
pub mod doc;
pub mod health;
pub mod menu;
pub mod orders;
pub mod webhooks;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/checkout", checkout::router())
        .nest("/webhooks", webhooks::router())
        .nest("/orders", orders::router())
        .nest("/menu", menu::router())
}

/// Paths served by the previous serverless deployment, kept so existing
/// frontends and the provider's webhook endpoint keep working.
pub fn create_legacy_router() -> Router<AppState> {
    Router::new()
        .route(
            "/create-checkout-session",
            post(checkout::create_checkout_session),
        )
        .route("/stripe-webhook", post(webhooks::stripe_webhook))
        .route("/get-order-number", get(orders::get_order_code))
}

/// Complete application with state bound and CORS applied.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", create_api_router())
        .nest("/.netlify/functions", create_legacy_router())
        .merge(doc::scalar_docs())
        .fallback(not_found)
        .layer(cors)
        .with_state(state)
}

async fn not_found(uri: Uri) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Not Found", "path": uri.path() })),
    )
}
