use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, header::ORIGIN},
    routing::post,
};

use crate::{
    dto::checkout::{CheckoutRequest, CheckoutSessionResponse},
    error::{AppError, AppResult},
    services::checkout_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/session", post(create_checkout_session))
}

#[utoipa::path(
    post,
    path = "/api/checkout/session",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Payment session created", body = CheckoutSessionResponse),
        (status = 400, description = "Invalid cart or customer details"),
        (status = 500, description = "Payment provider unavailable or not configured"),
    ),
    tag = "Checkout"
)]
pub async fn create_checkout_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> AppResult<Json<CheckoutSessionResponse>> {
    let Json(payload) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    let origin = headers.get(ORIGIN).and_then(|value| value.to_str().ok());

    let session = checkout_service::create_checkout_session(&state, payload, origin).await?;
    Ok(Json(session))
}
