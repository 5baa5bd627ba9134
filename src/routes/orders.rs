use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::orders::{OrderCodeQuery, OrderCodeResponse},
    error::{AppError, AppResult},
    services::lookup_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/code", get(get_order_code))
}

#[utoipa::path(
    get,
    path = "/api/orders/code",
    params(OrderCodeQuery),
    responses(
        (status = 200, description = "Order code for the payment session", body = OrderCodeResponse),
        (status = 400, description = "Missing session_id"),
        (status = 404, description = "Order not found"),
    ),
    tag = "Orders"
)]
pub async fn get_order_code(
    State(state): State<AppState>,
    Query(query): Query<OrderCodeQuery>,
) -> AppResult<Json<OrderCodeResponse>> {
    let session_id = query
        .session_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Missing session_id".into()))?;

    let found = lookup_service::lookup_order_code(&state, &session_id).await?;
    Ok(Json(OrderCodeResponse {
        order_number: found.order_code,
    }))
}
