use chrono::{Duration, Utc};

use crate::{
    error::{AppError, AppResult},
    models::OrderRecord,
    state::AppState,
};

/// Which search produced the match, from strictest to loosest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupStrategy {
    BySession,
    RecentWindow { by_email: bool },
    MostRecent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderCodeMatch {
    pub order_code: String,
    pub strategy: LookupStrategy,
}

/// Resolves a payment session to the code of the order it produced.
///
/// Falls back to the customer's recent orders and finally to the latest
/// order overall, so a customer coming back from payment before the webhook
/// has been matched still sees a code.
pub async fn lookup_order_code(state: &AppState, session_id: &str) -> AppResult<OrderCodeMatch> {
    if let Some(order) = state.store.find_latest_by_session(session_id).await? {
        return code_of(order, LookupStrategy::BySession, session_id);
    }
    tracing::debug!(%session_id, "no order recorded for session, trying recent orders");

    let email = match state.gateway.session_customer_email(session_id).await {
        Ok(email) => email,
        Err(err) => {
            tracing::warn!(%session_id, error = %err, "could not retrieve session email");
            None
        }
    };
    let since = Utc::now() - Duration::minutes(state.config.lookup_window_minutes);
    if let Some(order) = state
        .store
        .find_latest_since(since, email.as_deref())
        .await?
    {
        let strategy = LookupStrategy::RecentWindow {
            by_email: email.is_some(),
        };
        return code_of(order, strategy, session_id);
    }

    if let Some(order) = state.store.find_latest().await? {
        tracing::warn!(%session_id, order_id = %order.id, "falling back to most recent order");
        return code_of(order, LookupStrategy::MostRecent, session_id);
    }

    tracing::info!(%session_id, "no order found");
    Err(AppError::OrderNotFound)
}

fn code_of(
    order: OrderRecord,
    strategy: LookupStrategy,
    session_id: &str,
) -> AppResult<OrderCodeMatch> {
    match order.order_code.filter(|code| !code.is_empty()) {
        Some(order_code) => {
            tracing::debug!(%session_id, %order_code, ?strategy, "order code resolved");
            Ok(OrderCodeMatch {
                order_code,
                strategy,
            })
        }
        None => {
            tracing::warn!(%session_id, order_id = %order.id, "matched order has no code");
            Err(AppError::OrderNotFound)
        }
    }
}
