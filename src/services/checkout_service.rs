use crate::{
    catalog::Menu,
    config::AppConfig,
    dto::checkout::{CheckoutRequest, CheckoutSessionResponse},
    error::{AppError, AppResult},
    models::{CustomerInfo, OrderLineSnapshot, OrderType, PICKUP_ADDRESS},
    payments::{CheckoutSessionRequest, ProviderLineItem, SessionMetadata},
    services::{
        cart_service::{self, ReconciledCart},
        pricing::PricingError,
    },
    state::AppState,
};

pub const CURRENCY: &str = "eur";

/// Stripe substitutes this with the finalized session id on redirect.
pub const SESSION_ID_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

/// How much of each cart line survives in the metadata snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotDetail {
    Full,
    /// `price` dropped; the finalizer re-derives it from the price authority.
    WithoutPrice,
    /// `name` dropped as well; only id, quantity and options remain.
    Minimal,
}

impl SnapshotDetail {
    fn reduced(self) -> Option<Self> {
        match self {
            SnapshotDetail::Full => Some(SnapshotDetail::WithoutPrice),
            SnapshotDetail::WithoutPrice => Some(SnapshotDetail::Minimal),
            SnapshotDetail::Minimal => None,
        }
    }

    fn apply(self, line: &mut OrderLineSnapshot) {
        match self {
            SnapshotDetail::Full => {}
            SnapshotDetail::WithoutPrice => line.price = None,
            SnapshotDetail::Minimal => {
                line.price = None;
                line.name = None;
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EncodedOrderData {
    pub json: String,
    pub detail: SnapshotDetail,
    pub within_budget: bool,
}

/// Serializes the cart snapshot, dropping the least essential fields until it
/// fits `budget` bytes. Passes through over budget once nothing is left to drop.
pub fn encode_order_data(
    snapshot: &[OrderLineSnapshot],
    budget: usize,
) -> Result<EncodedOrderData, serde_json::Error> {
    let mut lines = snapshot.to_vec();
    let mut detail = SnapshotDetail::Full;

    loop {
        let json = serde_json::to_string(&lines)?;
        if json.len() <= budget {
            return Ok(EncodedOrderData {
                json,
                detail,
                within_budget: true,
            });
        }

        let Some(next) = detail.reduced() else {
            tracing::error!(
                bytes = json.len(),
                budget,
                "order data still over budget with minimal detail"
            );
            return Ok(EncodedOrderData {
                json,
                detail,
                within_budget: false,
            });
        };

        tracing::warn!(
            bytes = json.len(),
            budget,
            ?next,
            "order data over budget, reducing snapshot"
        );
        lines.iter_mut().for_each(|line| next.apply(line));
        detail = next;
    }
}

pub struct SessionParams<'a> {
    pub customer: &'a CustomerInfo,
    pub order_type: OrderType,
    pub restaurant_id: &'a str,
    pub origin: &'a str,
    pub metadata_budget_bytes: usize,
}

pub fn build_session_request(
    cart: &ReconciledCart,
    params: SessionParams<'_>,
) -> Result<CheckoutSessionRequest, serde_json::Error> {
    let line_items = cart
        .line_items
        .iter()
        .map(|item| ProviderLineItem {
            name: item.name.clone(),
            description: item.description.clone(),
            currency: CURRENCY.to_string(),
            unit_amount: item.unit_price_minor_units,
            quantity: item.quantity,
        })
        .collect();

    let order_data = encode_order_data(&cart.snapshot, params.metadata_budget_bytes)?;
    let customer_address = match params.order_type {
        OrderType::Pickup => PICKUP_ADDRESS.to_string(),
        OrderType::Delivery => params
            .customer
            .address
            .clone()
            .filter(|address| !address.trim().is_empty())
            .unwrap_or_else(|| PICKUP_ADDRESS.to_string()),
    };
    let origin = params.origin.trim_end_matches('/');
    let email = params.customer.email.trim();

    Ok(CheckoutSessionRequest {
        line_items,
        success_url: format!("{origin}/success?session_id={SESSION_ID_PLACEHOLDER}"),
        cancel_url: format!("{origin}/?canceled=true"),
        customer_email: (!email.is_empty()).then(|| email.to_string()),
        metadata: SessionMetadata {
            restaurant_id: params.restaurant_id.to_string(),
            customer_name: params.customer.name.clone(),
            customer_phone: params.customer.phone.clone(),
            customer_address,
            order_type: params.order_type.as_str().to_string(),
            order_data: order_data.json,
        },
    })
}

/// Prices the cart server-side and opens a payment session for it.
pub async fn create_checkout_session(
    state: &AppState,
    payload: CheckoutRequest,
    origin: Option<&str>,
) -> AppResult<CheckoutSessionResponse> {
    let config = state.config.as_ref();
    let order_type = parse_order_type(payload.order_type.as_deref())?;
    validate_customer(&payload.customer_info, order_type)?;

    tracing::debug!(
        lines = payload.cart_items.len(),
        order_type = order_type.as_str(),
        "checkout requested"
    );

    let restaurant_id = config.restaurant_id.as_str();
    if let Some(requested) = payload.restaurant_id.as_deref().filter(|id| !id.is_empty()) {
        if requested != restaurant_id {
            tracing::warn!(
                requested,
                expected = %restaurant_id,
                "checkout for another restaurant"
            );
            return Err(AppError::Validation(format!("Unknown restaurant: {requested}")));
        }
    }

    let cart = cart_service::reconcile(&state.menu, &payload.cart_items, order_type)
        .map_err(|err| validation_error(err, &state.menu, config))?;

    let request = build_session_request(
        &cart,
        SessionParams {
            customer: &payload.customer_info,
            order_type,
            restaurant_id,
            origin: origin
                .filter(|origin| !origin.is_empty())
                .unwrap_or(&config.public_base_url),
            metadata_budget_bytes: config.metadata_budget_bytes,
        },
    )
    .map_err(|e| AppError::Internal(e.into()))?;

    let session = state.gateway.create_checkout_session(&request).await?;

    tracing::info!(
        session_id = %session.id,
        total = %cart.total,
        order_type = order_type.as_str(),
        "checkout session created"
    );

    Ok(CheckoutSessionResponse {
        session_id: session.id,
        url: session.url,
    })
}

pub fn parse_order_type(raw: Option<&str>) -> AppResult<OrderType> {
    match raw.filter(|value| !value.is_empty()) {
        None => Ok(OrderType::Delivery),
        Some(value) => OrderType::parse(value)
            .ok_or_else(|| AppError::Validation(format!("Invalid order type: {value}"))),
    }
}

fn validate_customer(customer: &CustomerInfo, order_type: OrderType) -> AppResult<()> {
    if customer.name.trim().is_empty() {
        return Err(AppError::Validation("Customer name is required".into()));
    }
    if !customer.email.contains('@') {
        return Err(AppError::Validation("A valid customer email is required".into()));
    }
    let has_address = customer
        .address
        .as_deref()
        .is_some_and(|address| !address.trim().is_empty());
    if order_type == OrderType::Delivery && !has_address {
        return Err(AppError::Validation(
            "A delivery address is required for delivery orders".into(),
        ));
    }
    Ok(())
}

fn validation_error(err: PricingError, menu: &Menu, config: &AppConfig) -> AppError {
    if let PricingError::UnknownProduct(id) = &err {
        tracing::error!(item_id = %id, "invalid product in cart");
        if config.verbose_errors {
            let sample = menu.prices().sample_ids(5).join(", ");
            return AppError::Validation(format!("{err}. Available IDs: {sample}"));
        }
    }
    err.into()
}
