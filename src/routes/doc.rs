use utoipa::{OpenApi, openapi::OpenApi as OpenApiSpec};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    catalog::{MenuCatalog, RestaurantInfo},
    dto::{
        checkout::{CheckoutRequest, CheckoutSessionResponse},
        orders::OrderCodeResponse,
        webhooks::WebhookAck,
    },
    models::{CartLine, CustomerInfo, MenuItem, OptionChoice, OptionGroup, OrderType},
    routes::{checkout, health, menu, orders, webhooks},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        checkout::create_checkout_session,
        webhooks::stripe_webhook,
        orders::get_order_code,
        menu::get_menu
    ),
    components(
        schemas(
            CheckoutRequest,
            CheckoutSessionResponse,
            CartLine,
            CustomerInfo,
            OrderType,
            WebhookAck,
            OrderCodeResponse,
            MenuCatalog,
            RestaurantInfo,
            MenuItem,
            OptionGroup,
            OptionChoice,
            health::HealthData
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Checkout", description = "Payment session creation"),
        (name = "Webhooks", description = "Payment provider events"),
        (name = "Orders", description = "Order code lookup"),
        (name = "Menu", description = "Menu catalog"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
