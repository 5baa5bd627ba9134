use std::sync::Arc;

use crate::{
    catalog::Menu,
    config::AppConfig,
    email::Notifier,
    payments::PaymentGateway,
    services::order_code::OrderCodeSource,
    store::OrderStore,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub menu: Arc<Menu>,
    pub store: Arc<dyn OrderStore>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub notifier: Arc<dyn Notifier>,
    pub order_codes: Arc<dyn OrderCodeSource>,
}
