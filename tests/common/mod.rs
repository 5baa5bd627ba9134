#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use axum::{body::Body, response::Response};
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::{Value, json};

use bengale_checkout::{
    catalog::{Menu, MenuCatalog, PricingRules},
    config::AppConfig,
    email::{EmailMessage, NotificationError, Notifier},
    models::{
        CartLine, CustomerInfo, NewOrder, ORDER_STATUS_PAID, OrderLineSnapshot, OrderRecord,
        OrderType,
    },
    payments::{
        CheckoutSessionHandle, CheckoutSessionRequest, GatewayError, PaymentGateway, sign_payload,
    },
    services::order_code::OrderCodeSource,
    state::AppState,
    store::{InsertOutcome, MemoryOrderStore, OrderStore, StoreError},
};

pub const WEBHOOK_SECRET: &str = "whsec_test_secret";
pub const RESTAURANT_INBOX: &str = "cuisine@example.com";
pub const CUSTOMER_EMAIL: &str = "client@example.com";

pub fn menu() -> Arc<Menu> {
    let catalog = MenuCatalog::embedded().expect("embedded menu parses");
    Arc::new(Menu::new(catalog, PricingRules::default()))
}

pub fn test_config() -> AppConfig {
    AppConfig {
        stripe_secret_key: Some("sk_test_123".into()),
        stripe_webhook_secret: Some(WEBHOOK_SECRET.into()),
        restaurant_email: Some(RESTAURANT_INBOX.into()),
        ..AppConfig::default()
    }
}

/// Records session requests and hands out `cs_test_<n>` ids.
#[derive(Default)]
pub struct FakeGateway {
    requests: Mutex<Vec<CheckoutSessionRequest>>,
    customer_email: Mutex<Option<String>>,
    reject_with: Option<String>,
}

impl FakeGateway {
    pub fn rejecting(message: &str) -> Self {
        Self {
            reject_with: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn set_customer_email(&self, email: Option<&str>) {
        *self.customer_email.lock().unwrap() = email.map(str::to_string);
    }

    pub fn requests(&self) -> Vec<CheckoutSessionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSessionHandle, GatewayError> {
        if let Some(message) = &self.reject_with {
            return Err(GatewayError::Rejected(message.clone()));
        }
        let mut requests = self.requests.lock().unwrap();
        requests.push(request.clone());
        let id = format!("cs_test_{}", requests.len());
        Ok(CheckoutSessionHandle {
            url: format!("https://checkout.stripe.test/pay/{id}"),
            id,
        })
    }

    async fn session_customer_email(
        &self,
        _session_id: &str,
    ) -> Result<Option<String>, GatewayError> {
        Ok(self.customer_email.lock().unwrap().clone())
    }
}

/// Keeps delivered messages; fails for one recipient when asked to.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<EmailMessage>>,
    attempts: AtomicUsize,
    fail_for: Option<String>,
}

impl RecordingNotifier {
    pub fn failing_for(recipient: &str) -> Self {
        Self {
            fail_for: Some(recipient.to_string()),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotificationError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_for.as_deref() == Some(message.to.as_str()) {
            return Err(NotificationError::Transport("connection reset".into()));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Hands out the given codes in order, wrapping around.
pub struct SequencedCodes {
    codes: Vec<String>,
    next: AtomicUsize,
}

impl SequencedCodes {
    pub fn new(codes: &[&str]) -> Self {
        Self {
            codes: codes.iter().map(|code| code.to_string()).collect(),
            next: AtomicUsize::new(0),
        }
    }
}

impl OrderCodeSource for SequencedCodes {
    fn next_code(&self) -> String {
        let position = self.next.fetch_add(1, Ordering::SeqCst);
        self.codes[position % self.codes.len()].clone()
    }
}

/// Store whose every call fails, as if the database were down.
pub struct FailingStore;

#[async_trait]
impl OrderStore for FailingStore {
    async fn insert(&self, _order: NewOrder) -> Result<InsertOutcome, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn find_latest_by_session(
        &self,
        _session_reference: &str,
    ) -> Result<Option<OrderRecord>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn find_latest_since(
        &self,
        _since: DateTime<Utc>,
        _customer_email: Option<&str>,
    ) -> Result<Option<OrderRecord>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn find_latest(&self) -> Result<Option<OrderRecord>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

pub struct TestContext {
    pub state: AppState,
    pub store: Arc<MemoryOrderStore>,
    pub gateway: Arc<FakeGateway>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn context() -> TestContext {
    context_with(test_config(), FakeGateway::default(), RecordingNotifier::default())
}

pub fn context_with(
    config: AppConfig,
    gateway: FakeGateway,
    notifier: RecordingNotifier,
) -> TestContext {
    let store = Arc::new(MemoryOrderStore::new());
    let gateway = Arc::new(gateway);
    let notifier = Arc::new(notifier);
    let state = AppState {
        config: Arc::new(config),
        menu: menu(),
        store: store.clone(),
        gateway: gateway.clone(),
        notifier: notifier.clone(),
        order_codes: Arc::new(SequencedCodes::new(&["1234", "5678", "9012"])),
    };
    TestContext {
        state,
        store,
        gateway,
        notifier,
    }
}

/// Same collaborators as `state`, but every store call fails.
pub fn with_failing_store(state: &AppState) -> AppState {
    let store: Arc<dyn OrderStore> = Arc::new(FailingStore);
    AppState {
        store,
        ..state.clone()
    }
}

pub fn cart_line(id: &str, quantity: i64, options: &[(&str, &str)]) -> CartLine {
    CartLine {
        id: id.to_string(),
        name: None,
        base_price: None,
        quantity,
        selected_options: (!options.is_empty()).then(|| {
            options
                .iter()
                .map(|(title, value)| (title.to_string(), value.to_string()))
                .collect()
        }),
    }
}

pub fn customer(address: Option<&str>) -> CustomerInfo {
    CustomerInfo {
        name: "Marie Dupont".into(),
        email: CUSTOMER_EMAIL.into(),
        phone: "06 12 34 56 78".into(),
        address: address.map(str::to_string),
    }
}

/// Two shrimp curries, as stored in session metadata.
pub fn curry_order_data() -> String {
    json!([{
        "id": "curry",
        "name": "Curry",
        "quantity": 2,
        "selectedOptions": { "Choix de la viande": "Crevettes" },
        "price": "17.90"
    }])
    .to_string()
}

pub fn checkout_completed_event(session_id: &str, metadata: Value, amount_total: i64) -> Value {
    json!({
        "id": format!("evt_{session_id}"),
        "type": "checkout.session.completed",
        "data": {
            "object": {
                "id": session_id,
                "object": "checkout.session",
                "customer_email": CUSTOMER_EMAIL,
                "amount_total": amount_total,
                "payment_intent": "pi_test_1",
                "metadata": metadata
            }
        }
    })
}

pub fn delivery_metadata() -> Value {
    json!({
        "restaurantId": "le-bengale",
        "customerName": "Marie Dupont",
        "customerPhone": "06 12 34 56 78",
        "customerAddress": "12 Rue Stanislas, 54000 Nancy",
        "orderType": "delivery",
        "orderData": curry_order_data()
    })
}

/// `stripe-signature` header value for `payload`, signed now.
pub fn sign(payload: &[u8]) -> String {
    let timestamp = Utc::now().timestamp().to_string();
    format!(
        "t={timestamp},v1={}",
        sign_payload(payload, WEBHOOK_SECRET, &timestamp)
    )
}

pub fn new_order(code: &str, session: Option<&str>, email: Option<&str>) -> NewOrder {
    NewOrder {
        restaurant_id: "le-bengale".into(),
        customer_name: "Marie Dupont".into(),
        customer_email: email.map(str::to_string),
        customer_phone: "06 12 34 56 78".into(),
        customer_address: "12 Rue Stanislas, 54000 Nancy".into(),
        items: vec![OrderLineSnapshot {
            id: "curry".into(),
            name: Some("Curry".into()),
            quantity: 2,
            selected_options: Some(
                [("Choix de la viande".to_string(), "Crevettes".to_string())].into(),
            ),
            price: None,
        }],
        total_amount: Decimal::new(3830, 2),
        status: ORDER_STATUS_PAID.into(),
        payment_reference: Some("pi_test_1".into()),
        order_type: OrderType::Delivery,
        order_code: code.to_string(),
        payment_session_reference: session.map(str::to_string),
        idempotency_key: None,
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}
