use axum::http::{HeaderName, Request, Response};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use std::{net::SocketAddr, sync::Arc, time::Duration};

use bengale_checkout::{
    catalog::{Menu, MenuCatalog, PricingRules},
    config::AppConfig,
    db::{MIGRATIONS_DIR, create_orm_conn, run_migrations},
    email::{LogMailer, Notifier, ResendMailer},
    payments::StripeClient,
    routes::create_router,
    services::order_code::RandomOrderCode,
    state::AppState,
    store::{MemoryOrderStore, OrderStore, SeaOrmOrderStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,bengale_checkout=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let state = build_state(config).await?;
    let addr = SocketAddr::from((
        state.config.host.parse::<std::net::IpAddr>()?,
        state.config.port,
    ));

    let concurrency_limit_layer = ConcurrencyLimitLayer::new(100);
    let request_id_header = HeaderName::from_static("x-request-id");
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<_>| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|value| value.to_str().ok())
                .unwrap_or("-");
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id
            )
        })
        .on_request(|request: &Request<_>, _span: &tracing::Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "request started"
            );
        })
        .on_response(|response: &Response<_>, latency: Duration, _span: &tracing::Span| {
            tracing::info!(
                status = %response.status(),
                ms = %latency.as_millis(),
                "request finished"
            );
        });

    let app = create_router(state)
        .layer(trace_layer)
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(RequestBodyLimitLayer::new(1024 * 1024))
        .layer(concurrency_limit_layer);

    tracing::info!("listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;

    Ok(())
}

async fn build_state(config: AppConfig) -> anyhow::Result<AppState> {
    let catalog = MenuCatalog::load(config.menu_path.as_deref()).await?;
    let menu = Menu::new(catalog, PricingRules::with_delivery_fee(config.delivery_fee));
    tracing::info!(items = menu.prices().len(), "menu loaded");

    let store: Arc<dyn OrderStore> = match config.database_url.as_deref() {
        Some(url) => {
            let orm = create_orm_conn(url).await?;
            run_migrations(&orm, MIGRATIONS_DIR).await?;
            Arc::new(SeaOrmOrderStore::new(orm))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, orders are kept in memory only");
            Arc::new(MemoryOrderStore::new())
        }
    };

    if config.stripe_secret_key.is_none() {
        tracing::warn!("STRIPE_SECRET_KEY not set, checkout sessions cannot be created");
    }
    if config.stripe_webhook_secret.is_none() {
        tracing::warn!("STRIPE_WEBHOOK_SECRET not set, webhooks will be rejected");
    }
    let gateway = StripeClient::new(
        config.stripe_api_base.clone(),
        config.stripe_secret_key.clone(),
    );

    let notifier: Arc<dyn Notifier> = match config.resend_api_key.clone() {
        Some(api_key) => Arc::new(ResendMailer::new(api_key, config.mail_from.clone())),
        None => {
            tracing::warn!("RESEND_API_KEY not set, notifications are logged only");
            Arc::new(LogMailer)
        }
    };

    Ok(AppState {
        config: Arc::new(config),
        menu: Arc::new(menu),
        store,
        gateway: Arc::new(gateway),
        notifier,
        order_codes: Arc::new(RandomOrderCode),
    })
}
