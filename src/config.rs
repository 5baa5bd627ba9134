use std::{env, str::FromStr};

use anyhow::Context;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub const DEFAULT_RESTAURANT_ID: &str = "le-bengale";
pub const DEFAULT_PUBLIC_BASE_URL: &str = "https://le-bengale.netlify.app";
pub const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";
pub const DEFAULT_METADATA_BUDGET_BYTES: usize = 500;
pub const DEFAULT_LOOKUP_WINDOW_MINUTES: i64 = 10;
pub const DEFAULT_WEBHOOK_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub restaurant_id: String,
    pub stripe_secret_key: Option<String>,
    pub stripe_webhook_secret: Option<String>,
    pub stripe_api_base: String,
    pub public_base_url: String,
    pub metadata_budget_bytes: usize,
    pub delivery_fee: Decimal,
    pub lookup_window_minutes: i64,
    pub webhook_dedup: bool,
    pub webhook_tolerance_secs: i64,
    pub verbose_errors: bool,
    pub menu_path: Option<String>,
    pub resend_api_key: Option<String>,
    pub mail_from: String,
    pub restaurant_email: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let delivery_fee = match optional("DELIVERY_FEE") {
            Some(raw) => Decimal::from_str(&raw)
                .with_context(|| format!("DELIVERY_FEE is not a decimal amount: {raw}"))?,
            None => dec!(2.50),
        };

        Ok(Self {
            database_url: optional("DATABASE_URL"),
            host,
            port,
            restaurant_id: optional("RESTAURANT_ID")
                .unwrap_or_else(|| DEFAULT_RESTAURANT_ID.to_string()),
            stripe_secret_key: optional("STRIPE_SECRET_KEY"),
            stripe_webhook_secret: optional("STRIPE_WEBHOOK_SECRET"),
            stripe_api_base: optional("STRIPE_API_BASE")
                .unwrap_or_else(|| DEFAULT_STRIPE_API_BASE.to_string()),
            public_base_url: optional("PUBLIC_BASE_URL")
                .unwrap_or_else(|| DEFAULT_PUBLIC_BASE_URL.to_string()),
            metadata_budget_bytes: parsed("METADATA_BUDGET_BYTES")?
                .unwrap_or(DEFAULT_METADATA_BUDGET_BYTES),
            delivery_fee,
            lookup_window_minutes: parsed("LOOKUP_WINDOW_MINUTES")?
                .unwrap_or(DEFAULT_LOOKUP_WINDOW_MINUTES),
            webhook_dedup: parsed("WEBHOOK_DEDUP")?.unwrap_or(true),
            webhook_tolerance_secs: parsed("WEBHOOK_TOLERANCE_SECS")?
                .unwrap_or(DEFAULT_WEBHOOK_TOLERANCE_SECS),
            verbose_errors: parsed("VERBOSE_ERRORS")?.unwrap_or(false),
            menu_path: optional("MENU_PATH"),
            resend_api_key: optional("RESEND_API_KEY"),
            mail_from: optional("MAIL_FROM")
                .unwrap_or_else(|| "Le Bengale <commandes@le-bengale.fr>".to_string()),
            restaurant_email: optional("RESTAURANT_EMAIL"),
        })
    }
}

impl Default for AppConfig {
    /// Local defaults with no credentials configured.
    fn default() -> Self {
        Self {
            database_url: None,
            host: "127.0.0.1".to_string(),
            port: 3000,
            restaurant_id: DEFAULT_RESTAURANT_ID.to_string(),
            stripe_secret_key: None,
            stripe_webhook_secret: None,
            stripe_api_base: DEFAULT_STRIPE_API_BASE.to_string(),
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_string(),
            metadata_budget_bytes: DEFAULT_METADATA_BUDGET_BYTES,
            delivery_fee: dec!(2.50),
            lookup_window_minutes: DEFAULT_LOOKUP_WINDOW_MINUTES,
            webhook_dedup: true,
            webhook_tolerance_secs: DEFAULT_WEBHOOK_TOLERANCE_SECS,
            verbose_errors: false,
            menu_path: None,
            resend_api_key: None,
            mail_from: "Le Bengale <commandes@le-bengale.fr>".to_string(),
            restaurant_email: None,
        }
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parsed<T>(key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    optional(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("{key} has an invalid value: {raw}"))
        })
        .transpose()
}
