//! Transactional email delivery.
//!
//! Two modes:
//! 1. Send via the Resend API when an API key is configured
//! 2. Log only (no email leaves the process)

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;

const RESEND_API_URL: &str = "https://api.resend.com/emails";

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("email transport failed: {0}")]
    Transport(String),

    #[error("email provider rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotificationError>;
}

#[derive(Debug, Serialize)]
struct ResendEmailRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    text: &'a str,
    html: &'a str,
}

#[derive(Clone)]
pub struct ResendMailer {
    api_key: String,
    from: String,
    http_client: Client,
}

impl ResendMailer {
    pub fn new(api_key: String, from: String) -> Self {
        Self {
            api_key,
            from,
            http_client: Client::new(),
        }
    }
}

#[async_trait]
impl Notifier for ResendMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotificationError> {
        let request = ResendEmailRequest {
            from: &self.from,
            to: vec![message.to.as_str()],
            subject: &message.subject,
            text: &message.text,
            html: &message.html,
        };

        let response = self
            .http_client
            .post(RESEND_API_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| NotificationError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Rejected { status, body });
        }

        tracing::info!(to = %message.to, subject = %message.subject, "email sent via Resend");
        Ok(())
    }
}

/// Used when no email API key is configured.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Notifier for LogMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotificationError> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            "email delivery disabled, message logged only"
        );
        tracing::debug!(body = %message.text, "email body");
        Ok(())
    }
}
