use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::Deserialize;

use super::{CheckoutSessionHandle, CheckoutSessionRequest, GatewayError, PaymentGateway};

#[derive(Debug, Deserialize)]
struct CreateCheckoutSessionResponse {
    id: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct RetrievedSession {
    customer_email: Option<String>,
    customer_details: Option<RetrievedCustomerDetails>,
}

#[derive(Debug, Deserialize)]
struct RetrievedCustomerDetails {
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorBody,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StripeClient {
    client: Client,
    api_base: String,
    secret_key: Option<String>,
}

impl StripeClient {
    pub fn new(api_base: impl Into<String>, secret_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            secret_key,
        }
    }

    fn secret_key(&self) -> Result<&str, GatewayError> {
        self.secret_key.as_deref().ok_or(GatewayError::NotConfigured)
    }

    /// `GET /v1/checkout/sessions/{id}`, with the id as a single escaped segment.
    fn session_url(&self, session_id: &str) -> Result<Url, GatewayError> {
        if !is_session_id(session_id) {
            return Err(GatewayError::InvalidSessionId(session_id.to_string()));
        }
        let mut url = Url::parse(&format!("{}/v1/checkout/sessions", self.api_base))
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| GatewayError::Transport(format!("invalid API base {}", self.api_base)))?
            .push(session_id);
        Ok(url)
    }

    /// Form fields for `POST /v1/checkout/sessions`.
    pub fn session_form(request: &CheckoutSessionRequest) -> Vec<(String, String)> {
        let mut form = vec![
            ("mode".to_string(), "payment".to_string()),
            ("payment_method_types[0]".to_string(), "card".to_string()),
            ("success_url".to_string(), request.success_url.clone()),
            ("cancel_url".to_string(), request.cancel_url.clone()),
        ];
        if let Some(email) = request.customer_email.as_ref().filter(|e| !e.is_empty()) {
            form.push(("customer_email".to_string(), email.clone()));
        }

        for (i, item) in request.line_items.iter().enumerate() {
            let prefix = format!("line_items[{i}]");
            form.push((
                format!("{prefix}[price_data][currency]"),
                item.currency.clone(),
            ));
            form.push((
                format!("{prefix}[price_data][product_data][name]"),
                item.name.clone(),
            ));
            if let Some(description) = &item.description {
                form.push((
                    format!("{prefix}[price_data][product_data][description]"),
                    description.clone(),
                ));
            }
            form.push((
                format!("{prefix}[price_data][unit_amount]"),
                item.unit_amount.to_string(),
            ));
            form.push((format!("{prefix}[quantity]"), item.quantity.to_string()));
        }

        for (key, value) in request.metadata.pairs() {
            form.push((format!("metadata[{key}]"), value.to_string()));
        }

        form
    }
}

#[async_trait]
impl PaymentGateway for StripeClient {
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSessionHandle, GatewayError> {
        let secret_key = self.secret_key()?;
        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .basic_auth(secret_key, None::<&str>)
            .form(&Self::session_form(request))
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let response = error_for_status(response).await?;
        let session: CreateCheckoutSessionResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        Ok(CheckoutSessionHandle {
            id: session.id,
            url: session.url,
        })
    }

    async fn session_customer_email(
        &self,
        session_id: &str,
    ) -> Result<Option<String>, GatewayError> {
        let url = self.session_url(session_id)?;
        let secret_key = self.secret_key()?;
        let response = self
            .client
            .get(url)
            .basic_auth(secret_key, None::<&str>)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let response = error_for_status(response).await?;
        let session: RetrievedSession = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        Ok(session
            .customer_email
            .or_else(|| session.customer_details.and_then(|details| details.email))
            .filter(|email| !email.is_empty()))
    }
}

/// Session ids are `cs_` followed by ASCII alphanumerics and underscores.
fn is_session_id(session_id: &str) -> bool {
    session_id.strip_prefix("cs_").is_some_and(|rest| {
        !rest.is_empty() && rest.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    })
}

async fn error_for_status(response: Response) -> Result<Response, GatewayError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<StripeErrorEnvelope>(&body)
        .ok()
        .and_then(|envelope| envelope.error.message)
        .unwrap_or_else(|| format!("Stripe API error ({status}): {body}"));
    Err(GatewayError::Rejected(message))
}
