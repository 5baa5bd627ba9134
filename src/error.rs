use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::{
    payments::{GatewayError, SignatureError},
    services::pricing::PricingError,
    store::StoreError,
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Configuration(String),

    #[error("Webhook Error: {0}")]
    SignatureInvalid(String),

    #[error("Database error")]
    Persistence(#[from] StoreError),

    #[error("{0}")]
    SessionCreation(String),

    #[error("Order not found")]
    OrderNotFound,

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl From<PricingError> for AppError {
    fn from(err: PricingError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<SignatureError> for AppError {
    fn from(err: SignatureError) -> Self {
        AppError::SignatureInvalid(err.to_string())
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::NotConfigured => {
                AppError::Configuration("Payment provider is not configured".into())
            }
            other => AppError::SessionCreation(other.to_string()),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::SignatureInvalid(_) => StatusCode::BAD_REQUEST,
            AppError::OrderNotFound => StatusCode::NOT_FOUND,
            AppError::Configuration(_)
            | AppError::Persistence(_)
            | AppError::SessionCreation(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Persistence(err) => tracing::error!(error = %err, "persistence failure"),
            AppError::Internal(err) => tracing::error!(error = ?err, "internal error"),
            AppError::Configuration(msg) => tracing::error!(%msg, "configuration error"),
            _ => tracing::debug!(%status, error = %self, "request rejected"),
        }

        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
