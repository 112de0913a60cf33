//! API error types and HTTP response mapping.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use edgehub_core::{AttemptFailure, ControlAction, CoreError, ValidationError};
use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;

/// Request-level failures with structured responses.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("no location found for '{city}'")]
    CityNotFound { city: String },

    #[error("provider '{provider}' rejected the request with status {status}")]
    UpstreamRejected { provider: &'static str, status: u16 },

    /// Every provider failed transiently; reported as 504.
    #[error("all providers failed")]
    AllProvidersFailed { attempts: Vec<AttemptFailure> },

    /// Every provider failed transiently on a route that only exposes 502.
    #[error("upstream unavailable")]
    UpstreamUnavailable { attempts: Vec<AttemptFailure> },

    #[error("upstream request failed: {message}")]
    ProxyTransport { message: String },

    #[error("{feature} is not configured")]
    NotConfigured { feature: &'static str },

    #[error("Method Not Allowed")]
    MethodNotAllowed { allow: &'static str },

    #[error("Not Found")]
    NotFound,

    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON body returned for every error except 404 and 405.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<&'static str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<Vec<AttemptFailure>>,
}

impl ApiError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation(error) if error.is_forbidden() => "forbidden",
            ApiError::Validation(_) => "invalid_request",
            ApiError::CityNotFound { .. } => "city_not_found",
            ApiError::UpstreamRejected { .. } => "upstream_rejected",
            ApiError::AllProvidersFailed { .. } => "all_providers_failed",
            ApiError::UpstreamUnavailable { .. } => "upstream_unavailable",
            ApiError::ProxyTransport { .. } => "upstream_unreachable",
            ApiError::NotConfigured { .. } => "not_configured",
            ApiError::MethodNotAllowed { .. } => "method_not_allowed",
            ApiError::NotFound => "not_found",
            ApiError::Internal(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(error) if error.is_forbidden() => StatusCode::FORBIDDEN,
            ApiError::Validation(_) | ApiError::CityNotFound { .. } => StatusCode::BAD_REQUEST,
            ApiError::UpstreamRejected { .. }
            | ApiError::UpstreamUnavailable { .. }
            | ApiError::ProxyTransport { .. } => StatusCode::BAD_GATEWAY,
            ApiError::AllProvidersFailed { .. } => StatusCode::GATEWAY_TIMEOUT,
            ApiError::NotConfigured { .. } => StatusCode::NOT_IMPLEMENTED,
            ApiError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn to_body(&self) -> ErrorResponse {
        let allowed = match self {
            ApiError::Validation(ValidationError::InvalidAction { .. }) => Some(ControlAction::allowed()),
            _ => None,
        };
        let attempts = match self {
            ApiError::AllProvidersFailed { attempts } | ApiError::UpstreamUnavailable { attempts } => {
                Some(attempts.clone())
            }
            _ => None,
        };
        ErrorResponse {
            error: self.error_code(),
            message: self.to_string(),
            allowed,
            attempts,
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(error: CoreError) -> Self {
        ApiError::Internal(error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            ApiError::MethodNotAllowed { allow } => {
                let mut response = (status, "Method Not Allowed").into_response();
                response
                    .headers_mut()
                    .insert(header::ALLOW, HeaderValue::from_static(allow));
                response
            }
            ApiError::NotFound => (status, "Not Found").into_response(),
            ApiError::Internal(ref message) => {
                tracing::error!(%message, "internal error");
                (status, Json(self.to_body())).into_response()
            }
            _ => (status, Json(self.to_body())).into_response(),
        }
    }
}

/// Failures that stop the gateway from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to initialize logging: {0}")]
    Logging(String),

    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;
