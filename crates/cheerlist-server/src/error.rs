//! Server error types.
//!
//! [`ServerError`] covers startup; [`AppError`] covers request handling and
//! knows how each failure is presented to the browser.

use std::io;

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::warn;

use cheerlist_providers::{ProviderError, ProviderErrorCode};

use crate::handler::EventsResponse;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur while starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// IO error (bind, accept).
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Provider setup error.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl ServerError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Result type for request handling.
pub type AppResult<T> = Result<T, AppError>;

/// Errors that can occur while handling a request.
///
/// Each variant maps to a fixed presentation: an HTTP status with a
/// `detail` body, a redirect home with an `error` query parameter, or a
/// `success: false` events body.
#[derive(Debug, Error)]
pub enum AppError {
    /// OAuth client settings are missing.
    #[error("{}", .0.message())]
    Configuration(ProviderError),

    /// The callback arrived without an authorization code.
    #[error("Authorization code not provided")]
    MissingCode,

    /// The provider rejected the authorization (bad code, denied consent,
    /// state mismatch).
    #[error("{}", .0.message())]
    Authorization(ProviderError),

    /// No session exists for the request.
    #[error("Not authenticated")]
    AuthenticationRequired,

    /// Refresh or event listing failed upstream.
    #[error("{}", .0.message())]
    Upstream(ProviderError),
}

impl AppError {
    /// Classifies a provider error raised during the OAuth handshake.
    pub fn from_authorization(err: ProviderError) -> Self {
        match err.code() {
            ProviderErrorCode::ConfigurationError => Self::Configuration(err),
            _ => Self::Authorization(err),
        }
    }

    /// Builds the redirect home carrying this error's message.
    ///
    /// The message is percent-encoded so the `Location` header stays valid;
    /// it still exposes the internal error text to the browser.
    pub fn into_error_redirect(self) -> Response {
        warn!(error = %self, "authorization callback failed");
        found(&format!("/?error={}", urlencoding::encode(&self.to_string())))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::Configuration(_) => {
                warn!(error = %self, "OAuth client is not configured");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": self.to_string() })),
                )
                    .into_response()
            }
            Self::MissingCode | Self::Authorization(_) => self.into_error_redirect(),
            Self::AuthenticationRequired => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "detail": self.to_string() })),
            )
                .into_response(),
            Self::Upstream(ref err) => {
                warn!(code = %err.code(), error = %err, "event fetch failed");
                Json(EventsResponse::failure(self.to_string())).into_response()
            }
        }
    }
}

/// A `302 Found` redirect to `location`.
pub(crate) fn found(location: &str) -> Response {
    match HeaderValue::try_from(location) {
        Ok(value) => (StatusCode::FOUND, [(header::LOCATION, value)]).into_response(),
        Err(e) => {
            warn!(error = %e, "redirect target is not a valid header value");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
