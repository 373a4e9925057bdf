//! HTTP error response conversion
//!
//! Handlers return `Result<Response, HttpAppError>`. The orchestrator recovers
//! from almost everything by substituting the fallback image, so what reaches
//! this module is the short list of failures with nothing left to serve.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use imagehandler_core::{AppError, ErrorMetadata, LogLevel};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Whether this error is recoverable (can be retried)
    pub recoverable: bool,
}

/// Wrapper type for AppError to implement IntoResponse
/// This is necessary because of Rust's orphan rules - we can't implement
/// IntoResponse (external trait) for AppError (external type from imagehandler-core)
#[derive(Debug)]
pub struct HttpAppError {
    pub error: AppError,
    /// Production deployments never echo error details.
    pub production: bool,
}

impl HttpAppError {
    pub fn new(error: AppError, production: bool) -> Self {
        HttpAppError { error, production }
    }
}

fn log_error(error: &AppError) {
    let code = error.error_code();
    match error.log_level() {
        LogLevel::Debug => tracing::debug!(error = %error, code, "Request failed"),
        LogLevel::Error => tracing::error!(error = %error, code, "Request failed"),
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.error;
        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        let details = if self.production || app_error.is_sensitive() {
            None
        } else {
            Some(app_error.to_string())
        };

        let body = Json(ErrorResponse {
            error: app_error.client_message(),
            details,
            code: app_error.error_code().to_string(),
            recoverable: app_error.is_recoverable(),
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let response =
            HttpAppError::new(AppError::Internal("disk on fire".to_string()), false).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Internal server error");
        assert_eq!(body["code"], "INTERNAL_ERROR");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_bad_request_maps_to_400() {
        let response =
            HttpAppError::new(AppError::BadRequest("nope".to_string()), false).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "nope");
        assert_eq!(body["code"], "BAD_REQUEST");
        assert_eq!(body["recoverable"], false);
        assert_eq!(body["details"], "Bad request: nope");
    }

    #[tokio::test]
    async fn test_production_hides_details() {
        let response =
            HttpAppError::new(AppError::BadRequest("nope".to_string()), true).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "nope");
        assert!(body.get("details").is_none());
    }
}
