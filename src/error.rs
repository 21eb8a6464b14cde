//! Error handling for the greeter hub

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Camera serial not present in the static configuration
    #[error("Unknown camera: {0}")]
    UnknownCamera(String),

    /// Zone id not configured for a known camera
    #[error("Unknown zone {zone_id} for camera {serial}")]
    UnknownZone { serial: String, zone_id: String },

    /// Not found (room bindings etc.)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Non-success response from an outbound service call
    #[error("{service} error: {detail}")]
    ExternalService { service: &'static str, detail: String },

    /// Per-step timeout expired
    #[error("Timed out during {0}")]
    Timeout(&'static str),

    /// Device command-channel failure
    #[error("Dispatch error: {0}")]
    Dispatch(String),

    /// Explicitly unfinished contract
    #[error("Not implemented: {0}")]
    NotImplemented(&'static str),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Config error
    #[error("Config error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            Error::UnknownCamera(serial) => (
                StatusCode::NOT_FOUND,
                "UNKNOWN_CAMERA",
                format!("Camera {} is not configured", serial),
            ),
            Error::UnknownZone { serial, zone_id } => (
                StatusCode::NOT_FOUND,
                "UNKNOWN_ZONE",
                format!("Zone {} is not configured for camera {}", zone_id, serial),
            ),
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            Error::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            Error::ExternalService { service, detail } => (
                StatusCode::BAD_GATEWAY,
                "EXTERNAL_SERVICE_ERROR",
                format!("{}: {}", service, detail),
            ),
            Error::Timeout(step) => (
                StatusCode::GATEWAY_TIMEOUT,
                "TIMEOUT",
                format!("Timed out during {}", step),
            ),
            Error::Dispatch(msg) => (StatusCode::BAD_GATEWAY, "DISPATCH_ERROR", msg.clone()),
            Error::NotImplemented(what) => (
                StatusCode::NOT_IMPLEMENTED,
                "NOT_IMPLEMENTED",
                (*what).to_string(),
            ),
            Error::Parse(msg) => (StatusCode::BAD_REQUEST, "PARSE_ERROR", msg.clone()),
            Error::Config(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIG_ERROR",
                msg.clone(),
            ),
            Error::Serialization(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "SERIALIZATION_ERROR",
                e.to_string(),
            ),
            Error::Http(e) => (StatusCode::BAD_GATEWAY, "HTTP_ERROR", e.to_string()),
            Error::Io(e) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR", e.to_string()),
        };

        tracing::error!(
            status = %status,
            error_code = %error_code,
            message = %message,
            "Request error"
        );

        let body = Json(json!({
            "error_code": error_code,
            "message": message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_zone_display() {
        let err = Error::UnknownZone {
            serial: "Q2GV-0001".to_string(),
            zone_id: "710577".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown zone 710577 for camera Q2GV-0001");
    }

    #[test]
    fn test_timeout_display() {
        let err = Error::Timeout("identify_person");
        assert_eq!(err.to_string(), "Timed out during identify_person");
    }
}
