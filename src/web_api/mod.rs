//! WebAPI - Command Ingress
//!
//! ## Responsibilities
//!
//! - HTTP API routes
//! - Inbound device/bot message handling
//! - Operator-triggered device sends

mod routes;

pub use routes::create_router;

use std::sync::atomic::Ordering;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};

use crate::error::Result;
use crate::models::HealthResponse;
use crate::notification_dispatcher::{FollowUpMessage, FOLLOW_UP_MESSAGE_ID};
use crate::state::AppState;

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        mqtt_connected: state.mqtt_connected.load(Ordering::Relaxed),
        cameras_configured: state.directory.cameras().len(),
    };

    Json(response)
}

/// Status endpoint
pub async fn service_status(State(_state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "service": "greeter-hub",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

/// Handle an inbound device message
///
/// A "yes" choice from the device gets the follow-up message kind back on
/// the default device endpoint. Returns whether a reply was sent; dispatch
/// failures propagate to the HTTP layer.
pub async fn handle_device_message(state: &AppState, payload: &Value) -> Result<bool> {
    tracing::info!(payload = %payload, "Device message received");

    let choice = payload.get("choice").and_then(|v| v.as_str());
    if choice != Some("yes") {
        return Ok(false);
    }

    let follow_up = serde_json::to_value(FollowUpMessage {
        message_id: FOLLOW_UP_MESSAGE_ID,
    })?;
    state
        .dispatcher
        .send_json(&state.config.default_device_endpoint(), &follow_up)
        .await?;

    Ok(true)
}
