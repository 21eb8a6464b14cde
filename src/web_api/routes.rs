//! API Routes

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;

use crate::booking_client::MeetingRequest;
use crate::camera_directory::CameraConfig;
use crate::error::{Error, Result};
use crate::models::ApiResponse;
use crate::state::AppState;

/// Create API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health & Status
        .route("/healthz", get(super::health_check))
        .route("/api/status", get(super::service_status))
        // Configuration & occupancy
        .route("/api/cameras", get(list_cameras))
        .route("/api/occupancy", get(occupancy_snapshot))
        // Device messaging
        .route("/api/messages/device", post(on_device_message))
        .route("/api/messages/send", post(send_device_message))
        .route("/api/messages/bot", post(on_bot_message))
        // Booking
        .route("/api/rooms/available", get(available_room))
        .route("/api/meetings/schedule", post(schedule_meeting))
        .route("/api/attendees/suggest/:email", post(suggest_attendees))
        .with_state(state)
}

// ========================================
// Configuration & Occupancy Handlers
// ========================================

async fn list_cameras(State(state): State<AppState>) -> impl IntoResponse {
    let cameras: Vec<CameraConfig> = state.directory.cameras().into_iter().cloned().collect();
    Json(ApiResponse::success(cameras))
}

async fn occupancy_snapshot(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::success(state.occupancy.snapshot().await))
}

// ========================================
// Device Messaging Handlers
// ========================================

async fn on_device_message(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse> {
    let answered = super::handle_device_message(&state, &payload).await?;
    Ok(Json(ApiResponse::success(
        serde_json::json!({ "answered": answered }),
    )))
}

/// Forward the request body verbatim to the default device endpoint.
/// Dispatch failures surface as non-2xx responses.
async fn send_device_message(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse> {
    let response = state
        .dispatcher
        .send_json(&state.config.default_device_endpoint(), &payload)
        .await?;
    Ok(Json(ApiResponse::success(response)))
}

async fn on_bot_message(
    State(_state): State<AppState>,
    Json(_payload): Json<Value>,
) -> Result<impl IntoResponse> {
    // Contract reserved for the chat-bot integration
    Err::<Json<ApiResponse<Value>>, Error>(Error::NotImplemented("bot message handling"))
}

// ========================================
// Booking Handlers
// ========================================

#[derive(Debug, Deserialize)]
struct AvailableRoomQuery {
    length: u32,
}

async fn available_room(
    State(state): State<AppState>,
    Query(query): Query<AvailableRoomQuery>,
) -> Result<impl IntoResponse> {
    let room = state
        .booking
        .available_room(query.length)
        .await?
        .ok_or_else(|| {
            Error::NotFound(format!(
                "No room available for {} minutes",
                query.length
            ))
        })?;
    Ok(Json(ApiResponse::success(room)))
}

async fn schedule_meeting(
    State(state): State<AppState>,
    Json(request): Json<MeetingRequest>,
) -> Result<impl IntoResponse> {
    let meeting = state.booking.schedule_meeting(&request).await?;
    Ok(Json(ApiResponse::success(meeting)))
}

async fn suggest_attendees(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse> {
    let suggestions = state.booking.suggest_attendees(&email).await?;
    Ok(Json(ApiResponse::success(suggestions)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking_client::BookingClient;
    use crate::camera_directory::{CameraDirectory, ZoneConfig};
    use crate::entry_workflow::WorkflowQueue;
    use crate::notification_dispatcher::Dispatcher;
    use crate::occupancy_store::{OccupancyKey, OccupancyStore};
    use crate::state::AppConfig;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use tokio::sync::mpsc;
    use tower::util::ServiceExt;

    fn test_state() -> AppState {
        let directory = Arc::new(CameraDirectory::new(vec![CameraConfig {
            serial: "Q2GV-0001".to_string(),
            name: Some("Lobby".to_string()),
            room_id: Some("boardroom-1".to_string()),
            zones: vec![ZoneConfig {
                id: "710577".to_string(),
                name: "Start".to_string(),
                role: None,
            }],
        }]));
        let (tx, _rx) = mpsc::channel(4);

        AppState {
            config: AppConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                mqtt_broker_host: "localhost".to_string(),
                mqtt_broker_port: 1883,
                mqtt_client_id: "test".to_string(),
                meraki_base_url: "http://localhost:0".to_string(),
                meraki_api_key: String::new(),
                data_api_base_url: "http://localhost:0".to_string(),
                cameras_file: "cameras.toml".to_string(),
                device_ip: "127.0.0.1:1".to_string(),
                device_username: "cisco".to_string(),
                device_password: "cisco".to_string(),
                step_timeout_sec: 1,
                workflow_workers: 1,
                workflow_queue_capacity: 4,
            },
            directory,
            occupancy: Arc::new(OccupancyStore::new()),
            booking: Arc::new(BookingClient::new("http://localhost:0".to_string())),
            dispatcher: Arc::new(Dispatcher::new()),
            workflow_queue: WorkflowQueue::from_sender(tx),
            mqtt_connected: Arc::new(AtomicBool::new(false)),
        }
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_healthz() {
        let app = create_router(test_state());
        let response = app
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["cameras_configured"], 1);
    }

    #[tokio::test]
    async fn test_list_cameras() {
        let app = create_router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/cameras")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"][0]["serial"], "Q2GV-0001");
    }

    #[tokio::test]
    async fn test_occupancy_snapshot() {
        let state = test_state();
        state
            .occupancy
            .set(OccupancyKey::zone("Q2GV-0001", "710577"), 2)
            .await;

        let app = create_router(state);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/occupancy")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"][0]["count"], 2);
    }

    #[tokio::test]
    async fn test_bot_message_not_implemented() {
        let app = create_router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/messages/bot")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
        let body = body_json(response).await;
        assert_eq!(body["error_code"], "NOT_IMPLEMENTED");
    }

    #[tokio::test]
    async fn test_schedule_meeting_not_implemented() {
        let app = create_router(test_state());
        let request_body = r#"{"subject": "Sync", "attendees": [], "length_minutes": 30}"#;
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/meetings/schedule")
                    .header("content-type", "application/json")
                    .body(Body::from(request_body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    }

    #[tokio::test]
    async fn test_device_message_without_choice_is_acknowledged() {
        let app = create_router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/messages/device")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"event": "ping"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["answered"], false);
    }

    #[tokio::test]
    async fn test_send_failure_maps_to_bad_gateway() {
        // Default device endpoint points at a closed port, so the dispatch
        // fails and must surface as a non-2xx response.
        let app = create_router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/messages/send")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"messageId": 1}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert_eq!(body["error_code"], "DISPATCH_ERROR");
    }
}
