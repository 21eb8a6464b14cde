//! Application state
//!
//! Holds all shared components and state

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use crate::booking_client::{BookingClient, DeviceEndpoint};
use crate::camera_directory::CameraDirectory;
use crate::entry_workflow::WorkflowQueue;
use crate::notification_dispatcher::Dispatcher;
use crate::occupancy_store::OccupancyStore;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Telemetry broker host
    pub mqtt_broker_host: String,
    /// Telemetry broker port
    pub mqtt_broker_port: u16,
    /// Telemetry client id
    pub mqtt_client_id: String,
    /// Camera vendor API base URL
    pub meraki_base_url: String,
    /// Camera vendor API key
    pub meraki_api_key: String,
    /// Booking/identification data API base URL
    pub data_api_base_url: String,
    /// Cameras TOML file path
    pub cameras_file: String,
    /// Default in-room device for HTTP-triggered sends and follow-ups
    pub device_ip: String,
    pub device_username: String,
    pub device_password: String,
    /// Per-step timeout for workflow external calls (seconds)
    pub step_timeout_sec: u64,
    /// Workflow worker count
    pub workflow_workers: usize,
    /// Workflow queue capacity
    pub workflow_queue_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            mqtt_broker_host: std::env::var("MQTT_BROKER_HOST")
                .unwrap_or_else(|_| "localhost".to_string()),
            mqtt_broker_port: std::env::var("MQTT_BROKER_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(1883),
            mqtt_client_id: std::env::var("MQTT_CLIENT_ID")
                .unwrap_or_else(|_| "greeter-hub".to_string()),
            meraki_base_url: std::env::var("MERAKI_BASE_URL")
                .unwrap_or_else(|_| "https://api.meraki.com/api/v0".to_string()),
            meraki_api_key: std::env::var("MERAKI_API_KEY").unwrap_or_default(),
            data_api_base_url: std::env::var("DATA_API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:9000".to_string()),
            cameras_file: std::env::var("CAMERAS_FILE")
                .unwrap_or_else(|_| "cameras.toml".to_string()),
            device_ip: std::env::var("DEVICE_IP")
                .unwrap_or_else(|_| "10.89.130.68".to_string()),
            device_username: std::env::var("DEVICE_USERNAME")
                .unwrap_or_else(|_| "cisco".to_string()),
            device_password: std::env::var("DEVICE_PASSWORD")
                .unwrap_or_else(|_| "cisco".to_string()),
            step_timeout_sec: std::env::var("STEP_TIMEOUT_SEC")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(10),
            workflow_workers: std::env::var("WORKFLOW_WORKERS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(2),
            workflow_queue_capacity: std::env::var("WORKFLOW_QUEUE_CAPACITY")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(32),
        }
    }
}

impl AppConfig {
    /// Per-step workflow timeout
    pub fn step_timeout(&self) -> Duration {
        Duration::from_secs(self.step_timeout_sec)
    }

    /// Default device endpoint for HTTP-triggered sends
    pub fn default_device_endpoint(&self) -> DeviceEndpoint {
        DeviceEndpoint {
            ip: self.device_ip.clone(),
            username: self.device_username.clone(),
            password: self.device_password.clone(),
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Application config
    pub config: AppConfig,
    /// Static camera directory
    pub directory: Arc<CameraDirectory>,
    /// Occupancy state store
    pub occupancy: Arc<OccupancyStore>,
    /// Booking/data API client
    pub booking: Arc<BookingClient>,
    /// Device command-channel dispatcher
    pub dispatcher: Arc<Dispatcher>,
    /// Entry workflow queue
    pub workflow_queue: WorkflowQueue,
    /// Telemetry broker connection flag
    pub mqtt_connected: Arc<AtomicBool>,
}
