//! Greeter Hub
//!
//! Occupancy-triggered meeting-room greeter: camera telemetry in,
//! in-room device greetings out.
//!
//! ## Architecture (8 Components)
//!
//! 1. CameraDirectory - static camera/zone/room configuration
//! 2. OccupancyStore - last-observed person counts per (camera, zone)
//! 3. ZoneEventHandler - telemetry interpretation and entry detection
//! 4. EntryWorkflow - snapshot -> identify -> meeting -> greet pipeline
//! 5. NotificationDispatcher - one-shot device command-channel sessions
//! 6. EventIngress - MQTT subscription and topic routing
//! 7. WebAPI - command ingress (device/bot messages, operator sends)
//! 8. External clients - camera vendor, identification, booking adapters
//!
//! ## Design Principles
//!
//! - Ingress never blocks on remote work: workflows run on a bounded pool
//! - Every external call is timeout-bounded; failures are terminal per
//!   invocation (at-most-once, best-effort)
//! - Unfinished contracts fail loudly with a typed error

pub mod booking_client;
pub mod camera_directory;
pub mod entry_workflow;
pub mod event_ingress;
pub mod identity_client;
pub mod meraki_client;
pub mod notification_dispatcher;
pub mod occupancy_store;
pub mod web_api;
pub mod zone_event_handler;
pub mod models;
pub mod error;
pub mod state;

pub use error::{Error, Result};
pub use state::AppState;
