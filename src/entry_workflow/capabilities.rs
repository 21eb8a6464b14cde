//! Capability contracts consumed by the entry workflow
//!
//! Each external collaborator sits behind a trait so the workflow can be
//! exercised against fakes and unfinished integrations fail with a typed
//! error instead of a panic.

use async_trait::async_trait;
use serde_json::Value;

use crate::booking_client::{DeviceEndpoint, Meeting};
use crate::error::Result;
use crate::identity_client::Person;
use crate::meraki_client::{Network, SnapshotCapture};

/// Camera vendor capability: directory walk and snapshot capture
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Resolve the network owning a camera
    async fn camera_network(&self, serial: &str) -> Result<Network>;

    /// Request a snapshot capture; never fails on a rejected request
    /// (degrades to placeholder data instead)
    async fn request_snapshot(&self, network_id: &str, serial: &str) -> Result<SnapshotCapture>;
}

/// Face-identification capability
#[async_trait]
pub trait PersonIdentifier: Send + Sync {
    /// Identify the person in a capture; `None` when nobody matched
    async fn identify(&self, capture_url: &str) -> Result<Option<Person>>;
}

/// Room-booking capability: device endpoints and meetings
#[async_trait]
pub trait BookingDirectory: Send + Sync {
    /// Resolve the in-room device endpoint for a room
    async fn room_device(&self, room_id: &str) -> Result<DeviceEndpoint>;

    /// Resolve the current meeting for a room; `None` when idle
    async fn current_meeting(&self, room_id: &str) -> Result<Option<Meeting>>;
}

/// Device command-channel capability
#[async_trait]
pub trait CommandChannel: Send + Sync {
    /// Send a structured payload over a one-shot session
    async fn send_json(&self, endpoint: &DeviceEndpoint, payload: &Value) -> Result<Value>;
}
