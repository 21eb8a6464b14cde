//! BookingClient - Room-Booking Service Adapter
//!
//! ## Responsibilities
//!
//! - Resolve the in-room device endpoint and credentials for a room
//! - Resolve the current meeting for a room
//! - Available-room lookup and attendee suggestions
//! - Meeting scheduling (contract only, not implemented upstream)

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::entry_workflow::capabilities::BookingDirectory;
use crate::error::{Error, Result};

/// In-room device endpoint and credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceEndpoint {
    pub ip: String,
    pub username: String,
    pub password: String,
}

/// Device info response: `{"credentials": {"IP": ..., "username": ..., "password": ...}}`
#[derive(Debug, Deserialize)]
struct RoomDeviceBody {
    credentials: RoomDeviceCredentials,
}

#[derive(Debug, Deserialize)]
struct RoomDeviceCredentials {
    #[serde(rename = "IP")]
    ip: String,
    username: String,
    password: String,
}

/// Meeting as returned by the booking service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    pub start_time: String,
    #[serde(default)]
    pub attendees: Vec<String>,
    pub subject: String,
}

/// Meeting request used by the scheduling contract
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingRequest {
    pub subject: String,
    pub attendees: Vec<String>,
    pub length_minutes: u32,
}

/// Available room returned by the booking service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableRoom {
    pub room_id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Room-booking service client
pub struct BookingClient {
    client: reqwest::Client,
    base_url: String,
}

impl BookingClient {
    /// Create a new booking client
    pub fn new(base_url: String) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    /// Create a new booking client with a custom request timeout
    pub fn with_timeout(base_url: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { client, base_url }
    }

    /// Resolve the device endpoint for a room
    pub async fn room_device(&self, room_id: &str) -> Result<DeviceEndpoint> {
        let url = format!("{}/room/{}/device", self.base_url, room_id);
        let resp = self.client.get(&url).send().await?;

        if !resp.status().is_success() {
            return Err(Error::ExternalService {
                service: "booking",
                detail: format!("device lookup for room {} failed: {}", room_id, resp.status()),
            });
        }

        let body: RoomDeviceBody = resp.json().await?;
        Ok(DeviceEndpoint {
            ip: body.credentials.ip,
            username: body.credentials.username,
            password: body.credentials.password,
        })
    }

    /// Resolve the current meeting for a room; `None` when the room is idle
    pub async fn current_meeting(&self, room_id: &str) -> Result<Option<Meeting>> {
        let url = format!("{}/room/{}/now", self.base_url, room_id);
        let resp = self.client.get(&url).send().await?;

        match resp.status() {
            status if status.is_success() => {
                let meeting: Meeting = resp.json().await?;
                Ok(Some(meeting))
            }
            reqwest::StatusCode::NOT_FOUND => Ok(None),
            status => Err(Error::ExternalService {
                service: "booking",
                detail: format!("meeting lookup for room {} failed: {}", room_id, status),
            }),
        }
    }

    /// Find a room available for a meeting of the given length (minutes)
    pub async fn available_room(&self, meeting_length: u32) -> Result<Option<AvailableRoom>> {
        let url = format!("{}/room/available?length={}", self.base_url, meeting_length);
        let resp = self.client.get(&url).send().await?;

        match resp.status() {
            status if status.is_success() => {
                let room: AvailableRoom = resp.json().await?;
                Ok(Some(room))
            }
            reqwest::StatusCode::NOT_FOUND => Ok(None),
            status => Err(Error::ExternalService {
                service: "booking",
                detail: format!("available-room lookup failed: {}", status),
            }),
        }
    }

    /// Suggest attendees for a person
    pub async fn suggest_attendees(&self, person_email: &str) -> Result<Vec<String>> {
        let url = format!("{}/person/suggest/{}", self.base_url, person_email);
        let resp = self.client.post(&url).send().await?;

        if !resp.status().is_success() {
            return Err(Error::ExternalService {
                service: "booking",
                detail: format!("attendee suggestion failed: {}", resp.status()),
            });
        }

        Ok(resp.json().await?)
    }

    /// Schedule a calendar meeting
    ///
    /// Contract only: the upstream integration does not exist yet and the
    /// call must fail loudly rather than pretend success.
    pub async fn schedule_meeting(&self, _request: &MeetingRequest) -> Result<Meeting> {
        Err(Error::NotImplemented("calendar meeting scheduling"))
    }
}

#[async_trait::async_trait]
impl BookingDirectory for BookingClient {
    async fn room_device(&self, room_id: &str) -> Result<DeviceEndpoint> {
        BookingClient::room_device(self, room_id).await
    }

    async fn current_meeting(&self, room_id: &str) -> Result<Option<Meeting>> {
        BookingClient::current_meeting(self, room_id).await
    }
}
