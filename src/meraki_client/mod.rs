//! MerakiClient - Camera Vendor API Adapter
//!
//! ## Responsibilities
//!
//! - Resolve the network owning a camera (organization -> network -> device walk)
//! - Request snapshot captures (202-Accepted semantics)
//! - Degrade a rejected capture to placeholder data instead of failing

use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::entry_workflow::capabilities::SnapshotSource;
use crate::error::{Error, Result};

/// API-key header used by the vendor API
const API_KEY_HEADER: &str = "X-Cisco-Meraki-API-Key";

/// Placeholder snapshot reference used when a capture request is rejected.
/// Downstream identification still runs with best-effort data.
const PLACEHOLDER_SNAPSHOT_URL: &str =
    "https://spn4.meraki.com/stream/jpeg/snapshot/b2d123asdf423qd22d2";
const PLACEHOLDER_SNAPSHOT_EXPIRY: &str = "Access to the image will expire one day";

/// Organization from the vendor directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Network from the vendor directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Device from the per-network device listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub serial: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Snapshot capture result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotCapture {
    /// URL the image will be served from once processed
    pub url: String,
    /// Expiry note from the vendor
    pub expiry: String,
    /// True when the capture request was rejected and placeholder data
    /// was substituted
    #[serde(default)]
    pub degraded: bool,
}

impl SnapshotCapture {
    /// Placeholder capture for the degrade-gracefully path
    pub fn placeholder() -> Self {
        Self {
            url: PLACEHOLDER_SNAPSHOT_URL.to_string(),
            expiry: PLACEHOLDER_SNAPSHOT_EXPIRY.to_string(),
            degraded: true,
        }
    }
}

/// Body of an accepted snapshot request
#[derive(Debug, Deserialize)]
struct SnapshotResponseBody {
    url: String,
    #[serde(default)]
    expiry: Option<String>,
}

/// Interpret a snapshot response: 202 carries the real capture, anything
/// else degrades to the placeholder.
fn capture_from_response(status: StatusCode, body: &str) -> SnapshotCapture {
    if status != StatusCode::ACCEPTED {
        tracing::warn!(
            status = %status,
            "Snapshot request not accepted, substituting placeholder capture"
        );
        return SnapshotCapture::placeholder();
    }

    match serde_json::from_str::<SnapshotResponseBody>(body) {
        Ok(parsed) => SnapshotCapture {
            url: parsed.url,
            expiry: parsed
                .expiry
                .unwrap_or_else(|| PLACEHOLDER_SNAPSHOT_EXPIRY.to_string()),
            degraded: false,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Snapshot response unparseable, substituting placeholder");
            SnapshotCapture::placeholder()
        }
    }
}

/// Camera vendor API client
pub struct MerakiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl MerakiClient {
    /// Create a new vendor client
    pub fn new(base_url: String, api_key: String) -> Self {
        Self::with_timeout(base_url, api_key, Duration::from_secs(30))
    }

    /// Create a new vendor client with a custom request timeout
    pub fn with_timeout(base_url: String, api_key: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url,
            api_key,
        }
    }

    /// List organizations visible to the API key
    pub async fn get_organizations(&self) -> Result<Vec<Organization>> {
        let url = format!("{}/organizations", self.base_url);
        let resp = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Error::ExternalService {
                service: "meraki",
                detail: format!("organization listing failed: {}", resp.status()),
            });
        }

        Ok(resp.json().await?)
    }

    /// List networks in an organization
    pub async fn get_organization_networks(&self, organization_id: &str) -> Result<Vec<Network>> {
        let url = format!(
            "{}/organizations/{}/networks",
            self.base_url, organization_id
        );
        let resp = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Error::ExternalService {
                service: "meraki",
                detail: format!("network listing failed: {}", resp.status()),
            });
        }

        Ok(resp.json().await?)
    }

    /// List devices in a network
    pub async fn get_network_devices(&self, network_id: &str) -> Result<Vec<Device>> {
        let url = format!("{}/networks/{}/devices", self.base_url, network_id);
        let resp = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Error::ExternalService {
                service: "meraki",
                detail: format!("device listing failed: {}", resp.status()),
            });
        }

        Ok(resp.json().await?)
    }

    /// Walk the directory until the network owning a camera is found
    pub async fn find_camera_network(&self, serial: &str) -> Result<Network> {
        for org in self.get_organizations().await? {
            for network in self.get_organization_networks(&org.id).await? {
                let devices = self.get_network_devices(&network.id).await?;
                if devices.iter().any(|d| d.serial == serial) {
                    tracing::debug!(
                        camera_serial = %serial,
                        network_id = %network.id,
                        "Camera network resolved"
                    );
                    return Ok(network);
                }
            }
        }

        Err(Error::NotFound(format!(
            "Camera {} not found in any vendor network",
            serial
        )))
    }

    /// Request a snapshot capture from a camera
    ///
    /// A non-202 response does not fail the call: the capture degrades to
    /// placeholder data so the caller's pipeline keeps going.
    pub async fn request_snapshot(
        &self,
        network_id: &str,
        serial: &str,
    ) -> Result<SnapshotCapture> {
        let url = format!(
            "{}/networks/{}/cameras/{}/snapshot",
            self.base_url, network_id, serial
        );
        let resp = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        Ok(capture_from_response(status, &body))
    }
}

#[async_trait::async_trait]
impl SnapshotSource for MerakiClient {
    async fn camera_network(&self, serial: &str) -> Result<Network> {
        self.find_camera_network(serial).await
    }

    async fn request_snapshot(&self, network_id: &str, serial: &str) -> Result<SnapshotCapture> {
        MerakiClient::request_snapshot(self, network_id, serial).await
    }
}
