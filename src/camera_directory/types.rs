//! Camera directory data types
//!
//! Static configuration for cameras and their analytics zones

use serde::{Deserialize, Serialize};

/// Designated entry zone name on the camera dashboard
pub const ENTRY_ZONE_NAME: &str = "Start";

/// Designated far-boundary zone name on the camera dashboard
pub const FAR_ZONE_NAME: &str = "Far";

/// Role a zone plays in the entry-detection scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneRole {
    /// Entry zone: an increase here means someone walked in
    Entry,
    /// Far boundary: an increase here is logged but triggers nothing
    FarBoundary,
    /// No scenario attached
    Plain,
}

/// Analytics zone configured on a camera
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// Zone id as it appears in the telemetry topic
    pub id: String,
    /// Human-readable zone name
    pub name: String,
    /// Explicit role; inferred from the name when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<ZoneRole>,
}

impl ZoneConfig {
    /// Effective role: the explicit one, or inferred from well-known names
    pub fn effective_role(&self) -> ZoneRole {
        if let Some(role) = self.role {
            return role;
        }
        match self.name.as_str() {
            ENTRY_ZONE_NAME => ZoneRole::Entry,
            FAR_ZONE_NAME => ZoneRole::FarBoundary,
            _ => ZoneRole::Plain,
        }
    }
}

/// Camera entity (static configuration)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Camera serial (as in telemetry topics and the vendor API)
    pub serial: String,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Room this camera watches (resolves to device/meeting lookups)
    #[serde(default)]
    pub room_id: Option<String>,
    /// Configured analytics zones, dashboard order
    #[serde(default)]
    pub zones: Vec<ZoneConfig>,
}

/// Root of the cameras TOML file
#[derive(Debug, Clone, Deserialize)]
pub struct CamerasFile {
    #[serde(default)]
    pub cameras: Vec<CameraConfig>,
}
