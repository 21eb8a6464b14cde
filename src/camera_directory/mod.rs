//! CameraDirectory - Static Camera/Zone Lookup
//!
//! ## Responsibilities
//!
//! - Load the camera set from a TOML file at startup
//! - Resolve camera serials to their configuration
//! - Resolve zone ids to zone name/role
//! - Resolve the room bound to a camera
//!
//! Immutable after load; lookups are pure.

pub mod types;

use std::collections::HashMap;
use std::path::Path;

use crate::error::{Error, Result};

pub use types::{CameraConfig, CamerasFile, ZoneConfig, ZoneRole, ENTRY_ZONE_NAME, FAR_ZONE_NAME};

/// Static camera directory
pub struct CameraDirectory {
    cameras: HashMap<String, CameraConfig>,
}

impl CameraDirectory {
    /// Build a directory from an already-parsed camera list
    pub fn new(cameras: Vec<CameraConfig>) -> Self {
        let cameras = cameras
            .into_iter()
            .map(|c| (c.serial.clone(), c))
            .collect();
        Self { cameras }
    }

    /// Load the directory from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let file: CamerasFile = toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;

        if file.cameras.is_empty() {
            tracing::warn!(path = %path.display(), "Camera file contains no cameras");
        }

        Ok(Self::new(file.cameras))
    }

    /// All configured cameras
    pub fn cameras(&self) -> Vec<&CameraConfig> {
        let mut all: Vec<&CameraConfig> = self.cameras.values().collect();
        all.sort_by(|a, b| a.serial.cmp(&b.serial));
        all
    }

    /// Look up a camera by serial
    pub fn camera(&self, serial: &str) -> Result<&CameraConfig> {
        self.cameras
            .get(serial)
            .ok_or_else(|| Error::UnknownCamera(serial.to_string()))
    }

    /// Look up a zone configured on a camera
    pub fn zone(&self, serial: &str, zone_id: &str) -> Result<&ZoneConfig> {
        let camera = self.camera(serial)?;
        camera
            .zones
            .iter()
            .find(|z| z.id == zone_id)
            .ok_or_else(|| Error::UnknownZone {
                serial: serial.to_string(),
                zone_id: zone_id.to_string(),
            })
    }

    /// Resolve the room bound to a camera
    pub fn room_id(&self, serial: &str) -> Result<String> {
        let camera = self.camera(serial)?;
        camera
            .room_id
            .clone()
            .ok_or_else(|| Error::NotFound(format!("No room bound to camera {}", serial)))
    }
}
