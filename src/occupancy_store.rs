//! Occupancy State Store
//!
//! Process-wide mapping from (camera, zone) to the last-observed person
//! count. Mutated only by the zone event handler; read by the Web API.
//! Last-write-wins per key; mutation goes through a single write lock so
//! interleaved telemetry deliveries cannot lose updates.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

/// Composite store key: camera serial plus optional zone id
///
/// Raw-detection counts are keyed by camera alone (`zone_id = None`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OccupancyKey {
    pub serial: String,
    pub zone_id: Option<String>,
}

impl OccupancyKey {
    /// Key for a camera-wide raw-detections count
    pub fn camera(serial: &str) -> Self {
        Self {
            serial: serial.to_string(),
            zone_id: None,
        }
    }

    /// Key for a per-zone count
    pub fn zone(serial: &str, zone_id: &str) -> Self {
        Self {
            serial: serial.to_string(),
            zone_id: Some(zone_id.to_string()),
        }
    }
}

/// Most recent observation for one key
#[derive(Debug, Clone)]
struct Observation {
    count: u32,
    observed_at: DateTime<Utc>,
}

/// Snapshot row for the Web API occupancy listing
#[derive(Debug, Clone, Serialize)]
pub struct OccupancyEntry {
    pub serial: String,
    pub zone_id: Option<String>,
    pub count: u32,
    pub observed_at: DateTime<Utc>,
}

/// Occupancy state store
pub struct OccupancyStore {
    observations: RwLock<HashMap<OccupancyKey, Observation>>,
}

impl OccupancyStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            observations: RwLock::new(HashMap::new()),
        }
    }

    /// Current count for a key (0 when never observed)
    pub async fn get(&self, key: &OccupancyKey) -> u32 {
        self.observations
            .read()
            .await
            .get(key)
            .map(|o| o.count)
            .unwrap_or(0)
    }

    /// Store a count for a key
    pub async fn set(&self, key: OccupancyKey, count: u32) {
        self.observations.write().await.insert(
            key,
            Observation {
                count,
                observed_at: Utc::now(),
            },
        );
    }

    /// Store a count and return the previous one, atomically
    ///
    /// The read-compare-write of the zone event handler goes through this
    /// single write-lock acquisition so concurrent deliveries for the same
    /// key serialize instead of clobbering each other.
    pub async fn replace(&self, key: OccupancyKey, count: u32) -> u32 {
        let mut observations = self.observations.write().await;
        let previous = observations.get(&key).map(|o| o.count).unwrap_or(0);
        observations.insert(
            key,
            Observation {
                count,
                observed_at: Utc::now(),
            },
        );
        previous
    }

    /// Snapshot of every tracked key
    pub async fn snapshot(&self) -> Vec<OccupancyEntry> {
        let observations = self.observations.read().await;
        let mut entries: Vec<OccupancyEntry> = observations
            .iter()
            .map(|(key, obs)| OccupancyEntry {
                serial: key.serial.clone(),
                zone_id: key.zone_id.clone(),
                count: obs.count,
                observed_at: obs.observed_at,
            })
            .collect();
        entries.sort_by(|a, b| (&a.serial, &a.zone_id).cmp(&(&b.serial, &b.zone_id)));
        entries
    }
}

impl Default for OccupancyStore {
    fn default() -> Self {
        Self::new()
    }
}
