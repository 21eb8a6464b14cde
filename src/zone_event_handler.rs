//! Zone Event Handler
//!
//! Interprets camera telemetry, updates the occupancy store, and decides
//! when a transition warrants the entry workflow. Only strict count
//! increases on an entry-role zone trigger anything, so a person standing
//! in the zone does not re-fire the workflow frame after frame.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;

use crate::camera_directory::{CameraDirectory, ZoneRole};
use crate::entry_workflow::WorkflowQueue;
use crate::error::Result;
use crate::occupancy_store::{OccupancyKey, OccupancyStore};

/// Object type counted for occupancy
pub const PERSON_TYPE: &str = "person";

/// Raw-detections payload: one entry per object currently in frame
#[derive(Debug, Clone, Deserialize)]
pub struct RawDetections {
    pub objects: Vec<DetectedObject>,
}

/// One detected object from the raw feed
#[derive(Debug, Clone, Deserialize)]
pub struct DetectedObject {
    #[serde(rename = "type")]
    pub object_type: String,
    #[serde(default)]
    pub oid: Option<i64>,
}

/// Zone-update payload: pre-aggregated per-type counts
#[derive(Debug, Clone, Deserialize)]
pub struct ZoneCounts {
    pub counts: HashMap<String, u32>,
}

/// Zone event handler
pub struct ZoneEventHandler {
    directory: Arc<CameraDirectory>,
    occupancy: Arc<OccupancyStore>,
    workflow: WorkflowQueue,
}

impl ZoneEventHandler {
    /// Create a new handler
    pub fn new(
        directory: Arc<CameraDirectory>,
        occupancy: Arc<OccupancyStore>,
        workflow: WorkflowQueue,
    ) -> Self {
        Self {
            directory,
            occupancy,
            workflow,
        }
    }

    /// Handle a raw-detections event for a camera
    ///
    /// Counts objects of type "person", keyed by camera alone. Log-only:
    /// the raw feed carries no zone semantics to trigger on.
    pub async fn handle_raw_detections(&self, serial: &str, payload: RawDetections) -> Result<()> {
        let current = payload
            .objects
            .iter()
            .filter(|o| o.object_type == PERSON_TYPE)
            .count() as u32;

        let previous = self
            .occupancy
            .replace(OccupancyKey::camera(serial), current)
            .await;

        if current != previous {
            tracing::debug!(
                camera_serial = %serial,
                previous,
                current,
                "Camera person count changed"
            );
        }

        Ok(())
    }

    /// Handle a zone-update event for a camera
    ///
    /// Zone resolution runs first: an unconfigured camera or zone rejects
    /// the event without touching stored state. The new count is always
    /// persisted, whichever branch is taken.
    pub async fn handle_zone_update(
        &self,
        serial: &str,
        zone_id: &str,
        payload: ZoneCounts,
    ) -> Result<()> {
        let zone = self.directory.zone(serial, zone_id)?;
        let current = payload.counts.get(PERSON_TYPE).copied().unwrap_or(0);

        let previous = self
            .occupancy
            .replace(OccupancyKey::zone(serial, zone_id), current)
            .await;

        let increased = current > previous;
        match zone.effective_role() {
            ZoneRole::Entry if increased => {
                tracing::info!(
                    camera_serial = %serial,
                    zone = %zone.name,
                    previous,
                    current,
                    "Someone entered the room"
                );
                self.workflow.trigger(serial);
            }
            ZoneRole::FarBoundary if increased => {
                tracing::info!(
                    camera_serial = %serial,
                    zone = %zone.name,
                    previous,
                    current,
                    "Someone is too far in the room"
                );
            }
            _ => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera_directory::{CameraConfig, ZoneConfig};
    use crate::entry_workflow::EntryTrigger;
    use crate::error::Error;
    use tokio::sync::mpsc;

    fn counts(person: u32) -> ZoneCounts {
        let mut map = HashMap::new();
        map.insert(PERSON_TYPE.to_string(), person);
        ZoneCounts { counts: map }
    }

    fn handler() -> (ZoneEventHandler, mpsc::Receiver<EntryTrigger>) {
        let directory = Arc::new(CameraDirectory::new(vec![CameraConfig {
            serial: "Q2GV-0001".to_string(),
            name: None,
            room_id: Some("boardroom-1".to_string()),
            zones: vec![
                ZoneConfig {
                    id: "710577".to_string(),
                    name: "Start".to_string(),
                    role: None,
                },
                ZoneConfig {
                    id: "710578".to_string(),
                    name: "Far".to_string(),
                    role: None,
                },
                ZoneConfig {
                    id: "710579".to_string(),
                    name: "Window".to_string(),
                    role: None,
                },
            ],
        }]));

        let (tx, rx) = mpsc::channel(16);
        let handler = ZoneEventHandler::new(
            directory,
            Arc::new(OccupancyStore::new()),
            WorkflowQueue::from_sender(tx),
        );
        (handler, rx)
    }

    #[tokio::test]
    async fn test_entry_increase_triggers_workflow() {
        let (handler, mut rx) = handler();

        handler
            .handle_zone_update("Q2GV-0001", "710577", counts(1))
            .await
            .unwrap();

        let trigger = rx.try_recv().unwrap();
        assert_eq!(trigger.serial, "Q2GV-0001");
    }

    #[tokio::test]
    async fn test_repeated_count_triggers_once() {
        let (handler, mut rx) = handler();

        // 0 -> 1 fires, 1 -> 1 must not
        handler
            .handle_zone_update("Q2GV-0001", "710577", counts(1))
            .await
            .unwrap();
        handler
            .handle_zone_update("Q2GV-0001", "710577", counts(1))
            .await
            .unwrap();

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_decrease_then_increase_fires_again() {
        let (handler, mut rx) = handler();

        for count in [1, 0, 1] {
            handler
                .handle_zone_update("Q2GV-0001", "710577", counts(count))
                .await
                .unwrap();
        }

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_far_zone_never_triggers() {
        let (handler, mut rx) = handler();

        handler
            .handle_zone_update("Q2GV-0001", "710578", counts(3))
            .await
            .unwrap();

        assert!(rx.try_recv().is_err());
        assert_eq!(
            handler
                .occupancy
                .get(&OccupancyKey::zone("Q2GV-0001", "710578"))
                .await,
            3
        );
    }

    #[tokio::test]
    async fn test_plain_zone_updates_state_only() {
        let (handler, mut rx) = handler();

        handler
            .handle_zone_update("Q2GV-0001", "710579", counts(2))
            .await
            .unwrap();

        assert!(rx.try_recv().is_err());
        assert_eq!(
            handler
                .occupancy
                .get(&OccupancyKey::zone("Q2GV-0001", "710579"))
                .await,
            2
        );
    }

    #[tokio::test]
    async fn test_count_always_persisted() {
        let (handler, _rx) = handler();
        let key = OccupancyKey::zone("Q2GV-0001", "710577");

        for count in [2, 5, 1] {
            handler
                .handle_zone_update("Q2GV-0001", "710577", counts(count))
                .await
                .unwrap();
            assert_eq!(handler.occupancy.get(&key).await, count);
        }
    }

    #[tokio::test]
    async fn test_unknown_zone_rejected_without_state_change() {
        let (handler, mut rx) = handler();

        let err = handler
            .handle_zone_update("Q2GV-0001", "999999", counts(1))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::UnknownZone { .. }));
        assert!(rx.try_recv().is_err());
        assert_eq!(
            handler
                .occupancy
                .get(&OccupancyKey::zone("Q2GV-0001", "999999"))
                .await,
            0
        );
    }

    #[tokio::test]
    async fn test_unknown_camera_rejected() {
        let (handler, _rx) = handler();

        let err = handler
            .handle_zone_update("Q2GV-MISSING", "710577", counts(1))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::UnknownCamera(_)));
    }

    #[tokio::test]
    async fn test_missing_person_count_reads_as_zero() {
        let (handler, mut rx) = handler();

        let payload = ZoneCounts {
            counts: HashMap::from([("vehicle".to_string(), 4)]),
        };
        handler
            .handle_zone_update("Q2GV-0001", "710577", payload)
            .await
            .unwrap();

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_raw_detections_counts_persons() {
        let (handler, _rx) = handler();

        let payload: RawDetections = serde_json::from_str(
            r#"{"objects": [{"type": "person"}, {"type": "person"}, {"type": "chair"}]}"#,
        )
        .unwrap();
        handler
            .handle_raw_detections("Q2GV-0001", payload)
            .await
            .unwrap();

        assert_eq!(
            handler
                .occupancy
                .get(&OccupancyKey::camera("Q2GV-0001"))
                .await,
            2
        );
    }
}
