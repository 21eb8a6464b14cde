//! EventIngress - Telemetry Feed Subscriber
//!
//! ## Responsibilities
//!
//! - Maintain the MQTT connection to the camera telemetry broker
//! - Subscribe to the raw-detections topic and every configured zone topic
//! - Parse topics and route payloads to the zone event handler
//!
//! Handler errors and malformed payloads are logged and dropped; the
//! delivery loop itself must keep running.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};

use crate::camera_directory::CameraDirectory;
use crate::error::{Error, Result};
use crate::zone_event_handler::ZoneEventHandler;

/// Topic prefix of the camera telemetry feed
const TOPIC_PREFIX: &str = "/merakimv/";

/// Raw-detections topic leaf
const RAW_DETECTIONS_LEAF: &str = "raw_detections";

/// Delay before re-polling after a broker error
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Parsed telemetry topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Topic {
    /// `/merakimv/{serial}/raw_detections`
    RawDetections { serial: String },
    /// `/merakimv/{serial}/{zone_id}`
    ZoneUpdate { serial: String, zone_id: String },
}

/// Parse a telemetry topic; `None` for anything outside the feed's shape
pub fn parse_topic(topic: &str) -> Option<Topic> {
    let rest = topic.strip_prefix(TOPIC_PREFIX)?;
    let (serial, leaf) = rest.split_once('/')?;
    if serial.is_empty() || leaf.is_empty() || leaf.contains('/') {
        return None;
    }

    if leaf == RAW_DETECTIONS_LEAF {
        Some(Topic::RawDetections {
            serial: serial.to_string(),
        })
    } else {
        Some(Topic::ZoneUpdate {
            serial: serial.to_string(),
            zone_id: leaf.to_string(),
        })
    }
}

/// Topic string for a camera's raw-detections feed
pub fn raw_detections_topic(serial: &str) -> String {
    format!("{}{}/{}", TOPIC_PREFIX, serial, RAW_DETECTIONS_LEAF)
}

/// Topic string for one zone of a camera
pub fn zone_topic(serial: &str, zone_id: &str) -> String {
    format!("{}{}/{}", TOPIC_PREFIX, serial, zone_id)
}

/// Decode a payload and route it to the handler
pub async fn route(handler: &ZoneEventHandler, topic: &str, payload: &[u8]) -> Result<()> {
    let Some(parsed) = parse_topic(topic) else {
        tracing::debug!(topic = %topic, "Ignoring message outside the telemetry feed");
        return Ok(());
    };

    match parsed {
        Topic::RawDetections { serial } => {
            let detections = serde_json::from_slice(payload)
                .map_err(|e| Error::Parse(format!("raw detections payload: {}", e)))?;
            handler.handle_raw_detections(&serial, detections).await
        }
        Topic::ZoneUpdate { serial, zone_id } => {
            let counts = serde_json::from_slice(payload)
                .map_err(|e| Error::Parse(format!("zone update payload: {}", e)))?;
            handler.handle_zone_update(&serial, &zone_id, counts).await
        }
    }
}

/// Telemetry feed subscriber
pub struct EventIngress {
    handler: Arc<ZoneEventHandler>,
    directory: Arc<CameraDirectory>,
    broker_host: String,
    broker_port: u16,
    client_id: String,
    connected: Arc<AtomicBool>,
}

impl EventIngress {
    /// Create a new ingress
    pub fn new(
        handler: Arc<ZoneEventHandler>,
        directory: Arc<CameraDirectory>,
        broker_host: String,
        broker_port: u16,
        client_id: String,
    ) -> Self {
        Self {
            handler,
            directory,
            broker_host,
            broker_port,
            client_id,
            connected: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Connection flag for the health endpoint
    pub fn connected_flag(&self) -> Arc<AtomicBool> {
        self.connected.clone()
    }

    /// Run the delivery loop; never returns in normal operation
    pub async fn run(self) {
        let mut options = MqttOptions::new(
            self.client_id.clone(),
            self.broker_host.clone(),
            self.broker_port,
        );
        options.set_keep_alive(Duration::from_secs(30));

        let (client, mut eventloop) = AsyncClient::new(options, 64);

        tracing::info!(
            broker_host = %self.broker_host,
            broker_port = self.broker_port,
            "Telemetry ingress starting"
        );

        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    self.connected.store(true, Ordering::Relaxed);
                    tracing::info!("Telemetry broker connected");
                    self.subscribe_all(&client).await;
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    if let Err(e) = route(&self.handler, &publish.topic, &publish.payload).await {
                        tracing::warn!(
                            topic = %publish.topic,
                            error = %e,
                            "Rejected telemetry message"
                        );
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    self.connected.store(false, Ordering::Relaxed);
                    tracing::error!(error = %e, "Telemetry broker connection error, retrying");
                    tokio::time::sleep(RECONNECT_DELAY).await;
                }
            }
        }
    }

    /// Subscribe to the raw feed and every configured zone of every camera
    async fn subscribe_all(&self, client: &AsyncClient) {
        for camera in self.directory.cameras() {
            let raw = raw_detections_topic(&camera.serial);
            if let Err(e) = client.subscribe(raw.as_str(), QoS::AtMostOnce).await {
                tracing::error!(topic = %raw, error = %e, "Subscribe failed");
            }

            for zone in &camera.zones {
                let topic = zone_topic(&camera.serial, &zone.id);
                if let Err(e) = client.subscribe(topic.as_str(), QoS::AtMostOnce).await {
                    tracing::error!(topic = %topic, error = %e, "Subscribe failed");
                }
            }

            tracing::info!(
                camera_serial = %camera.serial,
                zones = camera.zones.len(),
                "Camera telemetry subscribed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera_directory::{CameraConfig, ZoneConfig};
    use crate::entry_workflow::WorkflowQueue;
    use crate::occupancy_store::{OccupancyKey, OccupancyStore};
    use tokio::sync::mpsc;

    #[test]
    fn test_parse_raw_detections_topic() {
        assert_eq!(
            parse_topic("/merakimv/Q2GV-0001/raw_detections"),
            Some(Topic::RawDetections {
                serial: "Q2GV-0001".to_string()
            })
        );
    }

    #[test]
    fn test_parse_zone_topic() {
        assert_eq!(
            parse_topic("/merakimv/Q2GV-0001/710577"),
            Some(Topic::ZoneUpdate {
                serial: "Q2GV-0001".to_string(),
                zone_id: "710577".to_string()
            })
        );
    }

    #[test]
    fn test_parse_rejects_foreign_topics() {
        assert_eq!(parse_topic("/otherfeed/Q2GV-0001/710577"), None);
        assert_eq!(parse_topic("/merakimv/Q2GV-0001"), None);
        assert_eq!(parse_topic("/merakimv//710577"), None);
        assert_eq!(parse_topic("/merakimv/Q2GV-0001/710577/extra"), None);
    }

    #[test]
    fn test_topic_builders_round_trip() {
        let raw = raw_detections_topic("Q2GV-0001");
        assert_eq!(
            parse_topic(&raw),
            Some(Topic::RawDetections {
                serial: "Q2GV-0001".to_string()
            })
        );

        let zone = zone_topic("Q2GV-0001", "710577");
        assert_eq!(
            parse_topic(&zone),
            Some(Topic::ZoneUpdate {
                serial: "Q2GV-0001".to_string(),
                zone_id: "710577".to_string()
            })
        );
    }

    fn handler() -> ZoneEventHandler {
        let directory = Arc::new(CameraDirectory::new(vec![CameraConfig {
            serial: "Q2GV-0001".to_string(),
            name: None,
            room_id: None,
            zones: vec![ZoneConfig {
                id: "710577".to_string(),
                name: "Start".to_string(),
                role: None,
            }],
        }]));
        let (tx, _rx) = mpsc::channel(16);
        ZoneEventHandler::new(
            directory,
            Arc::new(OccupancyStore::new()),
            WorkflowQueue::from_sender(tx),
        )
    }

    #[tokio::test]
    async fn test_route_zone_update() {
        let handler = handler();
        route(
            &handler,
            "/merakimv/Q2GV-0001/710577",
            br#"{"counts": {"person": 2}}"#,
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_route_rejects_malformed_payload() {
        let handler = handler();
        let err = route(&handler, "/merakimv/Q2GV-0001/710577", b"not json")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[tokio::test]
    async fn test_route_ignores_foreign_topic() {
        let handler = handler();
        route(&handler, "/elsewhere/x", b"{}").await.unwrap();
    }

    #[tokio::test]
    async fn test_route_raw_detections_updates_store() {
        let directory = Arc::new(CameraDirectory::new(vec![CameraConfig {
            serial: "Q2GV-0001".to_string(),
            name: None,
            room_id: None,
            zones: vec![],
        }]));
        let store = Arc::new(OccupancyStore::new());
        let (tx, _rx) = mpsc::channel(16);
        let handler =
            ZoneEventHandler::new(directory, store.clone(), WorkflowQueue::from_sender(tx));

        route(
            &handler,
            "/merakimv/Q2GV-0001/raw_detections",
            br#"{"objects": [{"type": "person"}, {"type": "chair"}]}"#,
        )
        .await
        .unwrap();

        assert_eq!(store.get(&OccupancyKey::camera("Q2GV-0001")).await, 1);
    }
}
