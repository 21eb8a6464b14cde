//! EntryWorkflow - Occupancy-Triggered Greeting Pipeline
//!
//! ## Responsibilities
//!
//! - Resolve network -> capture snapshot -> identify person -> resolve
//!   room/device/meeting -> dispatch greeting, strictly in order
//! - Bound every external call with a per-step timeout
//! - Abandon the invocation on the first failure (no compensation,
//!   no retry - at-most-once, best-effort)
//!
//! Invocations arrive through the bounded worker pool in [`worker`], never
//! directly from the telemetry delivery task.

pub mod capabilities;
pub mod worker;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::camera_directory::CameraDirectory;
use crate::error::{Error, Result};
use crate::notification_dispatcher::{GreetingMessage, GREETING_MESSAGE_ID};

use capabilities::{BookingDirectory, CommandChannel, PersonIdentifier, SnapshotSource};

pub use worker::{EntryTrigger, WorkflowQueue};

/// Summary of one workflow invocation
#[derive(Debug, Clone)]
pub struct WorkflowOutcome {
    /// Whether a greeting reached the device
    pub dispatched: bool,
    /// Whether the snapshot capture ran on placeholder data
    pub degraded_capture: bool,
    /// Username of the identified person, when identification matched
    pub identified: Option<String>,
}

/// Entry workflow orchestrator
pub struct EntryWorkflow {
    directory: Arc<CameraDirectory>,
    snapshots: Arc<dyn SnapshotSource>,
    identifier: Arc<dyn PersonIdentifier>,
    booking: Arc<dyn BookingDirectory>,
    channel: Arc<dyn CommandChannel>,
    step_timeout: Duration,
}

impl EntryWorkflow {
    /// Create a new workflow over its collaborators
    pub fn new(
        directory: Arc<CameraDirectory>,
        snapshots: Arc<dyn SnapshotSource>,
        identifier: Arc<dyn PersonIdentifier>,
        booking: Arc<dyn BookingDirectory>,
        channel: Arc<dyn CommandChannel>,
        step_timeout: Duration,
    ) -> Self {
        Self {
            directory,
            snapshots,
            identifier,
            booking,
            channel,
            step_timeout,
        }
    }

    /// Run the full pipeline for one camera
    pub async fn run(&self, serial: &str) -> Result<WorkflowOutcome> {
        let network = self
            .step(serial, "resolve_network", self.snapshots.camera_network(serial))
            .await?;

        let capture = self
            .step(
                serial,
                "capture_snapshot",
                self.snapshots.request_snapshot(&network.id, serial),
            )
            .await?;
        if capture.degraded {
            tracing::warn!(
                camera_serial = %serial,
                "Snapshot capture degraded, continuing with placeholder data"
            );
        }

        let person = self
            .step(serial, "identify_person", self.identifier.identify(&capture.url))
            .await?;

        let room_id = match self.directory.room_id(serial) {
            Ok(room_id) => room_id,
            Err(e) => {
                tracing::error!(
                    camera_serial = %serial,
                    step = "resolve_room",
                    error = %e,
                    "Entry workflow step failed"
                );
                return Err(e);
            }
        };

        let device = self
            .step(serial, "resolve_device", self.booking.room_device(&room_id))
            .await?;

        let meeting = self
            .step(serial, "resolve_meeting", self.booking.current_meeting(&room_id))
            .await?;

        let identified = person.map(|p| p.username);

        let Some(meeting) = meeting else {
            tracing::info!(
                camera_serial = %serial,
                room_id = %room_id,
                "No meeting scheduled, skipping greeting"
            );
            return Ok(WorkflowOutcome {
                dispatched: false,
                degraded_capture: capture.degraded,
                identified,
            });
        };

        let greeting = GreetingMessage {
            message_id: GREETING_MESSAGE_ID,
            username: identified.clone(),
        };
        let payload = serde_json::to_value(&greeting)?;

        self.step(
            serial,
            "dispatch_notification",
            self.channel.send_json(&device, &payload),
        )
        .await?;

        tracing::info!(
            camera_serial = %serial,
            room_id = %room_id,
            meeting_subject = %meeting.subject,
            username = ?identified,
            "Greeting dispatched"
        );

        Ok(WorkflowOutcome {
            dispatched: true,
            degraded_capture: capture.degraded,
            identified,
        })
    }

    /// Run one external step under the per-call timeout, logging any failure
    /// with the step name
    async fn step<T>(
        &self,
        serial: &str,
        name: &'static str,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let result = match tokio::time::timeout(self.step_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(name)),
        };

        if let Err(ref e) = result {
            tracing::error!(
                camera_serial = %serial,
                step = name,
                error = %e,
                "Entry workflow step failed"
            );
        }

        result
    }
}
