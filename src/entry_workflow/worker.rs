//! Workflow worker pool
//!
//! The telemetry delivery task enqueues triggers and returns immediately;
//! a small fixed pool of workers drains the queue and runs the workflow.
//! A full queue drops the trigger with a warning - ingestion throughput
//! wins over delivery guarantees here.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::EntryWorkflow;

/// One queued entry-workflow invocation
#[derive(Debug)]
pub struct EntryTrigger {
    pub serial: String,
    /// Correlation id carried through every log line of the invocation
    pub workflow_id: Uuid,
}

/// Handle for enqueueing workflow triggers
#[derive(Clone)]
pub struct WorkflowQueue {
    tx: mpsc::Sender<EntryTrigger>,
}

impl WorkflowQueue {
    /// Spawn the worker pool and return the enqueue handle
    pub fn start(workflow: Arc<EntryWorkflow>, workers: usize, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel::<EntryTrigger>(capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));

        for worker_id in 0..workers.max(1) {
            let rx = rx.clone();
            let workflow = workflow.clone();

            tokio::spawn(async move {
                loop {
                    let trigger = { rx.lock().await.recv().await };
                    let Some(trigger) = trigger else { break };

                    tracing::info!(
                        worker_id,
                        camera_serial = %trigger.serial,
                        workflow_id = %trigger.workflow_id,
                        "Entry workflow started"
                    );

                    match workflow.run(&trigger.serial).await {
                        Ok(outcome) => {
                            tracing::info!(
                                worker_id,
                                camera_serial = %trigger.serial,
                                workflow_id = %trigger.workflow_id,
                                dispatched = outcome.dispatched,
                                degraded_capture = outcome.degraded_capture,
                                "Entry workflow finished"
                            );
                        }
                        Err(e) => {
                            tracing::error!(
                                worker_id,
                                camera_serial = %trigger.serial,
                                workflow_id = %trigger.workflow_id,
                                error = %e,
                                "Entry workflow failed"
                            );
                        }
                    }
                }

                tracing::debug!(worker_id, "Workflow worker stopped");
            });
        }

        Self { tx }
    }

    /// Build a queue over an existing sender (tests)
    #[cfg(test)]
    pub fn from_sender(tx: mpsc::Sender<EntryTrigger>) -> Self {
        Self { tx }
    }

    /// Enqueue a trigger without blocking the caller
    pub fn trigger(&self, serial: &str) {
        let trigger = EntryTrigger {
            serial: serial.to_string(),
            workflow_id: Uuid::new_v4(),
        };

        match self.tx.try_send(trigger) {
            Ok(()) => {}
            Err(TrySendError::Full(trigger)) => {
                tracing::warn!(
                    camera_serial = %trigger.serial,
                    "Workflow queue full, dropping entry trigger"
                );
            }
            Err(TrySendError::Closed(trigger)) => {
                tracing::error!(
                    camera_serial = %trigger.serial,
                    "Workflow queue closed, dropping entry trigger"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_enqueues() {
        let (tx, mut rx) = mpsc::channel(4);
        let queue = WorkflowQueue::from_sender(tx);

        queue.trigger("Q2GV-0001");
        let trigger = rx.recv().await.unwrap();
        assert_eq!(trigger.serial, "Q2GV-0001");
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        let (tx, mut rx) = mpsc::channel(1);
        let queue = WorkflowQueue::from_sender(tx);

        queue.trigger("Q2GV-0001");
        queue.trigger("Q2GV-0002");

        let first = rx.recv().await.unwrap();
        assert_eq!(first.serial, "Q2GV-0001");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_distinct_workflow_ids() {
        let (tx, mut rx) = mpsc::channel(4);
        let queue = WorkflowQueue::from_sender(tx);

        queue.trigger("Q2GV-0001");
        queue.trigger("Q2GV-0001");

        let a = rx.recv().await.unwrap();
        let b = rx.recv().await.unwrap();
        assert_ne!(a.workflow_id, b.workflow_id);
    }
}
