//! Background job queue for analysis runs.
//!
//! Request handlers submit an analysis id and return immediately. A single
//! supervisor task pulls ids off a bounded channel and runs up to
//! `max_concurrent` workflows at a time in a [`JoinSet`]. Failed runs are
//! reported on an unbounded failure channel so the caller decides how to
//! surface them.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use uuid::Uuid;

use crate::error::{QueueError, WorkflowError};
use crate::workflow::{AnalysisWorkflow, WorkflowOutcome};

/// Anything that can run one analysis to completion.
#[async_trait]
pub trait AnalysisProcessor: Send + Sync + 'static {
    async fn process(&self, id: Uuid) -> Result<WorkflowOutcome, WorkflowError>;
}

#[async_trait]
impl AnalysisProcessor for AnalysisWorkflow {
    async fn process(&self, id: Uuid) -> Result<WorkflowOutcome, WorkflowError> {
        AnalysisWorkflow::process(self, id).await
    }
}

/// A workflow run that ended in an error.
#[derive(Debug)]
pub struct JobFailure {
    pub analysis_id: Uuid,
    pub error: WorkflowError,
}

/// Submission handle. Cheap to clone; the supervisor stops once every handle
/// has been dropped and in-flight runs have finished.
#[derive(Debug, Clone)]
pub struct WorkflowQueue {
    tx: mpsc::Sender<Uuid>,
}

impl WorkflowQueue {
    /// Spawn the supervisor and return the submission handle, the supervisor
    /// handle, and the receiving end of the failure channel.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn start(
        processor: Arc<dyn AnalysisProcessor>,
        capacity: usize,
        max_concurrent: usize,
    ) -> (Self, QueueSupervisor, mpsc::UnboundedReceiver<JobFailure>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let (failures_tx, failures_rx) = mpsc::unbounded_channel();

        let handle = tokio::spawn(supervise(
            processor,
            rx,
            failures_tx,
            max_concurrent.max(1),
        ));

        (Self { tx }, QueueSupervisor { handle }, failures_rx)
    }

    /// Enqueue an analysis without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Full`] when the buffer is at capacity and
    /// [`QueueError::Closed`] when the supervisor has stopped.
    pub fn submit(&self, analysis_id: Uuid) -> Result<(), QueueError> {
        self.tx.try_send(analysis_id).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => QueueError::Full,
            mpsc::error::TrySendError::Closed(_) => QueueError::Closed,
        })
    }
}

/// Handle to the supervisor task.
#[derive(Debug)]
pub struct QueueSupervisor {
    handle: JoinHandle<()>,
}

impl QueueSupervisor {
    /// Wait for the supervisor to drain. Only returns once every
    /// [`WorkflowQueue`] clone has been dropped.
    pub async fn join(self) {
        if let Err(e) = self.handle.await {
            tracing::error!(error = %e, "workflow queue supervisor panicked");
        }
    }
}

type RunResult = (Uuid, Result<WorkflowOutcome, WorkflowError>);

async fn supervise(
    processor: Arc<dyn AnalysisProcessor>,
    mut rx: mpsc::Receiver<Uuid>,
    failures: mpsc::UnboundedSender<JobFailure>,
    max_concurrent: usize,
) {
    let mut running: JoinSet<RunResult> = JoinSet::new();
    tracing::info!(max_concurrent, "workflow queue started");

    loop {
        tokio::select! {
            Some(joined) = running.join_next(), if !running.is_empty() => {
                settle(joined, &failures);
            }
            next = rx.recv(), if running.len() < max_concurrent => {
                let Some(analysis_id) = next else { break };
                let processor = Arc::clone(&processor);
                running.spawn(async move {
                    tracing::debug!(analysis_id = %analysis_id, "workflow job started");
                    (analysis_id, processor.process(analysis_id).await)
                });
            }
        }
    }

    while let Some(joined) = running.join_next().await {
        settle(joined, &failures);
    }
    tracing::info!("workflow queue drained");
}

fn settle(
    joined: Result<RunResult, tokio::task::JoinError>,
    failures: &mpsc::UnboundedSender<JobFailure>,
) {
    match joined {
        Ok((analysis_id, Ok(outcome))) => {
            tracing::debug!(analysis_id = %analysis_id, ?outcome, "workflow job finished");
        }
        Ok((analysis_id, Err(error))) => {
            // A dropped receiver only means nobody is listening for failures.
            let _ = failures.send(JobFailure { analysis_id, error });
        }
        Err(e) => {
            tracing::error!(error = %e, "workflow job panicked");
        }
    }
}

#[cfg(test)]
#[path = "queue_test.rs"]
mod tests;
