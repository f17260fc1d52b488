//! Background job scheduler.
//!
//! Registers the stale-pending sweep: analyses still `pending` long after
//! creation (for example because the process restarted before the queue
//! drained) are resubmitted to the workflow queue.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use listingseo_core::{AnalysisStore, AppConfig};
use listingseo_engine::{QueueError, WorkflowQueue};
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Upper bound on analyses resubmitted per sweep.
const SWEEP_BATCH: i64 = 100;

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the sweep job's cron expression is invalid, or the scheduler fails to start.
pub async fn build_scheduler(
    store: Arc<dyn AnalysisStore>,
    queue: WorkflowQueue,
    config: &AppConfig,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_pending_sweep_job(
        &scheduler,
        store,
        queue,
        &config.pending_sweep_cron,
        config.pending_stale_after_secs,
    )
    .await?;

    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_pending_sweep_job(
    scheduler: &JobScheduler,
    store: Arc<dyn AnalysisStore>,
    queue: WorkflowQueue,
    cron: &str,
    stale_after_secs: u64,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let store = Arc::clone(&store);
        let queue = queue.clone();

        Box::pin(async move {
            let resubmitted =
                sweep_stale_pending(store.as_ref(), &queue, Utc::now(), stale_after_secs).await;
            if resubmitted > 0 {
                tracing::info!(resubmitted, "scheduler: stale pending analyses resubmitted");
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron, stale_after_secs, "scheduler: pending sweep registered");
    Ok(())
}

/// Resubmit analyses created more than `stale_after_secs` before `now` that
/// are still `pending`. Returns the number accepted by the queue.
pub(crate) async fn sweep_stale_pending(
    store: &dyn AnalysisStore,
    queue: &WorkflowQueue,
    now: DateTime<Utc>,
    stale_after_secs: u64,
) -> usize {
    let Some(cutoff) = stale_cutoff(now, stale_after_secs) else {
        tracing::warn!(stale_after_secs, "scheduler: stale window out of range; skipping sweep");
        return 0;
    };

    let ids = match store.list_stale_pending(cutoff, SWEEP_BATCH).await {
        Ok(ids) => ids,
        Err(e) => {
            tracing::error!(error = %e, "scheduler: failed to list stale pending analyses");
            return 0;
        }
    };

    let mut resubmitted = 0;
    for id in ids {
        match queue.submit(id) {
            Ok(()) => resubmitted += 1,
            Err(QueueError::Full) => {
                tracing::warn!("scheduler: workflow queue full; remaining analyses wait for next sweep");
                break;
            }
            Err(QueueError::Closed) => {
                tracing::warn!("scheduler: workflow queue closed; sweep aborted");
                break;
            }
        }
    }
    resubmitted
}

fn stale_cutoff(now: DateTime<Utc>, stale_after_secs: u64) -> Option<DateTime<Utc>> {
    let secs = i64::try_from(stale_after_secs).ok()?;
    now.checked_sub_signed(TimeDelta::try_seconds(secs)?)
}
