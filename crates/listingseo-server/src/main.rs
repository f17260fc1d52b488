mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;
use std::time::Duration;

use listingseo_core::AnalysisStore;
use listingseo_engine::{EngineServices, JobFailure, WorkflowQueue};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};

/// How long shutdown waits for in-flight workflow runs.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);
/// How long shutdown waits for queued failure reports to be logged.
const FAILURE_LOG_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(listingseo_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::info!(env = %config.env, bind_addr = %config.bind_addr, "starting listingseo-server");

    let pool_config = listingseo_db::PoolConfig::from_app_config(&config);
    let pool = listingseo_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = listingseo_db::run_migrations(&pool).await?;
    tracing::info!(applied, "migrations up to date");

    let store: Arc<dyn AnalysisStore> = Arc::new(listingseo_db::PgStore::new(pool));
    let engine = EngineServices::from_config(&config)?;

    let (queue, supervisor, failures) = WorkflowQueue::start(
        Arc::new(engine.workflow(Arc::clone(&store))),
        config.queue_capacity,
        config.workflow_max_concurrent,
    );
    let failure_log = tokio::spawn(log_failures(failures));

    let mut scheduler =
        scheduler::build_scheduler(Arc::clone(&store), queue.clone(), &config).await?;

    let app = build_app(AppState {
        store,
        queue,
        engine,
    });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown().await?;
    drop(scheduler);

    if tokio::time::timeout(DRAIN_TIMEOUT, supervisor.join())
        .await
        .is_err()
    {
        tracing::warn!(
            timeout_secs = DRAIN_TIMEOUT.as_secs(),
            "workflow queue did not drain before shutdown"
        );
    }
    finish_failure_log(failure_log, FAILURE_LOG_GRACE).await;

    Ok(())
}

/// Log every job failure until the supervisor drops its sender. Returns how
/// many were logged.
async fn log_failures(mut failures: mpsc::UnboundedReceiver<JobFailure>) -> usize {
    let mut logged = 0;
    while let Some(failure) = failures.recv().await {
        tracing::error!(
            analysis_id = %failure.analysis_id,
            error = %failure.error,
            "analysis workflow failed"
        );
        logged += 1;
    }
    logged
}

/// Wait for the failure logger to flush the channel. The channel closes once
/// the supervisor exits; if it is still running after `grace`, give up.
async fn finish_failure_log(handle: JoinHandle<usize>, grace: Duration) -> Option<usize> {
    let abort = handle.abort_handle();
    match tokio::time::timeout(grace, handle).await {
        Ok(Ok(logged)) => Some(logged),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "failure logger task ended abnormally");
            None
        }
        Err(_) => {
            tracing::warn!(
                grace_secs = grace.as_secs(),
                "failure logger still waiting on the queue; abandoning it"
            );
            abort.abort();
            None
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
